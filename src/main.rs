use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use versefind::ui::cli::{Cli, Commands};
use versefind::{highlight_with, search, suggest, Config, Index, Pipeline, SearchTui};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.document.to_config()?;

    let command = cli.command.unwrap_or(Commands::Tui);
    if !matches!(command, Commands::Tui) {
        init_logging();
    }

    match command {
        Commands::Tui => handle_tui(config).await,
        Commands::Search { query } => handle_search(config, &query).await,
        Commands::Suggest { prefix } => handle_suggest(config, &prefix).await,
        Commands::FrontMatter => handle_front_matter(config).await,
        Commands::Reindex { force } => handle_reindex(config, force).await,
    }
}

/// Log to stderr, `warn` unless RUST_LOG says otherwise. The TUI skips this
/// so nothing is written over the alternate screen.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_index(config: Config) -> anyhow::Result<Index> {
    let (pipeline, _status) = Pipeline::new(config);
    let (index, _origin) = pipeline.load().await.context("Error loading text")?;
    Ok(index)
}

async fn handle_tui(config: Config) -> anyhow::Result<()> {
    let (pipeline, status) = Pipeline::new(config.clone());
    let (tx, rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let result = pipeline.load().await.map(|(index, _origin)| index);
        let _ = tx.send(result);
    });

    let mut tui = SearchTui::new(config);
    tokio::task::spawn_blocking(move || tui.run(status, rx))
        .await
        .context("TUI task panicked")??;
    Ok(())
}

async fn handle_search(config: Config, query: &str) -> anyhow::Result<()> {
    let limits = config.limits;
    let index = load_index(config).await?;

    let Some(results) = search(&index, query, &limits) else {
        println!("Enter a word or phrase to search for.");
        return Ok(());
    };

    for unit in &results.units {
        println!("{}", unit.reference);
        println!("  {}\n", highlight_with(&unit.text, query, "**", "**"));
    }
    println!("{}", results.summary());
    Ok(())
}

async fn handle_suggest(config: Config, prefix: &str) -> anyhow::Result<()> {
    let limits = config.limits;
    let index = load_index(config).await?;

    for word in suggest(&index, prefix, &limits) {
        println!("{}", word);
    }
    Ok(())
}

async fn handle_front_matter(config: Config) -> anyhow::Result<()> {
    let index = load_index(config).await?;
    println!("{}", index.front_matter());
    Ok(())
}

async fn handle_reindex(config: Config, force: bool) -> anyhow::Result<()> {
    println!("Reindexing from: {}", config.source);

    let (pipeline, _status) = Pipeline::new(config);
    if force {
        match pipeline.cache() {
            Some(cache) => cache.clear().context("Failed to clear index cache")?,
            None => println!("  ⚠ Index cache unavailable; nothing to clear"),
        }
    }

    let index = pipeline.ingest().await.context("Error loading text")?;
    println!("✓ {} verses", index.units().len());
    println!("✓ {} suggestion words", index.vocabulary().len());
    if pipeline.cache().is_none() {
        println!("  ⚠ Index cache unavailable; it will be rebuilt next time");
    }
    Ok(())
}
