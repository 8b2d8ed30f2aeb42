use crate::core::config::Config;
use crate::core::error::Result;
use crate::indexing::splitter::SplitStrategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// versefind - Offline search over a single scripture text
#[derive(Parser, Debug)]
#[command(name = "versefind")]
#[command(about = "Offline full-text search over a scripture text, with word suggestions", long_about = None)]
#[command(version)]
#[command(subcommand_required = false)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub document: DocumentArgs,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct DocumentArgs {
    /// Custom base directory (default: ~/.versefind)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Path or http(s) URL of the document (default: ./bom.txt)
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Content starts at this marker; everything before it is front matter
    #[arg(long, global = true, conflicts_with = "front_lines")]
    pub marker: Option<String>,

    /// Treat the first N lines as front matter instead of using a marker
    #[arg(long, global = true)]
    pub front_lines: Option<usize>,

    /// Cache key of the persisted index; changing it forces re-ingestion
    #[arg(long, global = true)]
    pub schema_version: Option<String>,
}

impl DocumentArgs {
    /// Apply the overrides on top of the defaults
    pub fn to_config(&self) -> Result<Config> {
        let mut config = Config::new(self.base_dir.clone())?;
        if let Some(source) = &self.source {
            config = config.with_source(source.clone());
        }
        if let Some(marker) = &self.marker {
            config = config.with_split(SplitStrategy::Marker(marker.clone()));
        }
        if let Some(lines) = self.front_lines {
            config = config.with_split(SplitStrategy::LineCount(lines));
        }
        if let Some(version) = &self.schema_version {
            config = config.with_schema_version(version.clone())?;
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive search screen (default)
    Tui,
    /// Search verses for a phrase
    Search {
        /// Text to look for (case-insensitive)
        query: String,
    },
    /// List vocabulary words starting with a prefix
    Suggest {
        /// At least two characters
        prefix: String,
    },
    /// Print the front matter (legal notices) of the document
    FrontMatter,
    /// Rebuild the index from the document and rewrite the cache
    Reindex {
        /// Drop every cached index, including other schema versions
        #[arg(short, long)]
        force: bool,
    },
}
