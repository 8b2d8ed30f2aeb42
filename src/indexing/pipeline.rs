use super::index::Index;
use super::source::fetch_document;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::storage::cache::IndexCache;
use std::fmt;
use tokio::sync::watch;

/// Progress of ingestion, shown to the user verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Downloading,
    Processing,
    Ready,
    Failed(String),
}

impl Status {
    pub fn is_ready(&self) -> bool {
        matches!(self, Status::Ready)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Status::Ready | Status::Failed(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::Downloading => write!(f, "Downloading…"),
            Status::Processing => write!(f, "Processing…"),
            Status::Ready => write!(f, "Ready to search."),
            Status::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// How the index was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Document,
}

/// Loads the index from the cache or, failing that, from the document
pub struct Pipeline {
    config: Config,
    cache: Option<IndexCache>,
    status: watch::Sender<Status>,
}

impl Pipeline {
    /// Create a pipeline. An unavailable cache is logged and ingestion
    /// proceeds without it.
    pub fn new(config: Config) -> (Self, watch::Receiver<Status>) {
        let cache = match IndexCache::open(&config) {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!("Running without index cache: {}", e);
                None
            }
        };
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: Config, cache: Option<IndexCache>) -> (Self, watch::Receiver<Status>) {
        let (status, receiver) = watch::channel(Status::Idle);
        (
            Self {
                config,
                cache,
                status,
            },
            receiver,
        )
    }

    pub fn cache(&self) -> Option<&IndexCache> {
        self.cache.as_ref()
    }

    /// Warm start from the cache when possible, otherwise ingest the document.
    ///
    /// On failure the status carries a user-facing message and the caller
    /// keeps its previous (empty) index.
    pub async fn load(&self) -> Result<(Index, Origin)> {
        if let Some(index) = self
            .cache
            .as_ref()
            .and_then(|cache| cache.load(&self.config.schema_version))
        {
            tracing::info!(
                "Loaded {} verses from cache {:?}",
                index.units().len(),
                self.config.schema_version
            );
            self.publish(Status::Ready);
            return Ok((index, Origin::Cache));
        }

        let index = self.ingest().await?;
        Ok((index, Origin::Document))
    }

    /// Ingest the document and replace the cached index, ignoring what is
    /// currently stored
    pub async fn ingest(&self) -> Result<Index> {
        match self.build_from_document().await {
            Ok(index) => {
                self.persist(&index);
                self.publish(Status::Ready);
                Ok(index)
            }
            Err(e) => {
                tracing::error!("Ingestion failed: {}", e);
                self.publish(Status::Failed(failure_message(&e, &self.config.source)));
                Err(e)
            }
        }
    }

    async fn build_from_document(&self) -> Result<Index> {
        self.publish(Status::Downloading);
        let raw = fetch_document(&self.config.source).await?;

        self.publish(Status::Processing);
        let strategy = self.config.split.clone();
        let min_unit_chars = self.config.min_unit_chars;
        let (index, stats) =
            tokio::task::spawn_blocking(move || Index::build(&raw, &strategy, min_unit_chars))
                .await
                .map_err(|e| Error::Io(std::io::Error::other(format!("Processing task failed: {}", e))))?;

        tracing::info!(
            "Indexed {} verses and {} words ({} of {} fragments dropped)",
            index.units().len(),
            index.vocabulary().len(),
            stats.dropped,
            stats.fragments
        );
        Ok(index)
    }

    /// Best-effort write; ingestion never depends on it
    fn persist(&self, index: &Index) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.save(index, &self.config.schema_version) {
            tracing::warn!("Index not cached, it will be rebuilt next time: {}", e);
        }
    }

    fn publish(&self, status: Status) {
        // No receivers is fine: nobody is watching progress.
        self.status.send_replace(status);
    }
}

fn failure_message(err: &Error, source: &str) -> String {
    match err {
        Error::DocumentUnavailable(_) => {
            format!("Error loading text. Ensure {} is present.", source)
        }
        other => format!("Error loading text: {}", other),
    }
}
