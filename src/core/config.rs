use super::error::{Error, Result};
use crate::indexing::splitter::SplitStrategy;
use std::path::PathBuf;

/// Where the document is read from when no source is given
pub const DEFAULT_SOURCE: &str = "./bom.txt";

/// Cache key of the persisted index. Bumping it forces every client to re-ingest.
pub const DEFAULT_SCHEMA_VERSION: &str = "bom_data_v5";

/// Fragments at or below this many characters never become units
pub const DEFAULT_MIN_UNIT_CHARS: usize = 20;

/// Caps applied by the query engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Shortest prefix that produces suggestions
    pub min_prefix_chars: usize,
    /// Maximum number of suggestions returned
    pub max_suggestions: usize,
    /// Maximum number of units returned by a search
    pub max_results: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            min_prefix_chars: 2,
            max_suggestions: 15,
            max_results: 50,
        }
    }
}

/// Configuration for versefind
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for versefind data
    pub base_dir: PathBuf,
    /// Path to the index cache database
    pub cache_path: PathBuf,
    /// Path or http(s) URL of the source document
    pub source: String,
    /// Key the persisted index is stored under
    pub schema_version: String,
    /// How front matter is separated from content
    pub split: SplitStrategy,
    /// Minimum cleaned length a fragment must exceed to become a unit
    pub min_unit_chars: usize,
    pub limits: QueryLimits,
}

impl Config {
    /// Get the default configuration directory
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
            .map(|home| home.join(".versefind"))
    }

    /// Create a new configuration
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.unwrap_or_else(|| {
            Self::default_base_dir().unwrap_or_else(|_| PathBuf::from(".versefind"))
        });

        Ok(Self {
            cache_path: base_dir.join("cache").join("index.redb"),
            base_dir,
            source: DEFAULT_SOURCE.to_string(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            split: SplitStrategy::default(),
            min_unit_chars: DEFAULT_MIN_UNIT_CHARS,
            limits: QueryLimits::default(),
        })
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_split(mut self, split: SplitStrategy) -> Self {
        self.split = split;
        self
    }

    pub fn with_schema_version(mut self, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(Error::Config("Schema version must not be empty".to_string()));
        }
        self.schema_version = version;
        Ok(self)
    }

    /// Initialize the configuration directories
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Check if the configuration is already initialized
    pub fn is_initialized(&self) -> bool {
        self.base_dir.exists() && self.cache_path.parent().map_or(false, |p| p.exists())
    }
}
