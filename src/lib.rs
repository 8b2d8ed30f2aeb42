// Core functionality
pub mod core {
    pub mod config;
    pub mod error;
}

// Data storage
pub mod storage {
    pub mod cache;
}

// Indexing pipeline
pub mod indexing {
    pub mod index;
    pub mod normalizer;
    pub mod pipeline;
    pub mod source;
    pub mod splitter;
}

// Query engine
pub mod search {
    pub mod engine;
}

// User interfaces
pub mod ui {
    pub mod cli;
    pub mod tui;
}

// Re-export commonly used types
pub use core::error::{Error, Result};
pub use core::config::{Config, QueryLimits};
pub use storage::cache::{IndexCache, PersistedIndex};
pub use indexing::index::{Index, Unit};
pub use indexing::pipeline::{Origin, Pipeline, Status};
pub use indexing::splitter::SplitStrategy;
pub use search::engine::{highlight, highlight_with, search, suggest, Fragment, SearchResults};
pub use ui::cli::Cli;
pub use ui::tui::SearchTui;
