use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The source document could not be retrieved. This is the only error
    /// the user ever sees.
    #[error("Document unavailable: {0}")]
    DocumentUnavailable(String),

    /// The index cache could not be opened, read or written.
    #[error("Persistence unavailable: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = Error::DocumentUnavailable("HTTP 404".to_string());
        assert_eq!(err.to_string(), "Document unavailable: HTTP 404");
    }
}
