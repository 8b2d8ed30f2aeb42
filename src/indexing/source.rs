use crate::core::error::{Error, Result};
use std::path::Path;

/// Where the raw document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource<'a> {
    Url(&'a str),
    File(&'a Path),
}

impl<'a> DocumentSource<'a> {
    /// Interpret a configured location. Anything that is not an http(s) URL
    /// is treated as a filesystem path.
    pub fn parse(location: &'a str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DocumentSource::Url(location)
        } else {
            DocumentSource::File(Path::new(location))
        }
    }
}

/// Fetch the raw document once. Invalid UTF-8 is replaced rather than rejected.
pub async fn fetch_document(location: &str) -> Result<String> {
    match DocumentSource::parse(location) {
        DocumentSource::Url(url) => fetch_url(url).await,
        DocumentSource::File(path) => read_file(path).await,
    }
}

async fn fetch_url(url: &str) -> Result<String> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::DocumentUnavailable(format!("Failed to fetch {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::DocumentUnavailable(format!(
            "Fetching {} returned HTTP {}",
            url, status
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::DocumentUnavailable(format!("Failed to read {}: {}", url, e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn read_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        Error::DocumentUnavailable(format!("Could not read {}: {}", path.display(), e))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
