// Shared HTTP client and locator utilities

use crate::constants;
use crate::error::Error;
use anyhow::Result;
use reqwest::{Client, Response, StatusCode, Url};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User-Agent string for all HTTP requests
const USER_AGENT: &str = concat!("retromcp/", env!("CARGO_PKG_VERSION"));

lazy_static::lazy_static! {
    /// Shared HTTP client with proper User-Agent and bounded connect time
    static ref CLIENT: Client = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(constants::CONNECT_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client");
}

/// Where a manifest, descriptor, or archive lives.
///
/// Values are ambiguous by shape, so URL parsing is tried first and anything
/// that does not parse is treated as a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Remote(Url),
    Local(PathBuf),
}

impl Locator {
    /// Resolve `raw`, anchoring relative paths at `base`.
    pub fn parse(raw: &str, base: &Path) -> Self {
        let raw = raw.trim();
        match Url::parse(&raw.replace(' ', "%20")) {
            // A single letter scheme is a Windows drive, not a URL.
            Ok(url) if url.scheme().len() > 1 => {
                if url.scheme() == "file" {
                    if let Ok(path) = url.to_file_path() {
                        return Locator::Local(path);
                    }
                }
                Locator::Remote(url)
            }
            _ => Locator::Local(base.join(raw)),
        }
    }

    /// Last path segment, used to name files that come without an explicit path.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Locator::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(String::from),
            Locator::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string()),
        }
    }

    /// Read the full contents, over the network or from disk.
    pub async fn read(&self) -> Result<Vec<u8>, Error> {
        match self {
            Locator::Remote(url) => fetch_bytes(url.as_str())
                .await
                .map_err(|e| Error::download(url.as_str(), format!("{:#}", e))),
            Locator::Local(path) => tokio::fs::read(path)
                .await
                .map_err(|e| Error::download(path.display().to_string(), e)),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Remote(url) => write!(f, "{}", url),
            Locator::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch raw bytes from a URL
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let response: Response = CLIENT.get(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        anyhow::bail!("Resource not found: {}", url);
    }

    if !response.status().is_success() {
        anyhow::bail!("HTTP request failed: {} ({})", url, response.status());
    }

    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_locator() {
        let locator = Locator::parse("https://example.com/libs/lwjgl 2.jar", Path::new("/work"));
        assert!(matches!(locator, Locator::Remote(_)));
        assert_eq!(locator.to_string(), "https://example.com/libs/lwjgl%202.jar");
        assert_eq!(locator.file_name().as_deref(), Some("lwjgl%202.jar"));
    }

    #[test]
    fn test_parse_relative_path_locator() {
        let locator = Locator::parse("versions/a1.2.6.json", Path::new("/work"));
        assert_eq!(
            locator,
            Locator::Local(PathBuf::from("/work/versions/a1.2.6.json"))
        );
        assert_eq!(locator.file_name().as_deref(), Some("a1.2.6.json"));
    }

    #[tokio::test]
    async fn test_read_missing_local_file_is_download_error() {
        let locator = Locator::parse("does/not/exist.json", Path::new("/nonexistent"));
        let err = locator.read().await.unwrap_err();
        assert!(matches!(err, Error::Download { .. }));
    }

    #[tokio::test]
    async fn test_read_local_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("data.txt"), b"hello").unwrap();
        let locator = Locator::parse("data.txt", dir.path());
        assert_eq!(locator.read().await.unwrap(), b"hello");
    }
}
