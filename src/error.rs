// Error types shared by the version, download and task modules

use crate::versions::Namespace;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load {namespace} manifest from {source_url}: {reason}")]
    ManifestLoad {
        namespace: Namespace,
        source_url: String,
        reason: String,
    },

    #[error("no {namespace} version matches '{id}'")]
    UnresolvedVersion { namespace: Namespace, id: String },

    #[error("download failed for {locator}: {reason}")]
    Download { locator: String, reason: String },

    #[error("checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("failed to extract {archive:?}: {reason}")]
    Extraction { archive: PathBuf, reason: String },

    #[error("task canceled")]
    Canceled,

    #[error("another task is already running in {0:?}")]
    Busy(PathBuf),
}

impl Error {
    pub fn download(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Download {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub fn extraction(archive: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Error::Extraction {
            archive: archive.into(),
            reason: reason.to_string(),
        }
    }
}

/// True when `err` (or anything in its chain) is a cancellation.
pub fn is_canceled(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<Error>(), Some(Error::Canceled)))
}
