// Config module for environment-driven settings

use crate::constants;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: PathBuf,
    pub manifest_url: String,
    pub mod_manifest_url: String,
    pub download_jobs: usize,
}

impl Config {
    /// Read settings from `MCP_DIR`, `MCP_VERSIONS_URL`, `MCP_MOD_VERSIONS_URL`
    /// and `MCP_DOWNLOAD_JOBS`, falling back to the documented defaults.
    pub fn from_env() -> Self {
        let download_jobs = std::env::var("MCP_DOWNLOAD_JOBS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(constants::DEFAULT_DOWNLOAD_JOBS);

        Self {
            work_dir: PathBuf::from(work_dir()),
            manifest_url: std::env::var("MCP_VERSIONS_URL")
                .unwrap_or_else(|_| constants::DEFAULT_MANIFEST_URL.to_string()),
            mod_manifest_url: std::env::var("MCP_MOD_VERSIONS_URL")
                .unwrap_or_else(|_| constants::DEFAULT_MOD_MANIFEST_URL.to_string()),
            download_jobs,
        }
    }

    /// Defaults rooted at `dir`, ignoring the environment.
    #[cfg(test)]
    pub fn for_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            work_dir: dir.as_ref().to_path_buf(),
            manifest_url: constants::DEFAULT_MANIFEST_URL.to_string(),
            mod_manifest_url: constants::DEFAULT_MOD_MANIFEST_URL.to_string(),
            download_jobs: constants::DEFAULT_DOWNLOAD_JOBS,
        }
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn is_default_manifest(&self) -> bool {
        self.manifest_url == constants::DEFAULT_MANIFEST_URL
    }
}

pub fn work_dir() -> String {
    std::env::var("MCP_DIR").unwrap_or_else(|_| ".".to_string())
}
