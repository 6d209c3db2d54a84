// Version store: two independent namespaces loaded from manifest sources

use super::Namespace;
use super::record::{VersionRecord, compare_by_recency};
use crate::config::Config;
use crate::constants;
use crate::download::http::Locator;
use crate::error::Error;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolved version metadata for both namespaces.
///
/// Each namespace has its own backing map, so equal ids never collide.
#[derive(Debug, Default)]
pub struct VersionStore {
    primary: HashMap<String, VersionRecord>,
    mods: HashMap<String, VersionRecord>,
    failures: HashMap<Namespace, Error>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load both namespaces from the configured sources. A failure in one
    /// namespace is recorded and does not stop the other from loading.
    pub async fn load_all(config: &Config) -> Self {
        let mut store = Self::new();
        store
            .load(Namespace::Primary, &config.manifest_url, &config.work_dir)
            .await;
        store
            .load(Namespace::Mod, &config.mod_manifest_url, &config.work_dir)
            .await;
        store
    }

    /// Populate `namespace` from the local cache if present, else from `source`.
    ///
    /// Never fails: on transport or parse errors the records already loaded stay,
    /// and the cause is kept for [`VersionStore::failure`]. Returns the number of
    /// records added.
    pub async fn load(&mut self, namespace: Namespace, source: &str, work_dir: &Path) -> usize {
        let cache = cache_path(namespace, work_dir);
        let (locator, source_name) = if cache.is_file() {
            debug!("Using local {} manifest {:?}", namespace, cache);
            (Locator::Local(cache.clone()), cache.display().to_string())
        } else {
            (Locator::parse(source, work_dir), source.to_string())
        };

        let bytes = match locator.read().await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.record_failure(namespace, &source_name, e.to_string());
                return 0;
            }
        };

        match self.load_from_slice(namespace, &bytes) {
            Ok(count) => {
                info!("Loaded {} {} version(s) from {}", count, namespace, source_name);
                self.failures.remove(&namespace);
                count
            }
            Err(e) => {
                self.record_failure(namespace, &source_name, format!("{:#}", e));
                0
            }
        }
    }

    /// Parse a manifest (a JSON array of records) into `namespace`.
    /// Entries that are not objects or lack a usable `id` are skipped.
    pub fn load_from_slice(&mut self, namespace: Namespace, bytes: &[u8]) -> anyhow::Result<usize> {
        let entries: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
        let map = self.map_mut(namespace);
        let mut count = 0;
        for entry in entries {
            if !entry.is_object() {
                continue;
            }
            match serde_json::from_value::<VersionRecord>(entry) {
                Ok(record) => {
                    map.insert(record.id.clone(), record);
                    count += 1;
                }
                Err(e) => warn!("Skipping malformed {} manifest entry: {}", namespace, e),
            }
        }
        Ok(count)
    }

    /// Insert a record directly.
    #[cfg(test)]
    pub fn insert(&mut self, namespace: Namespace, record: VersionRecord) {
        self.map_mut(namespace).insert(record.id.clone(), record);
    }

    /// Look up `id`. Unknown ids, including the empty string, yield `None`.
    pub fn get(&self, namespace: Namespace, id: &str) -> Option<&VersionRecord> {
        self.map(namespace).get(id)
    }

    pub fn len(&self, namespace: Namespace) -> usize {
        self.map(namespace).len()
    }

    #[cfg(test)]
    pub fn is_empty(&self, namespace: Namespace) -> bool {
        self.map(namespace).is_empty()
    }

    /// All records, newest first; records whose release time is missing or
    /// unparsable come before every dated record.
    pub fn list_sorted_by_recency(&self, namespace: Namespace) -> Vec<&VersionRecord> {
        let mut records: Vec<&VersionRecord> = self.map(namespace).values().collect();
        records.sort_by(|a, b| compare_by_recency(a, b));
        records
    }

    /// Ids of [`VersionStore::list_sorted_by_recency`].
    pub fn sorted_ids(&self, namespace: Namespace) -> Vec<String> {
        self.list_sorted_by_recency(namespace)
            .into_iter()
            .map(|r| r.id.clone())
            .collect()
    }

    /// Why the last load of `namespace` failed, if it did.
    pub fn failure(&self, namespace: Namespace) -> Option<&Error> {
        self.failures.get(&namespace)
    }

    fn record_failure(&mut self, namespace: Namespace, source: &str, reason: String) {
        warn!("Failed to load {} manifest from {}: {}", namespace, source, reason);
        self.failures.insert(
            namespace,
            Error::ManifestLoad {
                namespace,
                source_url: source.to_string(),
                reason,
            },
        );
    }

    fn map(&self, namespace: Namespace) -> &HashMap<String, VersionRecord> {
        match namespace {
            Namespace::Primary => &self.primary,
            Namespace::Mod => &self.mods,
        }
    }

    fn map_mut(&mut self, namespace: Namespace) -> &mut HashMap<String, VersionRecord> {
        match namespace {
            Namespace::Primary => &mut self.primary,
            Namespace::Mod => &mut self.mods,
        }
    }
}

/// Local manifest that takes precedence over the network for `namespace`.
pub fn cache_path(namespace: Namespace, work_dir: &Path) -> PathBuf {
    match namespace {
        Namespace::Primary => work_dir.join(constants::VERSIONS_CACHE_FILE),
        Namespace::Mod => work_dir
            .join(constants::MOD_VERSIONS_DIR)
            .join(constants::VERSIONS_CACHE_FILE),
    }
}
