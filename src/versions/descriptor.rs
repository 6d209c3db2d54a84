// Per-version descriptor JSON and library rule evaluation

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::path::Path;

/// A version descriptor. Everything but `id` may be missing, so a file
/// holding only `{"id": ...}` still reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct VersionDescriptor {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub release_time: Option<String>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub minecraft_arguments: Option<String>,

    /// The document as read, persisted verbatim when this version becomes active.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct AssetIndexInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionDownloads {
    #[serde(default)]
    pub client: Option<DownloadArtifact>,
    #[serde(default)]
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(dead_code)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    /// OS name to classifier, e.g. `{"linux": "natives-linux"}`.
    #[serde(default)]
    pub natives: Option<std::collections::BTreeMap<String, String>>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<DownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<std::collections::BTreeMap<String, DownloadArtifact>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl VersionDescriptor {
    /// Parse a descriptor, keeping the raw document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: serde_json::Value =
            serde_json::from_slice(bytes).context("version descriptor is not valid JSON")?;
        let mut descriptor: VersionDescriptor = serde_json::from_value(raw.clone())
            .context("version descriptor does not match the expected schema")?;
        descriptor.raw = raw;
        Ok(descriptor)
    }

    /// A descriptor that carries nothing but an id.
    pub fn minimal(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            raw: serde_json::json!({ "id": id }),
            id,
            ..Default::default()
        }
    }

    /// Read a persisted descriptor, degrading to an id-only read when the
    /// fuller schema does not parse. `None` if the file is missing or has no id.
    pub fn read_persisted(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        match Self::from_slice(&bytes) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!("Reading only the id from {:?}: {:#}", path, e);
                let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
                let id = value.get("id")?.as_str()?;
                (!id.is_empty()).then(|| Self::minimal(id))
            }
        }
    }

    /// Write the raw document to `path`, creating parent directories.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = if self.raw.is_null() {
            serde_json::json!({ "id": self.id })
        } else {
            self.raw.clone()
        };
        let text = serde_json::to_string_pretty(&raw)?;
        std::fs::write(path, text).with_context(|| format!("failed to write {:?}", path))?;
        Ok(())
    }

    /// Give this descriptor `parent`'s arguments when it declares none.
    pub fn inherit_arguments(&mut self, parent: &VersionDescriptor) {
        if self.arguments.is_some() {
            return;
        }
        self.arguments = parent.arguments.clone();
        if let (Some(obj), Some(args)) = (self.raw.as_object_mut(), parent.raw.get("arguments")) {
            obj.insert("arguments".to_string(), args.clone());
        }
    }
}

impl Library {
    /// Rules are evaluated top to bottom starting from "disallowed"; each rule
    /// whose OS matches (or that names no OS) sets the state. No rules means allowed.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let Some(rules) = &self.rules else {
            return true;
        };

        let current_os = current_os_name();
        let mut allowed = false;
        for rule in rules {
            let os_matches = match rule.os.as_ref().and_then(|os| os.name.as_deref()) {
                None => true,
                Some(name) => name == current_os,
            };
            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }
        allowed
    }

    /// Native classifier for this platform, with `${arch}` substituted.
    pub fn native_classifier_for_current_os(&self) -> Option<String> {
        let classifier = self.natives.as_ref()?.get(current_os_name())?;
        let arch = if cfg!(target_pointer_width = "64") { "64" } else { "32" };
        Some(classifier.replace("${arch}", arch))
    }

    pub fn extract_excludes(&self) -> &[String] {
        self.extract.as_ref().map(|e| e.exclude.as_slice()).unwrap_or(&[])
    }
}

/// Launcher OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(rules: Option<Vec<LibraryRule>>) -> Library {
        Library {
            name: "test:lib:1.0".into(),
            downloads: None,
            rules,
            natives: None,
            extract: None,
        }
    }

    #[test]
    fn test_id_only_descriptor_parses() {
        let descriptor = VersionDescriptor::from_slice(br#"{"id":"hmod125"}"#).unwrap();
        assert_eq!(descriptor.id, "hmod125");
        assert!(descriptor.libraries.is_empty());
        assert!(descriptor.main_class.is_none());
    }

    #[test]
    fn test_full_descriptor_parses() {
        let descriptor = VersionDescriptor::from_slice(
            br#"{
                "id": "a1.2.6",
                "assetIndex": {"id": "pre-1.6", "sha1": "", "size": 0, "totalSize": 0, "url": ""},
                "downloads": {"client": {"sha1": "abc", "size": 10, "url": "https://example.com/client.jar"}},
                "libraries": [{"name": "org.lwjgl:lwjgl:2.9.0"}],
                "arguments": {"jvm": [], "game": ["--demo"]},
                "mainClass": "net.minecraft.client.Minecraft",
                "minecraftArguments": ""
            }"#,
        )
        .unwrap();
        assert_eq!(descriptor.libraries.len(), 1);
        assert_eq!(descriptor.downloads.unwrap().client.unwrap().size, 10);
        assert_eq!(descriptor.arguments.unwrap().game.len(), 1);
        assert_eq!(descriptor.raw["mainClass"], "net.minecraft.client.Minecraft");
    }

    #[test]
    fn test_read_persisted_degrades_to_id() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mod.json");
        std::fs::write(&path, r#"{"id": "hmod130", "libraries": "not a list"}"#).unwrap();

        let descriptor = VersionDescriptor::read_persisted(&path).unwrap();
        assert_eq!(descriptor.id, "hmod130");
        assert!(VersionDescriptor::read_persisted(&dir.path().join("missing.json")).is_none());
    }

    #[test]
    fn test_persist_round_trips_raw_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("conf").join("version.json");
        let descriptor =
            VersionDescriptor::from_slice(br#"{"id":"b1.7.3","customField":42}"#).unwrap();
        descriptor.persist(&path).unwrap();

        let reread: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread["customField"], 42);
    }

    #[test]
    fn test_inherit_arguments_only_when_missing() {
        let parent = VersionDescriptor::from_slice(
            br#"{"id":"a1.2.2","arguments":{"jvm":["-Xmx1G"],"game":[]}}"#,
        )
        .unwrap();
        let mut child = VersionDescriptor::from_slice(br#"{"id":"hmod125"}"#).unwrap();
        child.inherit_arguments(&parent);
        assert_eq!(child.arguments.as_ref().unwrap().jvm.len(), 1);
        assert_eq!(child.raw["arguments"]["jvm"][0], "-Xmx1G");
    }

    #[test]
    fn test_no_rules_means_allowed() {
        assert!(library(None).is_allowed_for_current_os());
    }

    #[test]
    fn test_disallow_current_os() {
        let lib = library(Some(vec![
            LibraryRule {
                action: RuleAction::Allow,
                os: None,
            },
            LibraryRule {
                action: RuleAction::Disallow,
                os: Some(OsRule {
                    name: Some(current_os_name().to_string()),
                }),
            },
        ]));
        assert!(!lib.is_allowed_for_current_os());
    }

    #[test]
    fn test_native_classifier_substitutes_arch() {
        let mut lib = library(None);
        lib.natives = Some(
            [(current_os_name().to_string(), "natives-${arch}".to_string())]
                .into_iter()
                .collect(),
        );
        let classifier = lib.native_classifier_for_current_os().unwrap();
        assert!(classifier == "natives-64" || classifier == "natives-32");
    }
}
