// Working-directory layout

use crate::constants;
use crate::download::http::Locator;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Paths inside a working directory. A single task run owns these subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn jars(&self) -> PathBuf {
        self.root.join(constants::JARS_DIR)
    }

    pub fn libraries(&self) -> PathBuf {
        self.root.join(constants::LIBRARIES_DIR)
    }

    pub fn natives(&self) -> PathBuf {
        self.root.join(constants::NATIVES_DIR)
    }

    pub fn conf(&self) -> PathBuf {
        self.root.join(constants::CONF_DIR)
    }

    pub fn mod_dist(&self) -> PathBuf {
        self.root.join(constants::MOD_DIST_DIR)
    }

    /// Decompiled sources; their presence means a recompile is possible.
    pub fn sources(&self) -> PathBuf {
        self.root.join(constants::SOURCES_DIR)
    }

    pub fn backups(&self) -> PathBuf {
        self.root.join(constants::BACKUPS_DIR)
    }

    pub fn has_sources(&self) -> bool {
        fs::read_dir(self.sources())
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// `jars/minecraft_<side>.jar`
    pub fn game_jar(&self, side: &str) -> PathBuf {
        self.jars().join(format!("minecraft_{}.jar", side))
    }

    /// Descriptor of the active game version.
    pub fn version_descriptor(&self) -> PathBuf {
        self.conf().join(constants::VERSION_DESCRIPTOR_FILE)
    }

    /// Descriptor of the active mod build.
    pub fn mod_descriptor(&self) -> PathBuf {
        self.conf().join(constants::MOD_DESCRIPTOR_FILE)
    }

    pub fn locator(&self, raw: &str) -> Locator {
        Locator::parse(raw, &self.root)
    }

    /// Create the directories a setup writes into.
    pub fn prepare(&self) -> std::io::Result<()> {
        for dir in [self.jars(), self.libraries(), self.natives(), self.conf()] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Remove everything a previous setup produced.
    pub fn cleanup(&self) -> std::io::Result<()> {
        for dir in [
            self.jars(),
            self.libraries(),
            self.natives(),
            self.conf(),
            self.mod_dist(),
        ] {
            if dir.exists() {
                debug!("Removing {:?}", dir);
                fs::remove_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let ws = Workspace::new("/work");
        assert_eq!(ws.game_jar("client"), PathBuf::from("/work/jars/minecraft_client.jar"));
        assert_eq!(ws.version_descriptor(), PathBuf::from("/work/conf/version.json"));
        assert_eq!(ws.mod_descriptor(), PathBuf::from("/work/conf/mod.json"));
    }

    #[test]
    fn test_has_sources_needs_a_non_empty_dir() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        assert!(!ws.has_sources());
        fs::create_dir_all(ws.sources()).unwrap();
        assert!(!ws.has_sources());
        fs::write(ws.sources().join("Main.java"), b"class Main {}").unwrap();
        assert!(ws.has_sources());
    }

    #[test]
    fn test_cleanup_keeps_manifest_cache() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        ws.prepare().unwrap();
        fs::write(ws.libraries().join("old.jar"), b"x").unwrap();
        fs::write(dir.path().join("versions.json"), b"[]").unwrap();
        fs::create_dir_all(ws.sources()).unwrap();

        ws.cleanup().unwrap();

        assert!(!ws.libraries().exists());
        assert!(!ws.conf().exists());
        assert!(dir.path().join("versions.json").exists());
        assert!(ws.sources().exists());
    }
}
