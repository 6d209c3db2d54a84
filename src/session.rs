// Session module: per-working-directory state shared by tasks and the UI

use crate::config::Config;
use crate::error::Error;
use crate::ui::{MessageLevel, Ui};
use crate::versions::{CompatibilityMapping, Namespace, VersionDescriptor, VersionStore};
use crate::workspace::Workspace;
use log::{debug, info};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Ids of the descriptors currently set up in `conf/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveVersions {
    pub game: Option<String>,
    pub mod_build: Option<String>,
}

/// Everything tied to one working directory. Replaced wholesale when the
/// working directory changes.
pub struct Session {
    config: Config,
    workspace: Workspace,
    store: VersionStore,
    mapping: CompatibilityMapping,
    ui: Arc<dyn Ui>,
    cancel: Arc<AtomicBool>,
    busy: AtomicBool,
    active: RwLock<ActiveVersions>,
}

/// Held for the length of one task run; frees the session when dropped.
pub struct RunGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl Session {
    /// Load both manifests for `config.work_dir` and pick up the active versions.
    pub async fn open(config: Config, ui: Arc<dyn Ui>) -> Self {
        let store = VersionStore::load_all(&config).await;
        Self::new(config, store, ui)
    }

    pub fn new(config: Config, store: VersionStore, ui: Arc<dyn Ui>) -> Self {
        let session = Self {
            workspace: Workspace::new(&config.work_dir),
            config,
            store,
            mapping: CompatibilityMapping::builtin().clone(),
            ui,
            cancel: Arc::new(AtomicBool::new(false)),
            busy: AtomicBool::new(false),
            active: RwLock::new(ActiveVersions::default()),
        };
        session.report_load_problems();
        session.reload_active();
        session
    }

    /// Point the session at another working directory and reload everything.
    #[allow(dead_code)]
    pub async fn change_work_dir(&mut self, dir: &Path) -> Result<(), Error> {
        if self.busy.load(Ordering::SeqCst) {
            return Err(Error::Busy(self.workspace.root().to_path_buf()));
        }
        info!("Switching working directory to {:?}", dir);
        self.config = self.config.clone().with_work_dir(dir);
        self.workspace = Workspace::new(dir);
        self.store = VersionStore::load_all(&self.config).await;
        self.cancel.store(false, Ordering::SeqCst);
        self.report_load_problems();
        self.reload_active();
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn mapping(&self) -> &CompatibilityMapping {
        &self.mapping
    }

    pub fn ui(&self) -> &dyn Ui {
        self.ui.as_ref()
    }

    /// Ask the running task to stop at its next stage boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Shared flag for signal handlers outside the session.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub(crate) fn clear_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    /// Claim the working directory for one run.
    pub fn begin_run(&self) -> Result<RunGuard<'_>, Error> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(Error::Busy(self.workspace.root().to_path_buf()));
        }
        Ok(RunGuard { busy: &self.busy })
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> ActiveVersions {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_active_game(&self, id: Option<String>) {
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .game = id;
    }

    pub fn set_active_mod(&self, id: Option<String>) {
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .mod_build = id;
    }

    /// Re-read the active descriptors from `conf/`.
    fn reload_active(&self) {
        let game = VersionDescriptor::read_persisted(&self.workspace.version_descriptor()).map(|d| d.id);
        let mod_build = VersionDescriptor::read_persisted(&self.workspace.mod_descriptor()).map(|d| d.id);
        debug!("Active versions: game={:?} mod={:?}", game, mod_build);
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = ActiveVersions { game, mod_build };
    }

    fn report_load_problems(&self) {
        if !self.config.is_default_manifest() {
            self.ui.report_message(
                MessageLevel::Warning,
                &format!(
                    "Using a non-default version manifest: {}",
                    self.config.manifest_url
                ),
            );
        }
        for namespace in Namespace::ALL {
            if let Some(failure) = self.store.failure(namespace) {
                self.ui.report_message(MessageLevel::Warning, &failure.to_string());
            }
        }
    }
}
