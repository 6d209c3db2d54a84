// Setup task: resolve a version, fetch its artifacts and make it the active one

use super::stage::{Stage, StageBody, StageContext, StagedTask};
use crate::download::orchestrator::download_percent;
use crate::download::{DownloadOrchestrator, extract};
use crate::error::Error;
use crate::session::Session;
use crate::versions::compat::normalize_id;
use crate::versions::{Namespace, Scheme, VersionDescriptor, VersionRecord};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Jar names a mod distribution may ship its server jar under.
const MOD_JAR_CANDIDATES: &[&str] = &["bin/Minecraft_Mod.jar", "bin/Minecraft_mod.jar"];

/// Which environment a setup run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupMode {
    /// A plain game version.
    Vanilla { version: String },
    /// A mod build plus a client version compatible with it. `client` is
    /// used when compatible, otherwise the user picks one.
    ModCompat {
        mod_id: String,
        client: Option<String>,
    },
}

/// State handed from one setup stage to the next.
#[derive(Default)]
struct SetupState {
    client_id: Option<String>,
    descriptor: Option<VersionDescriptor>,
    mod_record: Option<VersionRecord>,
    mod_descriptor: Option<VersionDescriptor>,
}

type Shared = Arc<Mutex<SetupState>>;

pub fn setup_task(mode: SetupMode) -> StagedTask {
    let state: Shared = Arc::default();
    match mode {
        SetupMode::Vanilla { version } => StagedTask::new(format!("Setup {}", version))
            .stage(Stage::new(
                "Preparing",
                10,
                Prepare {
                    version: Some(version),
                    state: state.clone(),
                },
            ))
            .stage(Stage::new("Downloading", 85, DownloadClient { state: state.clone() }))
            .stage(Stage::new("Finalizing", 5, Finalize { state })),
        SetupMode::ModCompat { mod_id, client } => StagedTask::new(format!("Setup {}", mod_id))
            .stage(Stage::new(
                "Resolving mod build",
                5,
                ResolveMod {
                    mod_id,
                    client,
                    state: state.clone(),
                },
            ))
            .stage(Stage::new(
                "Preparing",
                5,
                Prepare {
                    version: None,
                    state: state.clone(),
                },
            ))
            .stage(Stage::new("Downloading client", 40, DownloadClient { state: state.clone() }))
            .stage(Stage::new("Downloading mod", 40, DownloadMod { state: state.clone() }))
            .stage(Stage::new("Finalizing", 10, Finalize { state })),
    }
}

/// Resolve `requested` in `namespace`, asking the user to pick again until the
/// id exists. Backing out of the prompt cancels the task.
fn resolve_id(session: &Session, namespace: Namespace, requested: &str, title: &str) -> Result<String> {
    let store = session.store();
    let mut candidate = match namespace {
        Namespace::Mod => normalize_id(Scheme::ModBuild, requested).unwrap_or_default(),
        Namespace::Primary => requested.trim().to_string(),
    };
    loop {
        if store.get(namespace, &candidate).is_some() {
            return Ok(candidate);
        }
        let options = store.sorted_ids(namespace);
        if options.is_empty() {
            return Err(Error::UnresolvedVersion {
                namespace,
                id: candidate,
            }
            .into());
        }
        let message = format!("'{}' is not a known {} version. Pick one:", candidate, namespace);
        match session.ui().choose_one(title, &message, &options) {
            Some(choice) => candidate = choice,
            None => return Err(Error::Canceled.into()),
        }
    }
}

/// Client ids a mod build runs against: the mapping first, then the ids the
/// mod record itself declares, both in primary recency order.
fn compatible_clients(session: &Session, mod_record: &VersionRecord) -> Vec<String> {
    let store = session.store();
    let mapped = session
        .mapping()
        .compatible_identifiers(store, Scheme::ModBuild, &mod_record.id, Scheme::Client);
    if !mapped.is_empty() {
        return mapped;
    }
    let declared = mod_record.game_versions.as_deref().unwrap_or_default();
    store
        .sorted_ids(Namespace::Primary)
        .into_iter()
        .filter(|id| declared.contains(id))
        .collect()
}

async fn read_descriptor(session: &Session, record: &VersionRecord, namespace: Namespace) -> Result<VersionDescriptor> {
    let url = record
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("{} version {} has no descriptor location", namespace, record.id))?;
    let bytes = session.workspace().locator(url).read().await?;
    VersionDescriptor::from_slice(&bytes).with_context(|| format!("reading descriptor for {}", record.id))
}

/// Fetch the `resources` bundle of `record` and unpack it into `dest`.
async fn extract_resources(session: &Session, record: &VersionRecord, dest: &Path) -> Result<usize> {
    let Some(resources) = record.resources.as_deref() else {
        return Ok(0);
    };
    let locator = session.workspace().locator(resources);
    let bytes = locator.read().await?;
    let count = extract::extract_bytes(bytes, Path::new(&locator.to_string()), dest, &[])?;
    info!("Extracted {} resource file(s) for {} into {:?}", count, record.id, dest);
    Ok(count)
}

fn orchestrator(session: &Session) -> DownloadOrchestrator {
    DownloadOrchestrator::new(session.workspace().clone()).with_concurrency(session.config().download_jobs)
}

struct ResolveMod {
    mod_id: String,
    client: Option<String>,
    state: Shared,
}

#[async_trait]
impl StageBody for ResolveMod {
    async fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let session = ctx.session;
        let mod_id = resolve_id(session, Namespace::Mod, &self.mod_id, "Select mod build")?;
        let record = session
            .store()
            .get(Namespace::Mod, &mod_id)
            .cloned()
            .ok_or_else(|| Error::UnresolvedVersion {
                namespace: Namespace::Mod,
                id: mod_id.clone(),
            })?;

        let compatible = compatible_clients(session, &record);
        if compatible.is_empty() {
            return Err(Error::UnresolvedVersion {
                namespace: Namespace::Primary,
                id: format!("client for {}", mod_id),
            }
            .into());
        }
        ctx.report(50);

        let requested = self.client.as_ref().filter(|c| compatible.contains(c));
        let client = match (requested, compatible.as_slice()) {
            (Some(client), _) => client.clone(),
            (None, [only]) if self.client.is_none() => only.clone(),
            _ => choose_client(session, &mod_id, &compatible)?,
        };
        info!("Using client {} for {}", client, mod_id);

        let mut state = self.state.lock().await;
        state.client_id = Some(client);
        state.mod_record = Some(record);
        Ok(())
    }
}

/// Ask for a client among `compatible` until the answer is one of them.
fn choose_client(session: &Session, mod_id: &str, compatible: &[String]) -> Result<String> {
    let mut message = format!("Client versions compatible with {}:", mod_id);
    loop {
        let choice = session
            .ui()
            .choose_one("Select client version", &message, compatible)
            .ok_or(Error::Canceled)?;
        if compatible.contains(&choice) {
            return Ok(choice);
        }
        warn!("{} is not compatible with {}", choice, mod_id);
        message = format!("'{}' is not compatible with {}. Pick one:", choice, mod_id);
    }
}

struct Prepare {
    version: Option<String>,
    state: Shared,
}

#[async_trait]
impl StageBody for Prepare {
    async fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let session = ctx.session;
        let requested = match &self.version {
            Some(version) => version.clone(),
            None => self
                .state
                .lock()
                .await
                .client_id
                .clone()
                .ok_or_else(|| anyhow!("no client version selected"))?,
        };
        let id = resolve_id(session, Namespace::Primary, &requested, "Select version")?;

        let workspace = session.workspace();
        workspace.cleanup().context("removing the previous setup")?;
        workspace.prepare().context("creating working directories")?;
        session.set_active_game(None);
        session.set_active_mod(None);
        ctx.report(20);

        let record = session
            .store()
            .get(Namespace::Primary, &id)
            .cloned()
            .ok_or_else(|| Error::UnresolvedVersion {
                namespace: Namespace::Primary,
                id: id.clone(),
            })?;
        let descriptor = read_descriptor(session, &record, Namespace::Primary).await?;
        ctx.report(60);

        extract_resources(session, &record, &workspace.conf()).await?;
        ctx.report(100);

        let mut state = self.state.lock().await;
        state.client_id = Some(id);
        state.descriptor = Some(descriptor);
        Ok(())
    }
}

struct DownloadClient {
    state: Shared,
}

#[async_trait]
impl StageBody for DownloadClient {
    async fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let descriptor = self
            .state
            .lock()
            .await
            .descriptor
            .clone()
            .ok_or_else(|| anyhow!("no version descriptor prepared"))?;

        let orchestrator = orchestrator(ctx.session);
        let mut cumulative = 0;
        let jobs = orchestrator
            .perform_download(&descriptor, true, |job, total| {
                cumulative += job.downloaded_bytes;
                ctx.report(download_percent(cumulative, total));
            })
            .await?;

        let extracted = orchestrator.extract_natives(&jobs)?;
        info!("Downloaded {} artifact(s), extracted {} native file(s)", jobs.len(), extracted);
        ctx.report(100);
        Ok(())
    }
}

struct DownloadMod {
    state: Shared,
}

impl DownloadMod {
    /// Copy the distribution's server jar to `jars/minecraft_mod.jar`.
    fn install_mod_jar(session: &Session) -> Result<()> {
        let workspace = session.workspace();
        let dist = workspace.mod_dist();
        let jar = MOD_JAR_CANDIDATES
            .iter()
            .map(|c| dist.join(c))
            .find(|p| p.is_file())
            .ok_or_else(|| Error::extraction(dist.clone(), "distribution has no bin/Minecraft_Mod.jar"))?;
        let target = workspace.game_jar("mod");
        std::fs::copy(&jar, &target).with_context(|| format!("copying {:?} to {:?}", jar, target))?;
        Ok(())
    }
}

#[async_trait]
impl StageBody for DownloadMod {
    async fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let session = ctx.session;
        let record = self
            .state
            .lock()
            .await
            .mod_record
            .clone()
            .ok_or_else(|| anyhow!("no mod build resolved"))?;

        let descriptor = read_descriptor(session, &record, Namespace::Mod).await?;
        ctx.report(10);

        let mut cumulative = 0;
        orchestrator(session)
            .perform_download(&descriptor, false, |job, total| {
                cumulative += job.downloaded_bytes;
                let percent = u32::from(download_percent(cumulative, total));
                ctx.report(10 + (percent * 70 / 97) as u8);
            })
            .await?;
        ctx.report(80);

        if record.resources.is_none() {
            bail!("mod build {} has no distribution archive", record.id);
        }
        extract_resources(session, &record, &session.workspace().mod_dist()).await?;
        Self::install_mod_jar(session)?;
        ctx.report(100);

        self.state.lock().await.mod_descriptor = Some(descriptor);
        Ok(())
    }
}

struct Finalize {
    state: Shared,
}

#[async_trait]
impl StageBody for Finalize {
    async fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let session = ctx.session;
        let workspace = session.workspace();
        let mut state = self.state.lock().await;
        let descriptor = state
            .descriptor
            .take()
            .ok_or_else(|| anyhow!("no version descriptor prepared"))?;

        descriptor.persist(&workspace.version_descriptor())?;
        session.set_active_game(Some(descriptor.id.clone()));

        if let Some(mut mod_descriptor) = state.mod_descriptor.take() {
            mod_descriptor.inherit_arguments(&descriptor);
            mod_descriptor.persist(&workspace.mod_descriptor())?;
            session.set_active_mod(Some(mod_descriptor.id.clone()));
        }
        info!("Active version is now {}", descriptor.id);
        Ok(())
    }
}
