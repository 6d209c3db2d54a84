// Artifact download orchestration for a resolved version

use super::extract::{self, NATIVE_EXCLUDES};
use super::hash;
use super::http::Locator;
use crate::error::Error;
use crate::versions::VersionDescriptor;
use crate::versions::descriptor::DownloadArtifact;
use crate::workspace::Workspace;
use futures::stream::{self, StreamExt};
use log::{debug, info};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Library,
    /// Platform-native archive, extracted into the natives directory afterwards.
    Native,
    GameJar,
}

/// One artifact to fetch. Everything but `downloaded_bytes` is fixed when the job is created.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub name: String,
    pub source: Locator,
    /// Declared size, used for the progress total.
    pub size: u64,
    pub checksum: Option<String>,
    pub target: PathBuf,
    pub kind: ArtifactKind,
    /// Entry prefixes skipped when extracting a native archive.
    pub excludes: Vec<String>,
    pub downloaded_bytes: u64,
}

/// Fetches the artifacts a version needs into a workspace.
pub struct DownloadOrchestrator {
    workspace: Workspace,
    concurrency: usize,
}

impl DownloadOrchestrator {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            concurrency: crate::constants::DEFAULT_DOWNLOAD_JOBS,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Jobs for `descriptor`: the game jars, every library allowed on this OS,
    /// and, if `include_natives`, the native classifier archives.
    pub fn resolve_jobs(&self, descriptor: &VersionDescriptor, include_natives: bool) -> Vec<DownloadJob> {
        let mut jobs = Vec::new();
        let libraries = self.workspace.libraries();

        if let Some(downloads) = &descriptor.downloads {
            for (side, artifact) in [("client", &downloads.client), ("server", &downloads.server)] {
                if let Some(artifact) = artifact {
                    jobs.push(self.job(
                        format!("{} {}", descriptor.id, side),
                        artifact,
                        self.workspace.game_jar(side),
                        ArtifactKind::GameJar,
                    ));
                }
            }
        }

        for lib in &descriptor.libraries {
            if !lib.is_allowed_for_current_os() {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }
            let Some(downloads) = &lib.downloads else {
                continue;
            };

            if let Some(artifact) = &downloads.artifact {
                let target = self.library_target(&libraries, artifact, &lib.name);
                jobs.push(self.job(lib.name.clone(), artifact, target, ArtifactKind::Library));
            }

            if !include_natives {
                continue;
            }
            let native = lib
                .native_classifier_for_current_os()
                .and_then(|classifier| downloads.classifiers.as_ref()?.get(&classifier).cloned());
            if let Some(artifact) = native {
                let target = self.library_target(&libraries, &artifact, &lib.name);
                let mut job = self.job(lib.name.clone(), &artifact, target, ArtifactKind::Native);
                job.excludes = NATIVE_EXCLUDES
                    .iter()
                    .map(|s| s.to_string())
                    .chain(lib.extract_excludes().iter().cloned())
                    .collect();
                jobs.push(job);
            }
        }

        jobs
    }

    /// Resolve and fetch everything `descriptor` needs. `on_progress(job, total)`
    /// runs once per finished job, in completion order, with `total` the sum of
    /// declared sizes. Fails on the first transport or checksum error; files
    /// written by earlier jobs stay.
    pub async fn perform_download<F>(
        &self,
        descriptor: &VersionDescriptor,
        include_natives: bool,
        on_progress: F,
    ) -> Result<Vec<DownloadJob>, Error>
    where
        F: FnMut(&DownloadJob, u64),
    {
        let jobs = self.resolve_jobs(descriptor, include_natives);
        self.run_jobs(jobs, on_progress).await
    }

    pub async fn run_jobs<F>(&self, jobs: Vec<DownloadJob>, mut on_progress: F) -> Result<Vec<DownloadJob>, Error>
    where
        F: FnMut(&DownloadJob, u64),
    {
        let total_size: u64 = jobs.iter().map(|j| j.size).sum();
        info!(
            "Downloading {} artifact(s), {} bytes, concurrency={}",
            jobs.len(),
            total_size,
            self.concurrency
        );

        let mut pending = stream::iter(jobs.into_iter().map(fetch)).buffer_unordered(self.concurrency);

        // Completions are reported from this single loop so the running total only grows.
        let mut finished = Vec::new();
        while let Some(result) = pending.next().await {
            let job = result?;
            on_progress(&job, total_size);
            finished.push(job);
        }
        Ok(finished)
    }

    /// Extract every native archive among `jobs` into the natives directory.
    pub fn extract_natives(&self, jobs: &[DownloadJob]) -> Result<usize, Error> {
        let natives = self.workspace.natives();
        let mut count = 0;
        for job in jobs.iter().filter(|j| j.kind == ArtifactKind::Native) {
            count += extract::extract_file(&job.target, &natives, &job.excludes)?;
        }
        Ok(count)
    }

    fn job(&self, name: String, artifact: &DownloadArtifact, target: PathBuf, kind: ArtifactKind) -> DownloadJob {
        DownloadJob {
            name,
            source: self.workspace.locator(&artifact.url),
            size: artifact.size,
            checksum: artifact.sha1.clone().filter(|s| !s.trim().is_empty()),
            target,
            kind,
            excludes: Vec::new(),
            downloaded_bytes: 0,
        }
    }

    fn library_target(&self, libraries: &Path, artifact: &DownloadArtifact, name: &str) -> PathBuf {
        match &artifact.path {
            Some(path) => libraries.join(path),
            None => {
                let file_name = self
                    .workspace
                    .locator(&artifact.url)
                    .file_name()
                    .unwrap_or_else(|| format!("{}.jar", name.replace(':', "-")));
                libraries.join(file_name)
            }
        }
    }
}

/// Fetch one job, skipping the transfer when the target already holds the expected content.
async fn fetch(mut job: DownloadJob) -> Result<DownloadJob, Error> {
    if let Some(expected) = &job.checksum {
        if let Ok(existing) = tokio::fs::read(&job.target).await {
            if hash::verify(&job.name, &existing, expected).is_ok() {
                debug!("Already present: {:?}", job.target);
                job.downloaded_bytes = existing.len() as u64;
                return Ok(job);
            }
        }
    }

    let data = job.source.read().await?;
    if let Some(expected) = &job.checksum {
        hash::verify(&job.name, &data, expected)?;
    }

    if let Some(parent) = job.target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::download(job.source.to_string(), e))?;
    }
    tokio::fs::write(&job.target, &data)
        .await
        .map_err(|e| Error::download(job.source.to_string(), e))?;

    debug!("Downloaded: {} -> {:?}", job.source, job.target);
    job.downloaded_bytes = data.len() as u64;
    Ok(job)
}

/// Share of the download window covered so far: `floor(cumulative / total * 97)`.
pub fn download_percent(cumulative: u64, total: u64) -> u8 {
    let window = crate::constants::DOWNLOAD_PERCENT_WINDOW;
    if total == 0 {
        return window as u8;
    }
    (cumulative.min(total) * window / total) as u8
}
