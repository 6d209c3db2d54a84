// Stage engine: ordered, weighted stages with aggregate progress and cancellation

use crate::error::is_canceled;
use crate::session::Session;
use async_trait::async_trait;
use log::{debug, warn};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// The work a stage does. Errors fail the task; `Error::Canceled` cancels it.
#[async_trait]
pub trait StageBody: Send + Sync {
    async fn run(&self, ctx: &StageContext<'_>) -> anyhow::Result<()>;
}

/// Adapter for stage bodies that never suspend.
pub struct FnStage<F>(F);

impl<F> FnStage<F>
where
    F: Fn(&StageContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> StageBody for FnStage<F>
where
    F: Fn(&StageContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, ctx: &StageContext<'_>) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

pub struct Stage {
    label: String,
    weight: u32,
    body: Box<dyn StageBody>,
}

impl Stage {
    pub fn new(label: impl Into<String>, weight: u32, body: impl StageBody + 'static) -> Self {
        Self {
            label: label.into(),
            weight,
            body: Box::new(body),
        }
    }
}

/// What a stage body sees while it runs: the session and a progress window.
pub struct StageContext<'a> {
    pub session: &'a Session,
    label: &'a str,
    start: u8,
    end: u8,
    reported: AtomicU8,
}

impl<'a> StageContext<'a> {
    fn new(session: &'a Session, label: &'a str, start: u8, end: u8) -> Self {
        Self {
            session,
            label,
            start,
            end,
            reported: AtomicU8::new(start),
        }
    }

    /// Report progress within this stage, `0..=100`, scaled into the stage's
    /// window. Reported values never go backwards.
    pub fn report(&self, percent: u8) {
        let span = u32::from(self.end - self.start);
        let scaled = self.start + (span * u32::from(percent.min(100)) / 100) as u8;
        let previous = self.reported.fetch_max(scaled, Ordering::SeqCst);
        self.session.ui().report_progress(self.label, previous.max(scaled));
    }
}

/// Why a run ended in `Failed`.
#[derive(Debug)]
pub struct StageFailure {
    /// 1-based position of the failing stage.
    pub ordinal: usize,
    pub label: String,
    pub error: anyhow::Error,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({}) failed: {:#}", self.ordinal, self.label, self.error)
    }
}

#[derive(Debug)]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed(StageFailure),
    Canceled,
}

impl TaskStatus {
    #[cfg(test)]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, TaskStatus::Succeeded)
    }
}

/// A named sequence of stages. Each `run` starts again from the first stage.
pub struct StagedTask {
    name: String,
    stages: Vec<Stage>,
    status: TaskStatus,
}

impl StagedTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            status: TaskStatus::Pending,
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    /// Run every stage in order against `session`, reporting progress through
    /// its UI. The cancel flag is checked before each stage.
    pub async fn run(&mut self, session: &Session) -> &TaskStatus {
        self.status = TaskStatus::Running;
        let total: u32 = self.stages.iter().map(|s| s.weight).sum::<u32>().max(1);
        let boundary = |weight: u32| (weight.min(total) * 100 / total) as u8;

        let mut done = 0;
        for (index, stage) in self.stages.iter().enumerate() {
            if session.is_canceled() {
                debug!("{}: canceled before stage {}", self.name, index + 1);
                self.status = TaskStatus::Canceled;
                return &self.status;
            }

            let start = boundary(done);
            let end = boundary(done + stage.weight);
            session.ui().report_progress(&stage.label, start);
            debug!("{}: stage {} ({}) {}%..{}%", self.name, index + 1, stage.label, start, end);

            let ctx = StageContext::new(session, &stage.label, start, end);
            if let Err(error) = stage.body.run(&ctx).await {
                if is_canceled(&error) {
                    self.status = TaskStatus::Canceled;
                } else {
                    warn!("{}: stage {} ({}) failed: {:#}", self.name, index + 1, stage.label, error);
                    self.status = TaskStatus::Failed(StageFailure {
                        ordinal: index + 1,
                        label: stage.label.clone(),
                        error,
                    });
                }
                return &self.status;
            }
            done += stage.weight;
        }

        if let Some(last) = self.stages.last() {
            session.ui().report_progress(&last.label, 100);
        }
        self.status = TaskStatus::Succeeded;
        &self.status
    }
}
