// Task runner: drives staged tasks against a session and reports outcomes

use super::stage::{StagedTask, TaskStatus};
use crate::error::Error;
use crate::session::Session;
use crate::ui::MessageLevel;
use log::info;

/// How a runner invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    /// Canceled by the user, including declining a confirmation.
    Canceled,
}

impl Outcome {
    fn of(status: &TaskStatus) -> Self {
        match status {
            TaskStatus::Succeeded => Outcome::Succeeded,
            TaskStatus::Canceled => Outcome::Canceled,
            _ => Outcome::Failed,
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Succeeded
    }
}

pub struct TaskRunner<'a> {
    session: &'a Session,
}

impl<'a> TaskRunner<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Run one task. Refused with `Error::Busy` while another run holds the session.
    pub async fn run(&self, task: &mut StagedTask) -> Result<Outcome, Error> {
        self.run_all(std::slice::from_mut(task)).await
    }

    /// Run tasks in order, stopping at the first one that does not succeed.
    pub async fn run_all(&self, tasks: &mut [StagedTask]) -> Result<Outcome, Error> {
        let _guard = self.session.begin_run()?;
        self.session.clear_cancel();

        for task in tasks.iter_mut() {
            let outcome = self.execute(task).await;
            if !outcome.is_success() {
                return Ok(outcome);
            }
        }
        Ok(Outcome::Succeeded)
    }

    /// Decompile, guarding existing sources: when they exist the user confirms
    /// first and may have them backed up. A failed backup stops the flow.
    pub async fn decompile(&self, backup: StagedTask, decompile: StagedTask) -> Result<Outcome, Error> {
        let ui = self.session.ui();
        let mut tasks = Vec::with_capacity(2);

        if self.session.workspace().has_sources() {
            if !ui.confirm(
                "Confirm action",
                "Decompiling again will overwrite the existing sources. Continue?",
            ) {
                info!("Decompile declined");
                return Ok(Outcome::Canceled);
            }
            if ui.confirm("Confirm action", "Back up the existing sources first?") {
                tasks.push(backup);
            }
        }
        tasks.push(decompile);
        self.run_all(&mut tasks).await
    }

    async fn execute(&self, task: &mut StagedTask) -> Outcome {
        let ui = self.session.ui();
        info!("Starting {}", task.name());
        task.run(self.session).await;

        let name = task.name();
        match task.status() {
            TaskStatus::Succeeded => {
                ui.report_message(MessageLevel::Info, &format!("{} finished", name));
            }
            TaskStatus::Canceled => {
                ui.report_message(MessageLevel::Warning, &format!("{} canceled", name));
            }
            TaskStatus::Failed(failure) => {
                ui.report_message(MessageLevel::Error, &format!("{}: {}", name, failure));
            }
            TaskStatus::Pending | TaskStatus::Running => {}
        }
        Outcome::of(task.status())
    }
}
