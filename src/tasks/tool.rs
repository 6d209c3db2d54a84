// External tool task: a stage whose body is a command run in the working directory

use super::stage::{Stage, StageBody, StageContext, StagedTask};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

/// A task that runs `program args..` as its single stage. Decompilers,
/// recompilers and obfuscators plug in this way.
pub fn tool_task(name: &str, label: &str, program: String, args: Vec<String>) -> StagedTask {
    StagedTask::new(name).stage(Stage::new(label, 1, ExternalTool { program, args }))
}

struct ExternalTool {
    program: String,
    args: Vec<String>,
}

#[async_trait]
impl StageBody for ExternalTool {
    async fn run(&self, ctx: &StageContext<'_>) -> Result<()> {
        let dir = ctx.session.workspace().root();
        debug!("Running {} {:?} in {:?}", self.program, self.args, dir);
        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(dir)
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("failed to start {}", self.program))?;

        anyhow::ensure!(status.success(), "{} exited with {}", self.program, status);
        info!("{} finished", self.program);
        ctx.report(100);
        Ok(())
    }
}
