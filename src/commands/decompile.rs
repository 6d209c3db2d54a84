// Decompile command: run an external decompiler, guarding existing sources

use super::exit_code;
use crate::session::Session;
use crate::tasks::{TaskRunner, backup_task, tool_task};

pub async fn decompile(session: &Session, command: Vec<String>) -> anyhow::Result<i32> {
    let mut parts = command.into_iter();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("No decompiler command given"))?;

    let task = tool_task("Decompile", "Decompiling", program, parts.collect());
    let outcome = TaskRunner::new(session).decompile(backup_task(), task).await?;
    Ok(exit_code(outcome))
}
