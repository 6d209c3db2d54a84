// Backup command for archiving the current sources

use super::exit_code;
use crate::session::Session;
use crate::tasks::{TaskRunner, backup_task};

pub async fn backup(session: &Session) -> anyhow::Result<i32> {
    let mut task = backup_task();
    let outcome = TaskRunner::new(session).run(&mut task).await?;
    Ok(exit_code(outcome))
}
