// Setup command for running a setup task to completion

use super::exit_code;
use crate::session::Session;
use crate::tasks::{SetupMode, TaskRunner, setup_task};

pub async fn setup(session: &Session, mode: SetupMode) -> anyhow::Result<i32> {
    let mut task = setup_task(mode);
    let outcome = TaskRunner::new(session).run(&mut task).await?;
    Ok(exit_code(outcome))
}
