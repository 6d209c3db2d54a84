// Tasks module: the stage engine, the runner and the concrete tasks

pub mod backup;
pub mod runner;
pub mod setup;
pub mod stage;
pub mod tool;

pub use backup::backup_task;
pub use runner::{Outcome, TaskRunner};
pub use setup::{SetupMode, setup_task};
pub use tool::tool_task;
