// Commands module: one function per CLI subcommand, each returning an exit code

pub mod backup;
pub mod compat;
pub mod decompile;
pub mod setup;
pub mod status;
pub mod versions;

use crate::tasks::Outcome;

/// 0 on success; failures and cancellations both exit with 1.
pub fn exit_code(outcome: Outcome) -> i32 {
    if outcome.is_success() { 0 } else { 1 }
}
