// CLI module for handling command-line interface

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "retromcp")]
#[command(about = "Set up legacy Minecraft decompilation workspaces")]
pub struct Cli {
    /// Working directory (overrides MCP_DIR)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Answer a version prompt without asking; repeat for several prompts
    #[arg(long = "choose", global = true, value_name = "ID")]
    pub choose: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List known versions, newest first
    Versions {
        /// List mod builds instead of game versions
        #[arg(long = "mod")]
        mods: bool,
    },
    /// Show which versions a mod build is compatible with
    Compat {
        mod_id: String,
        #[arg(long, value_enum, default_value_t = Target::Client)]
        target: Target,
    },
    /// Download and activate a game version
    Setup { version: String },
    /// Download and activate a mod build with a compatible client
    SetupMod {
        mod_id: String,
        #[arg(long)]
        client: Option<String>,
    },
    /// Show manifests and the active versions
    Status,
    /// Archive the current sources into backups/
    Backup,
    /// Run a decompiler command, offering a backup of existing sources first
    Decompile {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Client,
    Server,
}
