mod cli;
mod commands;
mod config;
mod constants;
mod download;
mod error;
mod session;
mod tasks;
mod ui;
mod versions;
mod workspace;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use session::Session;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tasks::SetupMode;
use ui::{ScriptedUi, TerminalUi, Ui};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            ui::error(&format!("{:#}", e));
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = Config::from_env();
    if let Some(dir) = &cli.dir {
        config = config.with_work_dir(dir);
    }

    let front_end: Arc<dyn Ui> = if cli.choose.is_empty() && ui::is_interactive() {
        Arc::new(TerminalUi::new(cli.yes))
    } else {
        let scripted = cli
            .choose
            .iter()
            .fold(ScriptedUi::batch(cli.yes), |scripted, id| scripted.with_choice(Some(id.as_str())));
        Arc::new(scripted)
    };

    let pb = ui::spinner("Loading version manifests");
    let session = Session::open(config, front_end).await;
    ui::clear_spinner(&pb);

    let cancel = session.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after the current stage");
            cancel.store(true, Ordering::SeqCst);
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });

    match cli.command {
        Commands::Versions { mods } => commands::versions::versions(&session, mods),
        Commands::Compat { mod_id, target } => commands::compat::compat(&session, &mod_id, target),
        Commands::Setup { version } => {
            commands::setup::setup(&session, SetupMode::Vanilla { version }).await
        }
        Commands::SetupMod { mod_id, client } => {
            commands::setup::setup(&session, SetupMode::ModCompat { mod_id, client }).await
        }
        Commands::Status => commands::status::status(&session),
        Commands::Backup => commands::backup::backup(&session).await,
        Commands::Decompile { command } => commands::decompile::decompile(&session, command).await,
    }
}
