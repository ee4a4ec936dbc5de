//! Command dispatch: bridges CLI args -> config -> core -> output formatting.

pub mod check;
pub mod config_cmd;
pub mod notify;
pub mod run;

use std::path::PathBuf;

use queuecast_config::Config;
use queuecast_core::ServiceConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run => run::handle(global).await,
        Command::Check => check::handle(global).await,
        Command::Notify(args) => notify::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
        Command::Completions(_) => Err(CliError::Internal(
            "completions are generated before dispatch".into(),
        )),
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Config file in effect: `--config` / `QUEUECAST_CONFIG`, else the
/// platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(queuecast_config::config_path)
}

/// Load the layered config and apply CLI overrides.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = queuecast_config::load_config_from_path(&config_file(global))?;
    if let Some(ref url) = global.base_url {
        config.backend.base_url.clone_from(url);
    }
    Ok(config)
}

/// Load, validate and translate into the core runtime config.
pub fn load_service_config(global: &GlobalOpts) -> Result<ServiceConfig, CliError> {
    let config = load_config(global)?;
    Ok(queuecast_config::to_service_config(&config)?)
}
