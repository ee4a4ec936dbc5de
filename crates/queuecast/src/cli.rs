//! Clap derive structures for the `queuecast` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// queuecast -- queue wait-time estimates and customer alerts
#[derive(Debug, Parser)]
#[command(
    name = "queuecast",
    version,
    about = "Poll a queue backend and alert customers about their wait",
    long_about = "Polls a queue-management backend, estimates each customer's wait from\n\
        recent service times, and sends rate-limited alerts when their position\n\
        changes or their service starts.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "QUEUECAST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Backend root URL (overrides backend.base_url)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Log output format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the poll loop until interrupted
    Run,

    /// Fetch one snapshot and print per-queue statistics
    Check,

    /// Send a single message through a channel sink
    Notify(NotifyArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Recipient phone number (MSISDN)
    #[arg(long)]
    pub to: String,

    /// Message text
    #[arg(long, short = 'm')]
    pub message: String,

    /// Channel: whatsapp, ussd or websocket (defaults to scheduler.default_channel)
    #[arg(long)]
    pub channel: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Print the effective configuration (secrets masked)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
