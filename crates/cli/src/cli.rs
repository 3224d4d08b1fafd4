//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::FeedMode;
use std::path::PathBuf;

/// AIS Ingest - vessel feed ingestion pipeline
#[derive(Parser, Debug)]
#[command(
    name = "ais-ingest",
    author,
    version,
    about = "AIS vessel feed ingestion pipeline",
    long_about = "Subscribes to a real-time AIS feed (or polls a vessel list), decodes \n\
                  position reports and static ship data, and persists them to the \n\
                  configured sink. Reconnects forever on network failure."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "AIS_INGEST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "AIS_INGEST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion pipeline until interrupted
    Run(RunArgs),

    /// Validate configuration without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Configuration file plus overrides shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when absent
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "AIS_INGEST_CONFIG"
    )]
    pub config: PathBuf,

    /// Feed API key
    #[arg(long, env = "AIS_STREAM_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Only subscribe to these MMSIs (comma-separated)
    #[arg(long, env = "MMSI", value_delimiter = ',')]
    pub mmsi: Vec<String>,

    /// Override the feed mode
    #[arg(long, value_enum)]
    pub mode: Option<FeedModeArg>,

    /// Override the feed endpoint
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Supabase project URL; switches the sink to PostgREST
    #[arg(long, env = "SUPABASE_API_URL")]
    pub supabase_url: Option<String>,

    /// Supabase API key
    #[arg(long, env = "SUPABASE_API_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Metrics server port (0 = disabled)
    #[arg(
        long,
        default_value_t = observability::DEFAULT_METRICS_PORT,
        env = "AIS_INGEST_METRICS_PORT"
    )]
    pub metrics_port: u16,

    /// Validate configuration and exit without connecting
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Feed mode
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FeedModeArg {
    /// WebSocket push stream
    Stream,
    /// Periodic HTTP vessel list
    Poll,
}

impl From<FeedModeArg> for FeedMode {
    fn from(mode: FeedModeArg) -> Self {
        match mode {
            FeedModeArg::Stream => Self::Stream,
            FeedModeArg::Poll => Self::Poll,
        }
    }
}
