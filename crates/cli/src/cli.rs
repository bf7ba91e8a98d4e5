//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Punch Gateway - polls attendance terminals and forwards new punches
#[derive(Parser, Debug)]
#[command(
    name = "punch-gateway",
    author,
    version,
    about = "Attendance terminal polling gateway",
    long_about = "Periodically polls the attendance terminal of every branch, keeps a \n\
                  per-branch watermark of the newest forwarded punch, and posts only \n\
                  new punches to the ingestion API."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PUNCH_GATEWAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PUNCH_GATEWAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the polling scheduler
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Query the branch directory once and list branches
    Branches(BranchesArgs),
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "PUNCH_GATEWAY_CONFIG"
    )]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Run a single fleet pass and exit
    #[arg(long, conflicts_with = "max_passes")]
    pub once: bool,

    /// Stop after this many fleet passes
    #[arg(long, env = "PUNCH_GATEWAY_MAX_PASSES")]
    pub max_passes: Option<u64>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "PUNCH_GATEWAY_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    /// Pass limit implied by `--once` / `--max-passes`
    pub fn pass_limit(&self) -> Option<u64> {
        if self.once {
            Some(1)
        } else {
            self.max_passes
        }
    }

    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Settings that may come from the environment instead of the file
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Ingestion API URL
    #[arg(long, env = "PUNCH_URL")]
    pub punch_url: Option<String>,

    /// Tenant id sent for every branch instead of the branch id
    #[arg(long, env = "TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Value of the X-API-Key header
    #[arg(long, env = "INGEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Seconds between fleet passes
    #[arg(long, env = "PUNCH_GATEWAY_INTERVAL")]
    pub interval: Option<u64>,

    /// Log batches instead of posting them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "PUNCH_GATEWAY_CONFIG"
    )]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `branches` command
#[derive(Args, Debug)]
pub struct BranchesArgs {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "PUNCH_GATEWAY_CONFIG"
    )]
    pub config: PathBuf,

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

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "punch-gateway",
            "-v",
            "run",
            "--config",
            "gw.toml",
            "--punch-url",
            "https://api.example.com/punches",
            "--interval",
            "10",
            "--once",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("gw.toml"));
        assert_eq!(
            args.overrides.punch_url.as_deref(),
            Some("https://api.example.com/punches")
        );
        assert_eq!(args.overrides.interval, Some(10));
        assert_eq!(args.pass_limit(), Some(1));
        assert_eq!(args.metrics_port(), None);
    }

    #[test]
    fn test_once_conflicts_with_max_passes() {
        let result = Cli::try_parse_from(["punch-gateway", "run", "--once", "--max-passes", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_branches_json() {
        let cli = Cli::try_parse_from(["punch-gateway", "branches", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Branches(BranchesArgs { json: true, .. })));
    }
}
