//! CLI for relaunch self-updates.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use relaunch_core::config::{self, UpdaterConfig};
use std::process::ExitCode;

use commands::{run_apply, run_check, run_config};

/// Top-level CLI for relaunch.
#[derive(Debug, Parser)]
#[command(name = "relaunch")]
#[command(about = "Check a version descriptor, download the new build and relaunch", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by `check` and `apply`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Version descriptor URL (overrides `metadata_url` from config.toml).
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Version string of the running build (defaults to this binary's version).
    #[arg(long, value_name = "VERSION")]
    pub current_version: Option<String>,
}

impl UpdateArgs {
    fn current_version(&self) -> &str {
        self.current_version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION"))
    }

    fn apply_to(&self, mut cfg: UpdaterConfig) -> UpdaterConfig {
        if let Some(url) = &self.url {
            cfg.metadata_url = url.clone();
        }
        cfg
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Report whether a new version is published (exit 1 when one is).
    Check {
        #[command(flatten)]
        args: UpdateArgs,
    },

    /// Download the new version, replace this executable and relaunch it.
    Apply {
        #[command(flatten)]
        args: UpdateArgs,
    },

    /// Show the config file location and effective settings.
    Config,
}

impl CliCommand {
    pub fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Check { args } => {
                run_check(&args.apply_to(cfg), args.current_version())
            }
            CliCommand::Apply { args } => {
                run_apply(&args.apply_to(cfg), args.current_version())
            }
            CliCommand::Config => run_config(&cfg),
        }
    }
}

#[cfg(test)]
mod tests;
