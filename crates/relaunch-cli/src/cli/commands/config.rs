//! `relaunch config` – print the config path and the effective settings.

use anyhow::Result;
use relaunch_core::config::{self, UpdaterConfig};
use std::process::ExitCode;

pub fn run_config(cfg: &UpdaterConfig) -> Result<ExitCode> {
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    if cfg.metadata_url.is_empty() {
        eprintln!("note: metadata_url is empty; pass --url or set it in the file above");
    }
    Ok(ExitCode::SUCCESS)
}
