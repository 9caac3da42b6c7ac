//! `relaunch check` – fetch the descriptor and compare versions; no download.

use anyhow::Result;
use relaunch_core::config::UpdaterConfig;
use relaunch_core::version::{self, Decision};
use relaunch_core::Updater;
use std::process::ExitCode;

pub fn run_check(cfg: &UpdaterConfig, current_version: &str) -> Result<ExitCode> {
    let updater = Updater::new(cfg.clone());
    let descriptor = updater.fetch_descriptor()?;

    match version::decide(current_version, &descriptor.app_version) {
        Decision::UpToDate => {
            println!("{} is up to date.", current_version);
            Ok(ExitCode::SUCCESS)
        }
        Decision::UpdateAvailable => {
            println!(
                "Update available: {} -> {} ({})",
                current_version, descriptor.app_version, descriptor.update_link
            );
            // Exit code 1 signals "update available" for scripting.
            Ok(ExitCode::from(1))
        }
    }
}
