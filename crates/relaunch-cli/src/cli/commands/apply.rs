//! `relaunch apply` – run the full update sequence against this executable.

use anyhow::Result;
use relaunch_core::config::UpdaterConfig;
use relaunch_core::{Updater, UpdateOutcome};
use std::process::ExitCode;

/// Only returns when nothing was applied; a successful update exits from inside
/// `check_for_update` and the new build is started by the replacement script.
pub fn run_apply(cfg: &UpdaterConfig, current_version: &str) -> Result<ExitCode> {
    println!("Checking for updates (running {})...", current_version);

    let updater = Updater::new(cfg.clone());
    match updater.check_for_update(current_version) {
        UpdateOutcome::NoUpdateAvailable => {
            println!("No update needed, {} is current.", current_version);
            Ok(ExitCode::SUCCESS)
        }
        UpdateOutcome::Failed(e) => Err(e.into()),
    }
}
