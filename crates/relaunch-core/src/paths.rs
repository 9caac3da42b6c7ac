//! Per-user locations for the config file and the log file.
//!
//! XDG base directories on Unix, the platform profile folders elsewhere.

use anyhow::Result;
use std::path::PathBuf;

const APP_DIR: &str = "relaunch";

/// Path of `config.toml`; the parent directory is created if missing.
#[cfg(unix)]
pub fn config_file() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_DIR)?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Path of the log file under the state directory; the parent directory is created if missing.
#[cfg(unix)]
pub fn log_file() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_DIR)?;
    Ok(xdg_dirs.place_state_file("relaunch.log")?)
}

#[cfg(not(unix))]
pub fn config_file() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("no config directory"))?;
    let dir = base.join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("config.toml"))
}

#[cfg(not(unix))]
pub fn log_file() -> Result<PathBuf> {
    let base =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("no local data directory"))?;
    let dir = base.join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("relaunch.log"))
}
