use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Metadata URL baked in at build time through `RELAUNCH_METADATA_URL`; empty when unset.
pub const DEFAULT_METADATA_URL: &str = match option_env!("RELAUNCH_METADATA_URL") {
    Some(url) => url,
    None => "",
};

/// Updater configuration, loaded from `~/.config/relaunch/config.toml` or built in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// URL of the JSON version descriptor (`AppVersion` / `UpdateLink`).
    pub metadata_url: String,
    /// Connect timeout for every request, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout for a single transfer (descriptor or payload), in seconds.
    pub timeout_secs: u64,
    /// How long the replacement script waits for this process to exit before swapping.
    pub relaunch_delay_secs: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Directory for the metadata file, the downloaded payload and the script.
    /// Defaults to the platform temp directory.
    pub temp_dir: Option<PathBuf>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            connect_timeout_secs: 15,
            timeout_secs: 300,
            relaunch_delay_secs: 2,
            user_agent: concat!("relaunch/", env!("CARGO_PKG_VERSION")).to_string(),
            temp_dir: None,
        }
    }
}

impl UpdaterConfig {
    /// Defaults with an explicit metadata URL.
    pub fn new(metadata_url: impl Into<String>) -> Self {
        Self {
            metadata_url: metadata_url.into(),
            ..Self::default()
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_relaunch_delay(mut self, secs: u64) -> Self {
        self.relaunch_delay_secs = secs;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn relaunch_delay(&self) -> Duration {
        Duration::from_secs(self.relaunch_delay_secs)
    }

    /// Effective temp directory: the configured one or the platform default.
    pub fn effective_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

pub fn config_path() -> Result<PathBuf> {
    crate::paths::config_file()
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<UpdaterConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<UpdaterConfig> {
    if !path.exists() {
        let default_cfg = UpdaterConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: UpdaterConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}
