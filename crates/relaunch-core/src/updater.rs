//! The update sequence: fetch descriptor, decide, download, swap and relaunch.
//!
//! `check_for_update` runs all four steps. The staged API (`fetch_descriptor`,
//! `download`, `stage`, `StagedUpdate::apply`) exposes them one by one for
//! callers that want to report progress or stop before the swap.

use crate::artifact::UpdateArtifact;
use crate::config::UpdaterConfig;
use crate::descriptor::VersionDescriptor;
use crate::error::{UpdateError, UpdateOutcome};
use crate::script::{ReplacementScript, ScriptError};
use crate::transfer::{self, TransferError, TransferOptions};
use crate::version::{self, Decision};
use std::convert::Infallible;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const METADATA_PREFIX: &str = "relaunch-version-";

/// Self-updater for the running executable. Each check is independent; no
/// state carries over between calls.
#[derive(Debug, Clone)]
pub struct Updater {
    config: UpdaterConfig,
    transfer: TransferOptions,
}

impl Updater {
    pub fn new(config: UpdaterConfig) -> Self {
        let transfer = TransferOptions::from(&config);
        Self { config, transfer }
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    fn temp_dir(&self) -> PathBuf {
        self.config.effective_temp_dir()
    }

    /// Downloads the descriptor to a temp file, parses it and removes the file.
    pub fn fetch_descriptor(&self) -> Result<VersionDescriptor, UpdateError> {
        let url = &self.config.metadata_url;
        let fetch_err = |source: TransferError| UpdateError::Fetch {
            url: url.clone(),
            source,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(METADATA_PREFIX)
            .suffix(".json")
            .tempfile_in(self.temp_dir())
            .map_err(|e| fetch_err(TransferError::Storage(e)))?;

        let fetched =
            transfer::fetch_to_file(url, tmp.as_file_mut(), &self.transfer).map_err(fetch_err)?;
        tracing::debug!(bytes = fetched.bytes, path = %tmp.path().display(), "version descriptor fetched");

        tmp.as_file_mut()
            .seek(SeekFrom::Start(0))
            .map_err(|e| fetch_err(TransferError::Storage(e)))?;
        let descriptor = VersionDescriptor::from_reader(BufReader::new(tmp.as_file()))?;
        // `tmp` drops here, deleting the metadata file.
        Ok(descriptor)
    }

    /// Downloads the payload named by `descriptor` into the temp directory.
    pub fn download(&self, descriptor: &VersionDescriptor) -> Result<UpdateArtifact, UpdateError> {
        UpdateArtifact::download(&descriptor.update_link, &self.temp_dir(), &self.transfer).map_err(
            |source| UpdateError::Download {
                url: descriptor.update_link.clone(),
                source,
            },
        )
    }

    /// Runs every step except the launch. `Ok(None)` means the running
    /// version is current; nothing was downloaded.
    pub fn stage(&self, current_version: &str) -> Result<Option<StagedUpdate>, UpdateError> {
        let descriptor = self.fetch_descriptor()?;
        tracing::info!("current version: {}", current_version);
        tracing::info!("remote version: {}", descriptor.app_version);

        if version::decide(current_version, &descriptor.app_version) == Decision::UpToDate {
            tracing::info!("application is up to date");
            return Ok(None);
        }

        tracing::info!("update available, downloading {}", descriptor.update_link);
        let artifact = self.download(&descriptor)?;
        tracing::info!(
            bytes = artifact.size(),
            "update downloaded, preparing replacement"
        );

        let target = std::env::current_exe().map_err(ScriptError::CurrentExe)?;
        let script = ReplacementScript::create(
            &self.temp_dir(),
            artifact.path(),
            &target,
            self.config.relaunch_delay(),
        )?;

        Ok(Some(StagedUpdate {
            remote_version: descriptor.app_version,
            artifact,
            script,
        }))
    }

    /// Full sequence. Returns only when no update was applied; a successful
    /// swap exits the process from inside this call.
    pub fn check_for_update(&self, current_version: &str) -> UpdateOutcome {
        tracing::info!("checking for updates");

        let staged = match self.stage(current_version) {
            Ok(Some(staged)) => staged,
            Ok(None) => return UpdateOutcome::NoUpdateAvailable,
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "update check failed: {}", e);
                return UpdateOutcome::Failed(e);
            }
        };

        match staged.apply() {
            Ok(never) => match never {},
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "update not applied: {}", e);
                UpdateOutcome::Failed(e)
            }
        }
    }
}

/// Downloaded payload plus a written, not yet launched, replacement script.
/// Dropping it removes both files.
#[derive(Debug)]
pub struct StagedUpdate {
    remote_version: String,
    artifact: UpdateArtifact,
    script: ReplacementScript,
}

impl StagedUpdate {
    pub fn remote_version(&self) -> &str {
        &self.remote_version
    }

    pub fn artifact(&self) -> &UpdateArtifact {
        &self.artifact
    }

    pub fn script(&self) -> &ReplacementScript {
        &self.script
    }

    /// Executable the script will overwrite and relaunch.
    pub fn target(&self) -> &Path {
        self.script.target()
    }

    /// Hands both files to the detached script without exiting.
    pub fn launch(self) -> Result<(), ScriptError> {
        let StagedUpdate {
            artifact, script, ..
        } = self;
        let artifact_path = artifact.keep().map_err(ScriptError::Persist)?;
        if let Err(e) = script.launch() {
            let _ = std::fs::remove_file(&artifact_path);
            return Err(e);
        }
        Ok(())
    }

    /// Launches the script and terminates this process with status 0.
    /// Returns only if the launch failed.
    pub fn apply(self) -> Result<Infallible, UpdateError> {
        let version = self.remote_version.clone();
        self.launch()?;
        tracing::info!("relaunching into version {}", version);
        std::process::exit(0)
    }
}

/// Boolean form of `check_for_update` with the built-in defaults, so the
/// metadata URL is the one baked in through `RELAUNCH_METADATA_URL`. No
/// config file is read or created.
///
/// Always `false` when it returns: either no update was due or the check
/// failed. An applied update ends the process instead.
pub fn updated(current_version: &str) -> bool {
    updated_with(UpdaterConfig::default(), current_version)
}

/// `updated` with an explicit configuration.
pub fn updated_with(config: UpdaterConfig, current_version: &str) -> bool {
    match Updater::new(config).check_for_update(current_version) {
        UpdateOutcome::NoUpdateAvailable | UpdateOutcome::Failed(_) => false,
    }
}
