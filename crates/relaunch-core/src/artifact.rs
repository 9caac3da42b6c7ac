//! Downloaded update payload on disk.
//!
//! The file lives in the temp directory under a fresh name and is removed on
//! drop, unless ownership is handed to a launched replacement script.

use crate::transfer::{self, Transfer, TransferError, TransferOptions};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

const ARTIFACT_PREFIX: &str = "relaunch-update-";

/// Downloaded replacement executable.
#[derive(Debug)]
pub struct UpdateArtifact {
    path: TempPath,
    transfer: Transfer,
}

impl UpdateArtifact {
    /// Downloads `url` into a fresh file in `dir`. Nothing is left behind on failure.
    pub fn download(
        url: &str,
        dir: &Path,
        opts: &TransferOptions,
    ) -> Result<Self, TransferError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(std::env::consts::EXE_SUFFIX)
            .tempfile_in(dir)
            .map_err(TransferError::Storage)?;

        let transfer = transfer::fetch_to_file(url, tmp.as_file_mut(), opts)?;
        if transfer.bytes == 0 {
            return Err(TransferError::Empty);
        }
        tmp.as_file().sync_all().map_err(TransferError::Storage)?;

        let path = tmp.into_temp_path();
        make_executable(&path).map_err(TransferError::Storage)?;

        tracing::debug!(
            path = %path.display(),
            bytes = transfer.bytes,
            sha256 = %transfer.sha256,
            "update artifact downloaded"
        );
        Ok(UpdateArtifact { path, transfer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload size in bytes; never zero, empty downloads are rejected.
    pub fn size(&self) -> u64 {
        self.transfer.bytes
    }

    pub fn sha256(&self) -> &str {
        &self.transfer.sha256
    }

    /// Stop deleting the file on drop; the replacement script removes it after the swap.
    pub(crate) fn keep(self) -> io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
