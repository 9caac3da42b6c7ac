//! Update outcome classification.
//!
//! Every step of an update check reports through `UpdateError`; callers that
//! only care about the shape of the result use `OutcomeKind`.

use crate::descriptor::DescriptorError;
use crate::script::ScriptError;
use crate::transfer::TransferError;

/// Coarse classification of an update check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Remote version equals the running version.
    NoUpdateAvailable,
    /// The version descriptor could not be retrieved.
    FetchFailed,
    /// The version descriptor was retrieved but is not usable.
    ParseFailed,
    /// The update payload could not be downloaded.
    DownloadFailed,
    /// The replacement script could not be written or launched.
    SwapFailed,
}

/// Failure of one step of the update sequence.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("failed to fetch version descriptor from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: TransferError,
    },

    #[error("invalid version descriptor: {0}")]
    Parse(#[from] DescriptorError),

    #[error("failed to download update from {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: TransferError,
    },

    #[error("failed to apply update: {0}")]
    Swap(#[from] ScriptError),
}

impl UpdateError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            UpdateError::Fetch { .. } => OutcomeKind::FetchFailed,
            UpdateError::Parse(_) => OutcomeKind::ParseFailed,
            UpdateError::Download { .. } => OutcomeKind::DownloadFailed,
            UpdateError::Swap(_) => OutcomeKind::SwapFailed,
        }
    }
}

/// Result of `Updater::check_for_update` when the call returns at all.
///
/// There is no success variant: an applied update ends the process.
#[derive(Debug)]
pub enum UpdateOutcome {
    NoUpdateAvailable,
    Failed(UpdateError),
}

impl UpdateOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            UpdateOutcome::NoUpdateAvailable => OutcomeKind::NoUpdateAvailable,
            UpdateOutcome::Failed(e) => e.kind(),
        }
    }
}
