//! Self-update for a standalone executable.
//!
//! Fetches a JSON version descriptor, downloads the published build when its
//! version differs from the running one, and hands the swap to a detached
//! script that replaces and relaunches the executable after this process exits.

pub mod config;
pub mod logging;
pub mod paths;

pub mod artifact;
pub mod descriptor;
pub mod error;
pub mod script;
pub mod transfer;
pub mod updater;
pub mod version;

pub use config::UpdaterConfig;
pub use descriptor::VersionDescriptor;
pub use error::{OutcomeKind, UpdateError, UpdateOutcome};
pub use updater::{updated, updated_with, StagedUpdate, Updater};
