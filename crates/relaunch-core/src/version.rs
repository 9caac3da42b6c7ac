//! Version decision.
//!
//! Versions are opaque strings: an update is due whenever the published
//! version differs from the running one, byte for byte.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    UpToDate,
    UpdateAvailable,
}

pub fn decide(current: &str, remote: &str) -> Decision {
    if current == remote {
        Decision::UpToDate
    } else {
        Decision::UpdateAvailable
    }
}
