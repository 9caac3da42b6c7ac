//! CLI command handlers, one per file.

mod apply;
mod check;
mod config;

pub use apply::run_apply;
pub use check::run_check;
pub use config::run_config;
