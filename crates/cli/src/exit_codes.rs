//! Stable exit codes for the `issue-janitor` binary.

use janitor::JanitorError;

/// Every configured entry was processed.
pub const OK: u8 = 0;
/// A transport or mutation failure aborted the run, or the config file could not be read.
pub const FAILURE: u8 = 1;
/// The configuration is invalid (blank owner, malformed document, unknown state).
pub const CONFIGURATION: u8 = 2;

/// Maps a fatal error to the process exit status.
pub fn for_error(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<JanitorError>() {
        Some(e) if e.is_configuration() => CONFIGURATION,
        _ => FAILURE,
    }
}
