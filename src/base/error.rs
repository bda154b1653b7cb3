//! Error types for analysis operations.

use smol_str::SmolStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors surfaced by parsing and validation.
///
/// Malformed templates are never errors: they become tree shape or
/// diagnostics. Only cooperative cancellation and host bookkeeping fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The cancellation token was signalled; partial results were dropped.
    #[error("analysis cancelled")]
    Cancelled,

    /// The host has no document registered under this uri.
    #[error("unknown document: {0}")]
    UnknownDocument(SmolStr),
}

/// Return `Err(Cancelled)` once the token has been signalled.
#[inline]
pub fn check_cancelled(cancel: &CancellationToken) -> Result<(), AnalysisError> {
    if cancel.is_cancelled() {
        Err(AnalysisError::Cancelled)
    } else {
        Ok(())
    }
}
