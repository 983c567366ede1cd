use rust_decimal::Decimal;
use thiserror::Error;

use crate::exchange::FetchError;
use crate::position::PersistenceError;

/// Errors surfaced by the hedge core and the session controller.
///
/// Every variant is recoverable: the store is left exactly as it was before
/// the failing call.
#[derive(Debug, Error)]
pub enum HedgeError {
    /// Bad construction parameters (non-positive size/strike/band, delta out of range, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Observed delta outside [0, 1].
    #[error("invalid delta {0}: must be within [0, 1]")]
    InvalidDelta(Decimal),

    /// Operation not allowed in the position's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// No active position with this id.
    #[error("position not found: {0}")]
    NotFound(String),

    /// Delta source failed or timed out.
    #[error("delta unavailable: {0}")]
    Unavailable(#[from] FetchError),

    /// Store file could not be read or written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T, E = HedgeError> = std::result::Result<T, E>;
