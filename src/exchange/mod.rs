pub mod binance;
pub mod manual;
pub mod mock;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use crate::position::OptionContract;

pub use binance::BinanceOptionsClient;
pub use manual::ManualEntry;
pub use mock::MockDeltaSource;

/// Why a delta could not be obtained
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("exchange rejected request: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cannot map contract to exchange symbol: {0}")]
    UnsupportedContract(String),

    #[error("no delta for {0}")]
    MissingDelta(String),

    #[error("input closed")]
    NoInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can produce the current delta magnitude of an option:
/// a live exchange feed, a mock, or a person typing at a prompt.
#[async_trait]
pub trait DeltaSource: Send + Sync {
    /// Short label for logs and prompts
    fn name(&self) -> &str;

    /// Current delta magnitude. Implementations return the absolute value;
    /// range checking is left to the caller.
    async fn fetch_delta(&self, contract: &OptionContract) -> Result<Decimal, FetchError>;
}
