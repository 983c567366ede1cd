pub mod error;
pub mod exchange;
pub mod hedge;
pub mod position;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use error::{HedgeError, Result};
pub use exchange::{BinanceOptionsClient, DeltaSource, FetchError, ManualEntry, MockDeltaSource};
pub use hedge::{
    evaluate_rehedge, HedgeAction, HedgeCalculator, HedgeConvention, OptionType,
    RehedgeDecision, Trigger,
};
pub use position::{
    HistoryEntry, NewPosition, OptionContract, Position, PositionStatus, PositionStore,
    PositionUpdate, StoreFile,
};
pub use session::{PositionSummary, SessionController};
pub use utils::Config;
