pub mod model;
pub mod persistence;
pub mod store;

pub use model::{HistoryEntry, NewPosition, OptionContract, Position, PositionStatus, MAX_SIZE};
pub use persistence::{PersistenceError, StoreFile, StoreSnapshot, STORE_FILE_NAME, STORE_VERSION};
pub use store::{PositionStore, PositionUpdate};
