pub mod controller;

pub use controller::{PositionSummary, SessionController};
