pub mod calculator;
pub mod types;

pub use calculator::{evaluate_rehedge, validate_delta, HedgeCalculator, RehedgeDecision};
pub use types::{HedgeAction, HedgeConvention, OptionType, Trigger};
