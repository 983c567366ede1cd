use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HedgeError, Result};
use crate::hedge::types::{HedgeAction, HedgeConvention, OptionType, Trigger};
use crate::position::{Position, PositionStatus};

/// Outcome of comparing the target hedge with the hedge actually held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RehedgeDecision {
    pub target_hedge: Decimal,
    pub current_hedge: Decimal,
    /// `target_hedge - current_hedge`
    pub deviation: Decimal,
    pub action: HedgeAction,
    /// Underlying units to trade, zero when inside the band
    pub quantity: Decimal,
    pub trigger: Trigger,
}

impl RehedgeDecision {
    pub fn is_rehedge(&self) -> bool {
        self.trigger == Trigger::Rehedge
    }
}

impl fmt::Display for RehedgeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trigger {
            Trigger::Rehedge => write!(
                f,
                "REHEDGE: {} {} (target {}, held {})",
                self.action, self.quantity, self.target_hedge, self.current_hedge
            ),
            Trigger::Ok => write!(
                f,
                "OK: deviation {} inside band (target {}, held {})",
                self.deviation, self.target_hedge, self.current_hedge
            ),
        }
    }
}

/// Reject deltas outside [0, 1]
pub fn validate_delta(delta: Decimal) -> Result<Decimal> {
    if delta < Decimal::ZERO || delta > Decimal::ONE {
        return Err(HedgeError::InvalidDelta(delta));
    }
    Ok(delta)
}

/// Compare target against held hedge.
///
/// Triggers only when `|target - current| > band`; a deviation exactly on
/// the band stays `OK`.
pub fn evaluate_rehedge(target_hedge: Decimal, current_hedge: Decimal, band: Decimal) -> RehedgeDecision {
    let deviation = target_hedge - current_hedge;
    let magnitude = deviation.abs();

    let (action, quantity, trigger) = if magnitude > band {
        let action = if deviation > Decimal::ZERO {
            HedgeAction::Buy
        } else {
            HedgeAction::Sell
        };
        (action, magnitude, Trigger::Rehedge)
    } else {
        (HedgeAction::None, Decimal::ZERO, Trigger::Ok)
    };

    RehedgeDecision {
        target_hedge,
        current_hedge,
        deviation,
        action,
        quantity,
        trigger,
    }
}

/// Stateless hedge math for one sign convention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HedgeCalculator {
    convention: HedgeConvention,
}

impl HedgeCalculator {
    pub fn new(convention: HedgeConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> HedgeConvention {
        self.convention
    }

    /// Signed underlying hedge for a delta magnitude.
    ///
    /// Positive = long underlying. Short option: CALL `+delta*size`,
    /// PUT `-delta*size`. Long option inverts both.
    pub fn hedge(&self, delta: Decimal, option_type: OptionType, size: Decimal) -> Decimal {
        let exposure = delta * size;
        let hedge = match (self.convention, option_type) {
            (HedgeConvention::ShortOption, OptionType::Call) => exposure,
            (HedgeConvention::ShortOption, OptionType::Put) => -exposure,
            (HedgeConvention::LongOption, OptionType::Call) => -exposure,
            (HedgeConvention::LongOption, OptionType::Put) => exposure,
        };

        // avoid persisting "-0"
        if hedge.is_zero() {
            Decimal::ZERO
        } else {
            hedge
        }
    }

    /// Hedge opened alongside the option at entry
    pub fn starting_hedge(&self, entry_delta: Decimal, option_type: OptionType, size: Decimal) -> Result<Decimal> {
        let entry_delta = validate_delta(entry_delta)?;
        Ok(self.hedge(entry_delta, option_type, size))
    }

    /// Hedge the position should hold at `observed_delta`.
    ///
    /// Uses the convention the position was opened under, not this
    /// calculator's, so the target shares its sign rule with `starting_hedge`.
    pub fn target_hedge(&self, position: &Position, observed_delta: Decimal) -> Result<Decimal> {
        if position.status == PositionStatus::Closed {
            return Err(HedgeError::InvalidState(format!(
                "{} is closed",
                position.contract_name
            )));
        }
        let delta = validate_delta(observed_delta)?;
        Ok(HedgeCalculator::new(position.convention).hedge(
            delta,
            position.contract.option_type,
            position.size,
        ))
    }

    /// Full rehedge decision for a new delta observation. Pure: the
    /// position is not touched.
    pub fn decide(&self, position: &Position, observed_delta: Decimal) -> Result<RehedgeDecision> {
        let target = self.target_hedge(position, observed_delta)?;
        Ok(evaluate_rehedge(target, position.current_hedge, position.band))
    }
}
