use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{HedgeError, Result};
use crate::hedge::{HedgeCalculator, HedgeConvention, OptionType};

/// Largest accepted position size, in underlying units. Keeps hedge sums
/// and deviations far from `Decimal::MAX`.
pub const MAX_SIZE: Decimal = dec!(1000000000);

/// Static description of the option being hedged
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionContract {
    pub underlying_symbol: String,
    /// Opaque expiry token such as `29MAR`
    pub expiry: String,
    pub strike: Decimal,
    pub option_type: OptionType,
}

impl OptionContract {
    /// `{symbol}-{expiry}-{strike}-{C|P}`, e.g. `BTC-29MAR-72000-C`
    pub fn contract_name(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.underlying_symbol,
            self.expiry,
            self.strike.normalize(),
            self.option_type.code()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Active,
    Closed,
}

/// User-supplied parameters for opening a position
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub underlying_symbol: String,
    pub expiry: String,
    pub option_type: OptionType,
    pub strike: Decimal,
    pub size: Decimal,
    pub entry_delta: Decimal,
    pub band: Decimal,
}

impl NewPosition {
    /// Normalise tokens and check every construction constraint
    pub fn validate(self) -> Result<Self> {
        let underlying_symbol = normalize_token("underlying symbol", &self.underlying_symbol)?;
        let expiry = normalize_token("expiry", &self.expiry)?;

        require_positive("strike", self.strike)?;
        require_positive("size", self.size)?;
        require_size_cap(self.size)?;
        require_positive("band", self.band)?;
        if self.entry_delta < Decimal::ZERO || self.entry_delta > Decimal::ONE {
            return Err(HedgeError::Validation(format!(
                "entry delta {} must be within [0, 1]",
                self.entry_delta
            )));
        }

        Ok(Self {
            underlying_symbol,
            expiry,
            ..self
        })
    }
}

fn normalize_token(field: &str, value: &str) -> Result<String> {
    let token = value.trim().to_ascii_uppercase();
    if token.is_empty() {
        return Err(HedgeError::Validation(format!("{} must not be empty", field)));
    }
    // '-' separates contract name fields
    if token.contains('-') || token.chars().any(char::is_whitespace) {
        return Err(HedgeError::Validation(format!(
            "{} '{}' must not contain '-' or whitespace",
            field, token
        )));
    }
    Ok(token)
}

fn require_size_cap(size: Decimal) -> Result<()> {
    if size > MAX_SIZE {
        return Err(HedgeError::Validation(format!(
            "size {} exceeds the maximum of {}",
            size, MAX_SIZE
        )));
    }
    Ok(())
}

fn require_positive(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(HedgeError::Validation(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    Ok(())
}

/// One delta-neutral option trade and the hedge held against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Also the position id
    pub contract_name: String,
    #[serde(flatten)]
    pub contract: OptionContract,
    pub size: Decimal,
    pub entry_delta: Decimal,
    pub band: Decimal,
    /// Sign rule the position was opened under; every later target uses it too
    pub convention: HedgeConvention,
    /// Fixed at creation
    pub starting_hedge: Decimal,
    /// Last accepted hedge, positive = long underlying
    pub current_hedge: Decimal,
    pub last_delta: Decimal,
    pub status: PositionStatus,
    #[serde(default)]
    pub rehedge_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Open a position. The starting hedge is assumed executed, so
    /// `current_hedge` starts equal to it.
    pub fn new(params: NewPosition, calculator: &HedgeCalculator, now: DateTime<Utc>) -> Result<Self> {
        let params = params.validate()?;
        let contract = OptionContract {
            underlying_symbol: params.underlying_symbol,
            expiry: params.expiry,
            strike: params.strike,
            option_type: params.option_type,
        };
        let starting_hedge =
            calculator.starting_hedge(params.entry_delta, contract.option_type, params.size)?;

        Ok(Self {
            contract_name: contract.contract_name(),
            contract,
            size: params.size,
            entry_delta: params.entry_delta,
            band: params.band,
            convention: calculator.convention(),
            starting_hedge,
            current_hedge: starting_hedge,
            last_delta: params.entry_delta,
            status: PositionStatus::Active,
            rehedge_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.contract_name
    }

    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    /// Check the invariants of a position read back from disk
    pub fn check_invariants(&self) -> Result<()> {
        let expected = self.contract.contract_name();
        if self.contract_name != expected {
            return Err(HedgeError::Validation(format!(
                "contract name '{}' does not match fields ({})",
                self.contract_name, expected
            )));
        }
        require_positive("strike", self.contract.strike)?;
        require_positive("size", self.size)?;
        require_size_cap(self.size)?;
        require_positive("band", self.band)?;
        for (field, hedge) in [("starting hedge", self.starting_hedge), ("current hedge", self.current_hedge)] {
            if hedge.abs() > self.size {
                return Err(HedgeError::Validation(format!(
                    "{} {} of {} exceeds size {}",
                    field, hedge, self.contract_name, self.size
                )));
            }
        }
        for (field, delta) in [("entry delta", self.entry_delta), ("last delta", self.last_delta)] {
            if delta < Decimal::ZERO || delta > Decimal::ONE {
                return Err(HedgeError::Validation(format!(
                    "{} {} of {} outside [0, 1]",
                    field, delta, self.contract_name
                )));
            }
        }
        Ok(())
    }
}

/// Frozen snapshot of a position at close time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub position: Position,
    pub closed_at: DateTime<Utc>,
}
