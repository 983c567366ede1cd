use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HedgeError;

/// Option right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Single-letter code used in contract names
    pub fn code(&self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

impl FromStr for OptionType {
    type Err = HedgeError;

    /// Accepts `call`, `put`, `c`, `p` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(HedgeError::Validation(format!(
                "option type must be call or put, got '{}'",
                other
            ))),
        }
    }
}

/// Which side of the option the trader holds.
///
/// Gamma scalping is usually run short options, so a short call carries
/// negative delta and is hedged long underlying. Holding the option long
/// inverts every hedge sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeConvention {
    #[default]
    ShortOption,
    LongOption,
}

impl fmt::Display for HedgeConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HedgeConvention::ShortOption => write!(f, "short_option"),
            HedgeConvention::LongOption => write!(f, "long_option"),
        }
    }
}

impl FromStr for HedgeConvention {
    type Err = HedgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "short_option" | "short" => Ok(HedgeConvention::ShortOption),
            "long_option" | "long" => Ok(HedgeConvention::LongOption),
            other => Err(HedgeError::Validation(format!(
                "hedge convention must be short_option or long_option, got '{}'",
                other
            ))),
        }
    }
}

/// Underlying trade suggested by a rehedge decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HedgeAction {
    Buy,
    Sell,
    None,
}

impl fmt::Display for HedgeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HedgeAction::Buy => write!(f, "BUY"),
            HedgeAction::Sell => write!(f, "SELL"),
            HedgeAction::None => write!(f, "NONE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trigger {
    /// Deviation inside the band
    Ok,
    /// Deviation strictly beyond the band
    Rehedge,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Ok => write!(f, "OK"),
            Trigger::Rehedge => write!(f, "REHEDGE"),
        }
    }
}
