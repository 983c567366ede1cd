use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::exchange::{DeltaSource, FetchError};
use crate::hedge::OptionType;
use crate::position::OptionContract;

/// Offline delta estimate from moneyness around a fixed spot price.
///
/// Piecewise linear, good enough for dry runs of the rehedge flow. Not a
/// pricing model.
#[derive(Debug, Clone)]
pub struct MockDeltaSource {
    spot: Decimal,
}

impl MockDeltaSource {
    pub fn new(spot: Decimal) -> Self {
        Self { spot }
    }

    pub fn spot(&self) -> Decimal {
        self.spot
    }

    /// Estimated delta magnitude, clamped to [0, 1]. `None` for a zero
    /// strike or one so small that `spot / strike` overflows.
    pub fn estimate(&self, strike: Decimal, option_type: OptionType) -> Option<Decimal> {
        let moneyness = self.spot.checked_div(strike)?;

        let raw = match option_type {
            OptionType::Call => {
                if moneyness > dec!(1.05) {
                    dec!(0.70) + (moneyness - dec!(1.05)) * dec!(0.5)
                } else if moneyness > dec!(0.95) {
                    dec!(0.50) + (moneyness - Decimal::ONE) * dec!(2)
                } else {
                    dec!(0.30) + (moneyness - dec!(0.9)) * dec!(2)
                }
            }
            OptionType::Put => {
                if moneyness < dec!(0.95) {
                    dec!(0.70) + (Decimal::ONE - moneyness) * dec!(0.5)
                } else if moneyness > dec!(1.05) {
                    dec!(0.30) - (moneyness - Decimal::ONE) * dec!(0.5)
                } else {
                    dec!(0.50) - (moneyness - Decimal::ONE) * dec!(2)
                }
            }
        };

        Some(raw.clamp(Decimal::ZERO, Decimal::ONE).round_dp(4))
    }
}

#[async_trait]
impl DeltaSource for MockDeltaSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_delta(&self, contract: &OptionContract) -> Result<Decimal, FetchError> {
        if contract.strike <= Decimal::ZERO {
            return Err(FetchError::UnsupportedContract(contract.contract_name()));
        }
        self.estimate(contract.strike, contract.option_type)
            .ok_or_else(|| FetchError::UnsupportedContract(contract.contract_name()))
    }
}
