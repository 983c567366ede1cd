use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Entry of the options mark price endpoint (`/eapi/v1/mark`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptionMark {
    pub symbol: String,  // "BTC-260329-72000-C"

    #[serde(rename = "markPrice")]
    pub mark_price: String,

    #[serde(rename = "markIV", default)]
    pub mark_iv: Option<String>,

    #[serde(default)]
    pub delta: Option<String>,  // signed, puts are negative

    #[serde(default)]
    pub gamma: Option<String>,

    #[serde(default)]
    pub theta: Option<String>,

    #[serde(default)]
    pub vega: Option<String>,
}

impl OptionMark {
    /// Signed delta as a decimal, if present and parseable
    pub fn parse_delta(&self) -> Option<Decimal> {
        let raw = self.delta.as_deref()?.trim();
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
    }
}

/// Error body returned by the options API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_mark() {
        let json = r#"[{
            "symbol": "BTC-260329-72000-C",
            "markPrice": "1510",
            "bidIV": "0.5",
            "askIV": "0.55",
            "markIV": "0.52",
            "delta": "0.53251",
            "theta": "-120.5",
            "gamma": "0.00004",
            "vega": "60.1",
            "highPriceLimit": "2100",
            "lowPriceLimit": "5"
        }]"#;

        let marks: Vec<OptionMark> = serde_json::from_str(json).unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].parse_delta(), Some(dec!(0.53251)));
    }

    #[test]
    fn test_parse_scientific_delta() {
        let mark = OptionMark {
            symbol: "BTC-260329-150000-C".to_string(),
            mark_price: "5".to_string(),
            mark_iv: None,
            delta: Some("1.5E-4".to_string()),
            gamma: None,
            theta: None,
            vega: None,
        };
        assert_eq!(mark.parse_delta(), Some(dec!(0.00015)));
    }

    #[test]
    fn test_missing_delta() {
        let json = r#"{"symbol": "BTC-260329-72000-P", "markPrice": "900"}"#;
        let mark: OptionMark = serde_json::from_str(json).unwrap();
        assert_eq!(mark.parse_delta(), None);
    }
}
