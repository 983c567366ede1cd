use chrono::NaiveDate;

use crate::exchange::FetchError;
use crate::position::OptionContract;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Exchange symbol for a contract, e.g. `BTC-29MAR` strike 72000 call in
/// 2026 becomes `BTC-260329-72000-C`.
///
/// Expiry tokens are either `DMMM`/`DDMMM` (year taken from `expiry_year`)
/// or already `YYMMDD`.
pub fn binance_symbol(contract: &OptionContract, expiry_year: i32) -> Result<String, FetchError> {
    let date = expiry_to_yymmdd(&contract.expiry, expiry_year).ok_or_else(|| {
        FetchError::UnsupportedContract(format!(
            "expiry '{}' is neither DDMMM nor YYMMDD",
            contract.expiry
        ))
    })?;

    Ok(format!(
        "{}-{}-{}-{}",
        contract.underlying_symbol.to_ascii_uppercase(),
        date,
        contract.strike.normalize(),
        contract.option_type.code()
    ))
}

fn expiry_to_yymmdd(expiry: &str, year: i32) -> Option<String> {
    let token = expiry.trim().to_ascii_uppercase();

    if token.len() == 6 && token.chars().all(|c| c.is_ascii_digit()) {
        let yy: i32 = token[0..2].parse().ok()?;
        let mm: u32 = token[2..4].parse().ok()?;
        let dd: u32 = token[4..6].parse().ok()?;
        NaiveDate::from_ymd_opt(2000 + yy, mm, dd)?;
        return Some(token);
    }

    let split = token.find(|c: char| !c.is_ascii_digit())?;
    let (day, month) = token.split_at(split);
    if day.is_empty() || day.len() > 2 {
        return None;
    }
    let day: u32 = day.parse().ok()?;
    let month = MONTHS.iter().position(|m| *m == month)? as u32 + 1;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.format("%y%m%d").to_string())
}
