use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, warn};

use crate::exchange::binance::symbol::binance_symbol;
use crate::exchange::binance::types::{ApiErrorBody, OptionMark};
use crate::exchange::{DeltaSource, FetchError};
use crate::position::OptionContract;

/// Binance Options (eapi) REST client. Only public market data endpoints
/// are used, so no credentials are needed.
pub struct BinanceOptionsClient {
    client: Client,
    base_url: String,
    expiry_year: i32,
}

impl BinanceOptionsClient {
    /// Create new REST client
    pub fn new(base_url: String, timeout: Duration, expiry_year: i32) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            expiry_year,
        })
    }

    /// Mark price and greeks for one option symbol
    pub async fn get_mark(&self, symbol: &str) -> Result<OptionMark, FetchError> {
        let url = format!("{}/eapi/v1/mark", self.base_url);
        debug!("Fetching mark for {} from {}", symbol, url);

        let response = self.client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|body| format!("{} ({})", body.msg, body.code))
                .unwrap_or(error_text);
            warn!("Mark request for {} failed: {} - {}", symbol, status, message);
            return Err(FetchError::Api { status, message });
        }

        let marks = response.json::<Vec<OptionMark>>().await?;
        marks
            .into_iter()
            .find(|m| m.symbol == symbol)
            .ok_or_else(|| FetchError::MissingDelta(symbol.to_string()))
    }

    /// Test connectivity to the options API
    pub async fn test_connectivity(&self) -> Result<(), FetchError> {
        let url = format!("{}/eapi/v1/ping", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(FetchError::Api {
                status: response.status().as_u16(),
                message: "connectivity test failed".to_string(),
            })
        }
    }

    /// Get exchange time in milliseconds
    pub async fn get_server_time(&self) -> Result<u64, FetchError> {
        let url = format!("{}/eapi/v1/time", self.base_url);
        let response = self.client.get(&url).send().await?;

        #[derive(serde::Deserialize)]
        struct ServerTime {
            #[serde(rename = "serverTime")]
            server_time: u64,
        }

        let time = response.json::<ServerTime>().await?;
        Ok(time.server_time)
    }
}

#[async_trait]
impl DeltaSource for BinanceOptionsClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_delta(&self, contract: &OptionContract) -> Result<Decimal, FetchError> {
        let symbol = binance_symbol(contract, self.expiry_year)?;
        let mark = self.get_mark(&symbol).await?;
        let delta = mark
            .parse_delta()
            .ok_or_else(|| FetchError::MissingDelta(symbol.clone()))?;

        debug!("{} delta {}", symbol, delta);
        Ok(delta.abs())
    }
}
