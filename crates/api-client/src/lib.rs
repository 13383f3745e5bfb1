//! # Quote API Client
//!
//! Defines the `PriceSource` capability the executor prices orders with, and a
//! concrete HTTP implementation backed by the Yahoo Finance chart endpoint.

use crate::error::ApiError;
use async_trait::async_trait;
use configuration::QuotesConfig;
use rust_decimal::Decimal;
use std::time::Duration;

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::ChartResponse;

/// Resolves an instrument to its current trade price.
///
/// Implementations return `Ok(Decimal::ZERO)` when the upstream has no usable
/// price. Callers must treat zero and `Err` the same way.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn get_quote(&self, ticker: &str) -> Result<Decimal, ApiError>;
}

/// A `PriceSource` backed by the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooQuoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooQuoteClient {
    pub fn new(config: &QuotesConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("autotrader/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, ticker)
    }
}

/// Extracts the trade price from a chart response body.
pub fn parse_chart_price(body: &str) -> Result<Decimal, ApiError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))?;

    if let Some(err) = &response.chart.error {
        return Err(ApiError::ApiError(format!("{}: {}", err.code, err.description)));
    }

    let price = response.regular_market_price();
    if price.is_sign_negative() {
        return Err(ApiError::InvalidData(format!("negative price {}", price)));
    }
    Ok(price)
}

#[async_trait]
impl PriceSource for YahooQuoteClient {
    async fn get_quote(&self, ticker: &str) -> Result<Decimal, ApiError> {
        let url = self.chart_url(ticker);
        tracing::debug!(ticker, %url, "Fetching quote");

        let response = self
            .client
            .get(&url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() && !text.contains("\"chart\"") {
            return Err(ApiError::ApiError(format!("HTTP {} for {}", status, ticker)));
        }

        let price = parse_chart_price(&text)?;
        tracing::debug!(ticker, %price, "Received quote");
        Ok(price)
    }
}
