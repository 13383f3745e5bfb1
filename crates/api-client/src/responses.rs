use rust_decimal::Decimal;
use serde::Deserialize;

/// The envelope returned by the `/v8/finance/chart/{ticker}` endpoint.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    #[serde(default)]
    pub currency: Option<String>,
    /// Absent for delisted or halted instruments.
    #[serde(default)]
    pub regular_market_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

impl ChartResponse {
    /// The last trade price, or `Decimal::ZERO` when the API has none.
    pub fn regular_market_price(&self) -> Decimal {
        self.chart
            .result
            .as_deref()
            .and_then(|results| results.first())
            .and_then(|r| r.meta.regular_market_price)
            .unwrap_or(Decimal::ZERO)
    }
}
