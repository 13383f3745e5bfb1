use crate::error::ConfigError;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trader: TraderConfig,
    pub quotes: QuotesConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Rejects settings that would make the trading session meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let trader = &self.trader;
        if trader.tickers.is_empty() {
            return Err(ConfigError::ValidationError(
                "trader.tickers must list at least one ticker".to_string(),
            ));
        }
        if trader.tickers.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "trader.tickers must not contain blank entries".to_string(),
            ));
        }
        if trader.initial_cash.is_sign_negative() {
            return Err(ConfigError::ValidationError(format!(
                "trader.initial_cash must not be negative, got {}",
                trader.initial_cash
            )));
        }
        if trader.trading_hours_start >= trader.trading_hours_end {
            return Err(ConfigError::ValidationError(format!(
                "trader.trading_hours_start ({}) must be before trading_hours_end ({})",
                trader.trading_hours_start, trader.trading_hours_end
            )));
        }
        for (key, secs) in [
            ("cycle_interval_secs", trader.cycle_interval_secs),
            ("pre_open_poll_secs", trader.pre_open_poll_secs),
            ("after_close_poll_secs", trader.after_close_poll_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "trader.{key} must be greater than 0"
                )));
            }
        }
        if self.quotes.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "quotes.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the trading session loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraderConfig {
    /// The instruments the session trades. Decisions for anything else are ignored.
    pub tickers: Vec<String>,
    /// Starting cash of the in-memory portfolio.
    pub initial_cash: Decimal,
    /// Local time at which cycles start running (inclusive).
    pub trading_hours_start: NaiveTime,
    /// Local time after which cycles stop running (inclusive).
    pub trading_hours_end: NaiveTime,
    /// Pause between two cycles inside trading hours.
    pub cycle_interval_secs: u64,
    /// Poll interval while waiting for the market to open.
    pub pre_open_poll_secs: u64,
    /// Poll interval after the market has closed.
    pub after_close_poll_secs: u64,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            tickers: ["AAPL", "MSFT", "GOOGL", "AMZN", "META"]
                .into_iter()
                .map(String::from)
                .collect(),
            initial_cash: dec!(100000),
            trading_hours_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            trading_hours_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
            cycle_interval_secs: 300,
            pre_open_poll_secs: 300,
            after_close_poll_secs: 3600,
        }
    }
}

/// Settings for the HTTP quote provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotesConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Credentials for the Telegram Bot API. Both must be set for alerts to be sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

/// Output format of the console log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}
