//! # Alerter
//!
//! The `Notifier` capability the executor reports outcomes through, and its
//! implementations. A `Notifier` never returns an error: delivery failures are
//! logged and dropped inside the implementation.

use crate::error::AlerterError;
use async_trait::async_trait;
use chrono::Local;
use configuration::TelegramConfig;
use core_types::{PortfolioSnapshot, TradeSignal};
use reqwest::Client;
use serde::Serialize;

pub mod error;
pub mod messages;

pub use messages::{escape_markdown, format_error, format_portfolio_update, format_signal};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Best-effort delivery of trading outcomes.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_signal(&self, signal: &TradeSignal);

    async fn send_portfolio_update(&self, snapshot: &PortfolioSnapshot);

    async fn send_error(&self, message: &str);
}

/// The JSON payload for the Telegram `sendMessage` endpoint.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str, // To allow for formatting like bold, italics etc.
}

/// A client for sending messages to the Telegram Bot API.
pub struct TelegramAlerter {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramAlerter {
    /// Creates a new `TelegramAlerter`.
    ///
    /// Returns `None` if the token or chat_id is missing from the configuration,
    /// allowing the system to gracefully disable alerting.
    pub fn new(config: &TelegramConfig) -> Option<Self> {
        Self::with_api_base(config, TELEGRAM_API_BASE)
    }

    /// Like [`TelegramAlerter::new`] but against a different Bot API host.
    pub fn with_api_base(config: &TelegramConfig, api_base: &str) -> Option<Self> {
        if !config.is_configured() {
            tracing::warn!("Telegram alerter is not configured (missing token or chat_id).");
            return None;
        }
        Some(Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Sends a text message to the configured Telegram chat.
    pub async fn send_message(&self, message: &str) -> Result<(), AlerterError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);

        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "MarkdownV2",
        };

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlerterError::ApiError(error_text));
        }

        Ok(())
    }

    /// Sends and swallows any failure. This is the containment boundary the
    /// `Notifier` contract relies on.
    async fn deliver(&self, kind: &'static str, message: &str) {
        if let Err(e) = self.send_message(message).await {
            tracing::error!(error = %e, kind, "Failed to send Telegram message.");
        }
    }
}

#[async_trait]
impl Notifier for TelegramAlerter {
    async fn send_signal(&self, signal: &TradeSignal) {
        let text = format_signal(signal, Local::now().naive_local());
        self.deliver("signal", &text).await;
    }

    async fn send_portfolio_update(&self, snapshot: &PortfolioSnapshot) {
        let text = format_portfolio_update(snapshot, Local::now().naive_local());
        self.deliver("portfolio", &text).await;
    }

    async fn send_error(&self, message: &str) {
        let text = format_error(message, Local::now().naive_local());
        self.deliver("error", &text).await;
    }
}

/// A notifier that only writes to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_signal(&self, signal: &TradeSignal) {
        tracing::info!(
            ticker = %signal.ticker,
            action = %signal.action,
            quantity = signal.quantity,
            price = %signal.price,
            confidence = signal.confidence,
            reasoning = %signal.reasoning,
            "Trading signal"
        );
    }

    async fn send_portfolio_update(&self, snapshot: &PortfolioSnapshot) {
        tracing::info!(
            cash = %snapshot.cash,
            positions = snapshot.positions.len(),
            "Portfolio update"
        );
        for position in &snapshot.positions {
            tracing::info!(
                ticker = %position.ticker,
                shares = position.shares,
                avg_price = %position.avg_price,
                "  position"
            );
        }
    }

    async fn send_error(&self, message: &str) {
        tracing::error!(%message, "Trading error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Action;
    use rust_decimal_macros::dec;

    fn configured() -> TelegramConfig {
        TelegramConfig {
            token: "123:abc".to_string(),
            chat_id: "42".to_string(),
        }
    }

    #[test]
    fn unconfigured_alerter_is_disabled() {
        assert!(TelegramAlerter::new(&TelegramConfig::default()).is_none());
        assert!(TelegramAlerter::new(&configured()).is_some());
    }

    #[test]
    fn payload_matches_send_message_schema() {
        let payload = SendMessagePayload {
            chat_id: "42",
            text: "hello",
            parse_mode: "MarkdownV2",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chat_id"], "42");
        assert_eq!(json["text"], "hello");
        assert_eq!(json["parse_mode"], "MarkdownV2");
    }

    #[tokio::test]
    async fn delivery_failures_are_contained() {
        // Nothing listens on the discard port, so every request fails.
        let alerter = TelegramAlerter::with_api_base(&configured(), "http://127.0.0.1:9").unwrap();
        assert!(alerter.send_message("ping").await.is_err());

        let signal = TradeSignal {
            ticker: "AAPL".to_string(),
            action: Action::Sell,
            quantity: 1,
            price: dec!(1),
            confidence: 50.0,
            reasoning: String::new(),
        };
        alerter.send_signal(&signal).await;
        alerter
            .send_portfolio_update(&PortfolioSnapshot {
                cash: dec!(1),
                positions: Vec::new(),
                margin_reserved: dec!(0),
            })
            .await;
        alerter.send_error("boom").await;
    }
}
