use crate::error::{ExecutorError, OrderRejection};
use crate::portfolio::Portfolio;
use alerter::Notifier;
use api_client::PriceSource;
use core_types::{Action, DecisionBatch, TradeSignal};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Validates and applies orders against a caller-owned `Portfolio`.
///
/// Orders are priced through a `PriceSource` and, when a `Notifier` is set,
/// every outcome is reported through it. The executor keeps no portfolio state
/// of its own; the `&mut Portfolio` borrow is the single-writer guarantee.
pub struct TradeExecutor {
    prices: Arc<dyn PriceSource>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl TradeExecutor {
    pub fn new(prices: Arc<dyn PriceSource>) -> Self {
        Self {
            prices,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_optional_notifier(mut self, notifier: Option<Arc<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn notifier(&self) -> Option<&Arc<dyn Notifier>> {
        self.notifier.as_ref()
    }

    /// Executes one order.
    ///
    /// Returns `Ok(None)` for `Hold`, which fetches no price and sends nothing.
    /// On success the portfolio is mutated before any notification is sent, so
    /// an interrupted notification never undoes a fill. On failure the portfolio
    /// is unchanged and the error is reported to the notifier before returning.
    pub async fn execute_trade(
        &self,
        portfolio: &mut Portfolio,
        ticker: &str,
        action: Action,
        quantity: u32,
        confidence: f64,
        reasoning: &str,
    ) -> Result<Option<TradeSignal>, ExecutorError> {
        if !action.is_actionable() {
            return Ok(None);
        }

        let price = match self.fill(portfolio, ticker, action, quantity).await {
            Ok(price) => price,
            Err(rejection) => {
                let error = ExecutorError::new(action, ticker, rejection);
                tracing::warn!(%ticker, %action, quantity, error = %error, "Order rejected");
                if let Some(notifier) = &self.notifier {
                    notifier.send_error(&error.to_string()).await;
                }
                return Err(error);
            }
        };

        let signal = TradeSignal {
            ticker: ticker.to_string(),
            action,
            quantity,
            price,
            confidence,
            reasoning: reasoning.to_string(),
        };
        tracing::info!(
            %ticker,
            %action,
            quantity,
            %price,
            cash = %portfolio.cash,
            "Order filled"
        );

        if let Some(notifier) = &self.notifier {
            notifier.send_signal(&signal).await;
            notifier.send_portfolio_update(&portfolio.snapshot()).await;
        }

        Ok(Some(signal))
    }

    /// Prices the order and applies it. Returns the fill price.
    async fn fill(
        &self,
        portfolio: &mut Portfolio,
        ticker: &str,
        action: Action,
        quantity: u32,
    ) -> Result<Decimal, OrderRejection> {
        let price = match self.prices.get_quote(ticker).await {
            Ok(price) if price > Decimal::ZERO => price,
            Ok(_) => {
                return Err(OrderRejection::PriceUnavailable {
                    ticker: ticker.to_string(),
                    reason: "no usable price returned".to_string(),
                });
            }
            Err(e) => {
                return Err(OrderRejection::PriceUnavailable {
                    ticker: ticker.to_string(),
                    reason: e.to_string(),
                });
            }
        };
        tracing::debug!(%ticker, %price, "Resolved order price");

        portfolio.apply(ticker, action, quantity, price)?;
        Ok(price)
    }

    /// Executes a batch of decisions in order.
    ///
    /// `Hold` entries are skipped. The first failing order aborts the batch:
    /// orders before it stay applied and orders after it are never attempted.
    /// Returns the signals of every applied order.
    pub async fn execute_portfolio_decisions(
        &self,
        portfolio: &mut Portfolio,
        decisions: &DecisionBatch,
    ) -> Result<Vec<TradeSignal>, ExecutorError> {
        tracing::info!(decisions = decisions.len(), "Executing decision batch");

        let mut applied = Vec::new();
        for (ticker, decision) in decisions.iter() {
            if !decision.action.is_actionable() {
                tracing::debug!(%ticker, "Holding");
                continue;
            }

            let signal = self
                .execute_trade(
                    portfolio,
                    ticker,
                    decision.action,
                    decision.quantity,
                    decision.confidence,
                    &decision.reasoning,
                )
                .await?;
            applied.extend(signal);
        }

        tracing::info!(applied = applied.len(), cash = %portfolio.cash, "Decision batch complete");
        Ok(applied)
    }
}
