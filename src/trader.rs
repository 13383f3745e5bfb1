use crate::decisions::DecisionSource;
use anyhow::Context;
use chrono::{Local, NaiveTime};
use configuration::TraderConfig;
use core_types::{Action, TradeSignal};
use executor::{Portfolio, TradeExecutor};
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;

/// Where the wall clock sits relative to the trading window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    PreOpen,
    Open,
    AfterClose,
}

/// Runs trading cycles against a single in-memory portfolio.
///
/// The trader owns the portfolio, so cycles can never overlap: each one holds
/// the only mutable borrow for its duration.
pub struct AutoTrader<S> {
    config: TraderConfig,
    executor: TradeExecutor,
    source: S,
    portfolio: Portfolio,
}

impl<S: DecisionSource> AutoTrader<S> {
    pub fn new(config: TraderConfig, executor: TradeExecutor, source: S) -> Self {
        let portfolio = Portfolio::new(config.initial_cash);
        Self {
            config,
            executor,
            source,
            portfolio,
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn phase(&self, now: NaiveTime) -> SessionPhase {
        if now < self.config.trading_hours_start {
            SessionPhase::PreOpen
        } else if now <= self.config.trading_hours_end {
            SessionPhase::Open
        } else {
            SessionPhase::AfterClose
        }
    }

    /// Fetches the latest decisions and executes them.
    ///
    /// Any failure is logged and forwarded to the notifier before it is returned;
    /// orders applied before the failure stay applied.
    pub async fn run_trading_cycle(&mut self) -> anyhow::Result<Vec<TradeSignal>> {
        match self.try_cycle().await {
            Ok(signals) => Ok(signals),
            Err(e) => {
                let message = format!("Error in trading cycle: {:#}", e);
                tracing::error!("{}", message);
                if let Some(notifier) = self.executor.notifier() {
                    notifier.send_error(&message).await;
                }
                Err(e)
            }
        }
    }

    async fn try_cycle(&mut self) -> anyhow::Result<Vec<TradeSignal>> {
        let decisions = self
            .source
            .decisions(&self.config.tickers)
            .await
            .context("failed to load decisions")?;

        if decisions.is_empty() {
            tracing::debug!("No decisions this cycle");
            return Ok(Vec::new());
        }

        let signals = self
            .executor
            .execute_portfolio_decisions(&mut self.portfolio, &decisions)
            .await?;
        Ok(signals)
    }

    /// Runs cycles during trading hours until `shutdown` resolves.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tracing::info!(
            tickers = ?self.config.tickers,
            cash = %self.portfolio.cash,
            "Automated trading system started"
        );
        if let Some(notifier) = self.executor.notifier() {
            notifier.send_signal(&startup_signal()).await;
        }

        tokio::pin!(shutdown);
        loop {
            let wait = match self.phase(Local::now().time()) {
                SessionPhase::Open => {
                    // Errors were already reported inside the cycle.
                    let _ = self.run_trading_cycle().await;
                    self.config.cycle_interval_secs
                }
                SessionPhase::PreOpen => self.config.pre_open_poll_secs,
                SessionPhase::AfterClose => self.config.after_close_poll_secs,
            };

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping trading loop");
                    break;
                }
                _ = tokio::time::sleep(Duration::from_secs(wait)) => {}
            }
        }
    }
}

fn startup_signal() -> TradeSignal {
    TradeSignal {
        ticker: "SYSTEM".to_string(),
        action: Action::Hold,
        quantity: 0,
        price: Decimal::ZERO,
        confidence: 100.0,
        reasoning: "Automated trading system started".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerter::Notifier;
    use api_client::PriceSource;
    use api_client::error::ApiError;
    use async_trait::async_trait;
    use crate::decisions::JsonFileDecisionSource;
    use core_types::{Decision, DecisionBatch, PortfolioSnapshot};
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    struct FixedPrice(Decimal);

    #[async_trait]
    impl PriceSource for FixedPrice {
        async fn get_quote(&self, _ticker: &str) -> Result<Decimal, ApiError> {
            Ok(self.0)
        }
    }

    struct StaticSource(DecisionBatch);

    #[async_trait]
    impl DecisionSource for StaticSource {
        async fn decisions(&self, _tickers: &[String]) -> anyhow::Result<DecisionBatch> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl DecisionSource for FailingSource {
        async fn decisions(&self, _tickers: &[String]) -> anyhow::Result<DecisionBatch> {
            anyhow::bail!("analysis unavailable")
        }
    }

    #[derive(Default)]
    struct ErrorLog(Mutex<Vec<String>>);

    #[async_trait]
    impl Notifier for ErrorLog {
        async fn send_signal(&self, _signal: &TradeSignal) {}
        async fn send_portfolio_update(&self, _snapshot: &PortfolioSnapshot) {}
        async fn send_error(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn config(cash: Decimal) -> TraderConfig {
        TraderConfig {
            initial_cash: cash,
            ..TraderConfig::default()
        }
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn phases_follow_the_trading_window() {
        let executor = TradeExecutor::new(Arc::new(FixedPrice(dec!(1))));
        let trader = AutoTrader::new(config(dec!(1)), executor, StaticSource(DecisionBatch::new()));

        assert_eq!(trader.phase(time(8, 0)), SessionPhase::PreOpen);
        assert_eq!(trader.phase(time(9, 30)), SessionPhase::Open);
        assert_eq!(trader.phase(time(16, 0)), SessionPhase::Open);
        assert_eq!(trader.phase(time(16, 1)), SessionPhase::AfterClose);
    }

    #[tokio::test]
    async fn cycle_applies_decisions_to_the_owned_portfolio() {
        let batch: DecisionBatch = [
            ("AAPL", Decision::new(Action::Buy, 10, 80.0, "")),
            ("MSFT", Decision::hold()),
        ]
        .into_iter()
        .collect();
        let executor = TradeExecutor::new(Arc::new(FixedPrice(dec!(100))));
        let mut trader = AutoTrader::new(config(dec!(10000)), executor, StaticSource(batch));

        let signals = trader.run_trading_cycle().await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(trader.portfolio().cash, dec!(9000));

        // State carries over between cycles.
        trader.run_trading_cycle().await.unwrap();
        assert_eq!(trader.portfolio().position("AAPL").unwrap().shares, 20);
    }

    #[tokio::test]
    async fn unchanged_decision_file_applies_once_across_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.json");
        std::fs::write(&path, r#"{"decisions": {"AAPL": {"action": "buy", "quantity": 10}}}"#).unwrap();
        let executor = TradeExecutor::new(Arc::new(FixedPrice(dec!(100))));
        let mut trader =
            AutoTrader::new(config(dec!(10000)), executor, JsonFileDecisionSource::new(&path));

        assert_eq!(trader.run_trading_cycle().await.unwrap().len(), 1);
        assert!(trader.run_trading_cycle().await.unwrap().is_empty());
        assert_eq!(trader.portfolio().position("AAPL").unwrap().shares, 10);
        assert_eq!(trader.portfolio().cash, dec!(9000));

        std::fs::write(&path, r#"{"decisions": {"AAPL": {"action": "sell", "quantity": 4}}}"#).unwrap();
        trader.run_trading_cycle().await.unwrap();
        assert_eq!(trader.portfolio().position("AAPL").unwrap().shares, 6);
    }

    #[tokio::test]
    async fn cycle_failures_are_reported_and_returned() {
        let notifier = Arc::new(ErrorLog::default());
        let executor = TradeExecutor::new(Arc::new(FixedPrice(dec!(100)))).with_notifier(notifier.clone());
        let mut trader = AutoTrader::new(config(dec!(10000)), executor, FailingSource);

        assert!(trader.run_trading_cycle().await.is_err());
        let errors = notifier.0.lock().unwrap().clone();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error in trading cycle: failed to load decisions"));
        assert!(errors[0].contains("analysis unavailable"));
    }

    #[tokio::test]
    async fn rejected_order_is_reported_by_executor_and_cycle() {
        let batch: DecisionBatch = [("AAPL", Decision::new(Action::Sell, 5, 50.0, ""))]
            .into_iter()
            .collect();
        let notifier = Arc::new(ErrorLog::default());
        let executor = TradeExecutor::new(Arc::new(FixedPrice(dec!(100)))).with_notifier(notifier.clone());
        let mut trader = AutoTrader::new(config(dec!(10000)), executor, StaticSource(batch));

        assert!(trader.run_trading_cycle().await.is_err());
        let errors = notifier.0.lock().unwrap().clone();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("error executing sell order for AAPL"));
        assert!(errors[1].starts_with("Error in trading cycle: error executing sell order for AAPL"));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let executor = TradeExecutor::new(Arc::new(FixedPrice(dec!(1))));
        let mut trader = AutoTrader::new(config(dec!(1)), executor, StaticSource(DecisionBatch::new()));
        trader.run(std::future::ready(())).await;
    }
}
