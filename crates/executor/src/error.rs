use core_types::Action;
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a single order was refused. Every variant is detected before the
/// portfolio is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderRejection {
    #[error("Could not get current price for {ticker}: {reason}")]
    PriceUnavailable { ticker: String, reason: String },

    #[error("Insufficient cash for buy order: ${required:.2} > ${available:.2}")]
    InsufficientCash { required: Decimal, available: Decimal },

    #[error("Insufficient shares for sell order: {requested} > {held}")]
    InsufficientShares { requested: u32, held: i64 },

    #[error("Insufficient margin for short order: ${required:.2} > ${available:.2}")]
    InsufficientMargin { required: Decimal, available: Decimal },

    #[error("Insufficient short position for cover order: {requested} > {held}")]
    InsufficientShortPosition { requested: u32, held: u64 },
}

/// A rejected order, with the action and instrument it was for.
///
/// The rejection is rendered inline; `source()` returns `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error executing {action} order for {ticker}: {cause}")]
pub struct ExecutorError {
    pub action: Action,
    pub ticker: String,
    pub cause: OrderRejection,
}

impl ExecutorError {
    pub fn new(action: Action, ticker: impl Into<String>, cause: OrderRejection) -> Self {
        Self {
            action,
            ticker: ticker.into(),
            cause,
        }
    }

    pub fn rejection(&self) -> &OrderRejection {
        &self.cause
    }
}
