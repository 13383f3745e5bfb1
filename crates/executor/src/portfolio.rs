use crate::error::OrderRejection;
use core_types::{Action, PortfolioSnapshot, Position, PositionSnapshot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Fraction of a short order's notional value reserved from cash when it opens.
pub const SHORT_MARGIN_RATIO: Decimal = dec!(0.5);

/// Manages the state of a trading account: cash, positions and the margin accumulator.
///
/// A position is present in `positions` only while its share count is non-zero.
/// The portfolio performs no locking; a single caller owns it for the duration
/// of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: Decimal,
    pub positions: HashMap<String, Position>,
    /// Not updated by any order transition. Short margin is taken out of `cash`.
    pub margin_reserved: Decimal,
}

impl Portfolio {
    /// Creates a new `Portfolio` with a given amount of starting cash.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            positions: HashMap::new(),
            margin_reserved: Decimal::ZERO,
        }
    }

    /// A simple utility to get a snapshot of a single position.
    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    /// Signed share count for `ticker`, zero when flat.
    pub fn shares(&self, ticker: &str) -> i64 {
        self.positions.get(ticker).map_or(0, |p| p.shares)
    }

    /// A copy of the current state with positions sorted by ticker.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        let mut positions: Vec<PositionSnapshot> = self
            .positions
            .iter()
            .map(|(ticker, p)| PositionSnapshot {
                ticker: ticker.clone(),
                shares: p.shares,
                avg_price: p.avg_price,
            })
            .collect();
        positions.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        PortfolioSnapshot {
            cash: self.cash,
            positions,
            margin_reserved: self.margin_reserved,
        }
    }

    /// Applies one order at `price`.
    ///
    /// This is the core state transition logic. Every precondition is checked
    /// and every new value is computed before the first write, so a rejected
    /// order leaves the portfolio untouched. `Hold` is a no-op.
    pub fn apply(
        &mut self,
        ticker: &str,
        action: Action,
        quantity: u32,
        price: Decimal,
    ) -> Result<(), OrderRejection> {
        if action == Action::Hold {
            return Ok(());
        }

        let qty = i64::from(quantity);
        let overflow = || OrderRejection::PriceUnavailable {
            ticker: ticker.to_string(),
            reason: format!("value of {quantity} shares at ${price} is out of range"),
        };
        let trade_value = price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(overflow)?;
        let current = self.positions.get(ticker).copied();
        let held = current.as_ref().map_or(0, |p| p.shares);

        let (cash, position) = match action {
            Action::Buy => {
                if trade_value > self.cash {
                    return Err(OrderRejection::InsufficientCash {
                        required: trade_value,
                        available: self.cash,
                    });
                }

                let mut position = current.unwrap_or_default();
                let new_shares = position.shares.checked_add(qty).ok_or_else(overflow)?;
                let total_cost = Decimal::from(position.shares)
                    .checked_mul(position.avg_price)
                    .and_then(|cost| cost.checked_add(trade_value))
                    .ok_or_else(overflow)?;
                // A buy that exactly offsets a short has no average to speak of.
                if let Some(avg_price) = total_cost.checked_div(Decimal::from(new_shares)) {
                    position.avg_price = avg_price;
                }
                position.shares = new_shares;
                (self.cash - trade_value, position)
            }
            Action::Sell => {
                let Some(mut position) = current.filter(|p| p.shares >= qty) else {
                    return Err(OrderRejection::InsufficientShares {
                        requested: quantity,
                        held,
                    });
                };

                let cash = self.cash.checked_add(trade_value).ok_or_else(overflow)?;
                position.shares -= qty;
                (cash, position)
            }
            Action::Short => {
                let margin_required = trade_value * SHORT_MARGIN_RATIO;
                if margin_required > self.cash {
                    return Err(OrderRejection::InsufficientMargin {
                        required: margin_required,
                        available: self.cash,
                    });
                }

                let mut position = current.unwrap_or_default();
                position.shares = position.shares.checked_sub(qty).ok_or_else(overflow)?;
                // The latest short price replaces the reference price outright.
                position.avg_price = price;
                (self.cash - margin_required, position)
            }
            Action::Cover => {
                let Some(mut position) = current.filter(|p| p.shares <= -qty) else {
                    return Err(OrderRejection::InsufficientShortPosition {
                        requested: quantity,
                        held: if held < 0 { held.unsigned_abs() } else { 0 },
                    });
                };

                let cash = self.cash.checked_sub(trade_value).ok_or_else(overflow)?;
                position.shares += qty;
                (cash, position)
            }
            Action::Hold => return Ok(()),
        };

        self.cash = cash;
        if position.shares == 0 {
            self.positions.remove(ticker);
        } else {
            self.positions.insert(ticker.to_string(), position);
        }
        Ok(())
    }
}
