use crate::enums::Action;
use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One instrument's requested action for a trading cycle.
///
/// `confidence` and `reasoning` are carried through to notifications only;
/// they never influence execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl Decision {
    pub fn new(action: Action, quantity: u32, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            action,
            quantity,
            confidence,
            reasoning: reasoning.into(),
        }
    }

    pub fn hold() -> Self {
        Self::new(Action::Hold, 0, 0.0, "")
    }
}

/// An ordered batch of decisions, one per ticker.
///
/// Entry order is execution order. When read from a JSON object the document
/// order of the keys is kept, which a plain `HashMap` would lose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionBatch {
    entries: Vec<(String, Decision)>,
}

impl DecisionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decision. A repeated ticker replaces the earlier decision in place,
    /// matching how a JSON object with a duplicate key is usually read.
    pub fn push(&mut self, ticker: impl Into<String>, decision: Decision) {
        let ticker = ticker.into();
        match self.entries.iter_mut().find(|(t, _)| *t == ticker) {
            Some(entry) => entry.1 = decision,
            None => self.entries.push((ticker, decision)),
        }
    }

    pub fn get(&self, ticker: &str) -> Option<&Decision> {
        self.entries.iter().find(|(t, _)| t == ticker).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Decision)> {
        self.entries.iter().map(|(t, d)| (t.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only the entries whose ticker satisfies `keep`, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(t, _)| keep(t));
    }
}

impl<T: Into<String>> FromIterator<(T, Decision)> for DecisionBatch {
    fn from_iter<I: IntoIterator<Item = (T, Decision)>>(iter: I) -> Self {
        let mut batch = DecisionBatch::new();
        for (ticker, decision) in iter {
            batch.push(ticker, decision);
        }
        batch
    }
}

impl Serialize for DecisionBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (ticker, decision) in &self.entries {
            map.serialize_entry(ticker, decision)?;
        }
        map.end()
    }
}

struct DecisionBatchVisitor;

impl<'de> Visitor<'de> for DecisionBatchVisitor {
    type Value = DecisionBatch;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of ticker to decision")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut batch = DecisionBatch::new();
        while let Some((ticker, decision)) = access.next_entry::<String, Decision>()? {
            batch.push(ticker, decision);
        }
        Ok(batch)
    }
}

impl<'de> Deserialize<'de> for DecisionBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DecisionBatchVisitor)
    }
}

/// A holding in a single instrument.
///
/// Positive `shares` is a long holding, negative is a short. For longs
/// `avg_price` is the quantity-weighted cost basis; for shorts it is the
/// price of the most recent short order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub shares: i64,
    pub avg_price: Decimal,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.shares > 0
    }

    pub fn is_short(&self) -> bool {
        self.shares < 0
    }
}

/// A position as it appears in a portfolio snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionSnapshot {
    pub ticker: String,
    pub shares: i64,
    pub avg_price: Decimal,
}

/// A point-in-time copy of the portfolio handed to notifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioSnapshot {
    pub cash: Decimal,
    /// Sorted by ticker.
    pub positions: Vec<PositionSnapshot>,
    pub margin_reserved: Decimal,
}

/// The record of a successfully applied order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSignal {
    pub ticker: String,
    pub action: Action,
    pub quantity: u32,
    pub price: Decimal,
    pub confidence: f64,
    pub reasoning: String,
}
