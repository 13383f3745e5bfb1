use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The action requested for a single instrument in a trading cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Action {
    /// Open or add to a long position.
    Buy,
    /// Reduce or close a long position.
    Sell,
    /// Open or add to a short position.
    Short,
    /// Reduce or close a short position.
    Cover,
    /// Do nothing this cycle.
    Hold,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
            Action::Short => "short",
            Action::Cover => "cover",
            Action::Hold => "hold",
        }
    }

    /// Returns `true` for every action that touches the portfolio.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Action::Hold)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Action::Buy),
            "sell" => Ok(Action::Sell),
            "short" => Ok(Action::Short),
            "cover" => Ok(Action::Cover),
            "hold" => Ok(Action::Hold),
            other => Err(CoreError::InvalidInput("action".to_string(), other.to_string())),
        }
    }
}

impl TryFrom<String> for Action {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
