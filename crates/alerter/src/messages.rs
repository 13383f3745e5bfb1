//! Human-readable renderings of signals, snapshots and errors, in Telegram
//! MarkdownV2. Every dynamic field is escaped.

use chrono::NaiveDateTime;
use core_types::{PortfolioSnapshot, TradeSignal};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_signal(signal: &TradeSignal, at: NaiveDateTime) -> String {
    format!(
        "🔔 *Trading Signal Alert*\n\n\
         Ticker: {}\n\
         Action: {}\n\
         Quantity: {}\n\
         Price: {}\n\
         Confidence: {}\n\
         Reasoning: {}\n\
         Time: {}",
        escape_markdown(&signal.ticker),
        escape_markdown(&signal.action.as_str().to_uppercase()),
        signal.quantity,
        escape_markdown(&format!("${:.2}", signal.price)),
        escape_markdown(&format!("{:.1}%", signal.confidence)),
        escape_markdown(&signal.reasoning),
        escape_markdown(&at.format(TIME_FORMAT).to_string()),
    )
}

pub fn format_portfolio_update(snapshot: &PortfolioSnapshot, at: NaiveDateTime) -> String {
    let mut message = format!(
        "📊 *Portfolio Update*\n\nCash: {}\nPositions:\n",
        escape_markdown(&format!("${:.2}", snapshot.cash))
    );

    if snapshot.positions.is_empty() {
        message.push_str("none\n");
    }
    for position in &snapshot.positions {
        let line = format!(
            "{}: {} shares @ ${:.2}",
            position.ticker, position.shares, position.avg_price
        );
        message.push_str(&escape_markdown(&line));
        message.push('\n');
    }

    message.push_str(&format!(
        "\nLast Updated: {}",
        escape_markdown(&at.format(TIME_FORMAT).to_string())
    ));
    message
}

pub fn format_error(error_message: &str, at: NaiveDateTime) -> String {
    format!(
        "⚠️ *Error Alert*\n\nMessage: {}\nTime: {}",
        escape_markdown(error_message),
        escape_markdown(&at.format(TIME_FORMAT).to_string()),
    )
}

/// A helper function to escape characters that have special meaning in Telegram's MarkdownV2.
pub fn escape_markdown(text: &str) -> String {
    const SPECIAL_CHARS: &str = r"\_*[]()~`>#+-=|{}.!";
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL_CHARS.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{Action, PositionSnapshot};
    use rust_decimal_macros::dec;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap()
    }

    #[test]
    fn signal_message_contains_every_field() {
        let signal = TradeSignal {
            ticker: "AAPL".to_string(),
            action: Action::Buy,
            quantity: 100,
            price: dec!(150),
            confidence: 87.25,
            reasoning: "Strong earnings".to_string(),
        };

        let text = format_signal(&signal, at());
        assert!(text.contains("Ticker: AAPL"));
        assert!(text.contains("Action: BUY"));
        assert!(text.contains("Quantity: 100"));
        assert!(text.contains(r"Price: $150\.00"));
        assert!(text.contains(r"Confidence: 87\.2%") || text.contains(r"Confidence: 87\.3%"));
        assert!(text.contains("Reasoning: Strong earnings"));
        assert!(text.contains(r"Time: 2024\-03\-01 10:15:00"));
    }

    #[test]
    fn portfolio_message_lists_positions() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(85000),
            positions: vec![
                PositionSnapshot { ticker: "AAPL".to_string(), shares: 100, avg_price: dec!(150) },
                PositionSnapshot { ticker: "TSLA".to_string(), shares: -20, avg_price: dec!(201.5) },
            ],
            margin_reserved: dec!(0),
        };

        let text = format_portfolio_update(&snapshot, at());
        assert!(text.contains(r"Cash: $85000\.00"));
        assert!(text.contains(r"AAPL: 100 shares @ $150\.00"));
        assert!(text.contains(r"TSLA: \-20 shares @ $201\.50"));
    }

    #[test]
    fn empty_portfolio_says_none() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(10),
            positions: Vec::new(),
            margin_reserved: dec!(0),
        };
        assert!(format_portfolio_update(&snapshot, at()).contains("Positions:\nnone\n"));
    }

    #[test]
    fn error_message_is_escaped() {
        let text = format_error("error executing buy order for BRK.B: boom!", at());
        assert!(text.contains(r"BRK\.B: boom\!"));
    }

    #[test]
    fn escapes_markdown_specials() {
        assert_eq!(escape_markdown("a_b*c"), r"a\_b\*c");
        assert_eq!(escape_markdown("1.5 (x)"), r"1\.5 \(x\)");
        assert_eq!(escape_markdown("plain"), "plain");
    }
}
