use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{Config, LogFormat, LoggingConfig, QuotesConfig, TelegramConfig, TraderConfig};

/// Prefix for environment overrides, e.g. `AUTOTRADER__TRADER__INITIAL_CASH=50000`.
pub const ENV_PREFIX: &str = "AUTOTRADER";

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file at `path`
/// (optional), `AUTOTRADER__*` environment variables, and finally the
/// `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID` variables. The result is validated
/// before it is returned.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("trader.tickers")
                .try_parsing(true),
        )
        .set_override_option("telegram.token", std::env::var("TELEGRAM_BOT_TOKEN").ok())?
        .set_override_option("telegram.chat_id", std::env::var("TELEGRAM_CHAT_ID").ok())?
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
