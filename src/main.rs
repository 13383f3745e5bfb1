use alerter::{LogNotifier, Notifier, TelegramAlerter};
use anyhow::Context;
use api_client::YahooQuoteClient;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use configuration::{Config, LogFormat};
use decisions::{DecisionSource, JsonFileDecisionSource};
use executor::{Portfolio, TradeExecutor};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use trader::AutoTrader;

mod decisions;
mod trader;

/// The main entry point for the automated trading application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Telegram credentials usually live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _log_guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Run(args) => handle_run(args, config).await,
        Commands::Execute(args) => handle_execute(args, config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Applies trading decisions to an in-memory portfolio during market hours.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the console log format from the configuration.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run trading cycles during market hours until interrupted.
    Run(RunArgs),
    /// Apply a single decision batch immediately and print the resulting portfolio.
    Execute(ExecuteArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// The JSON file the analysis step writes its decisions to.
    #[arg(long, default_value = "decisions.json")]
    decisions: PathBuf,
}

#[derive(Parser)]
struct ExecuteArgs {
    /// The JSON decision batch to apply.
    #[arg(long)]
    decisions: PathBuf,

    /// Starting cash. Defaults to `trader.initial_cash`.
    #[arg(long)]
    cash: Option<Decimal>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn telegram_notifier(config: &Config) -> Option<Arc<dyn Notifier>> {
    TelegramAlerter::new(&config.telegram).map(|alerter| Arc::new(alerter) as Arc<dyn Notifier>)
}

/// Runs the trading loop until Ctrl-C.
async fn handle_run(args: RunArgs, config: Config) -> anyhow::Result<()> {
    let prices = YahooQuoteClient::new(&config.quotes).context("failed to build quote client")?;
    let executor = TradeExecutor::new(Arc::new(prices)).with_optional_notifier(telegram_notifier(&config));
    let source = JsonFileDecisionSource::new(args.decisions);

    let mut trader = AutoTrader::new(config.trader, executor, source);
    trader
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    print_portfolio(trader.portfolio());
    Ok(())
}

/// Applies one batch and prints the resulting portfolio, even when an order fails.
async fn handle_execute(args: ExecuteArgs, config: Config) -> anyhow::Result<()> {
    let prices = YahooQuoteClient::new(&config.quotes).context("failed to build quote client")?;
    let notifier = telegram_notifier(&config).unwrap_or_else(|| Arc::new(LogNotifier) as Arc<dyn Notifier>);
    let executor = TradeExecutor::new(Arc::new(prices)).with_notifier(notifier);

    let batch = JsonFileDecisionSource::new(&args.decisions)
        .decisions(&config.trader.tickers)
        .await?;
    if batch.is_empty() {
        anyhow::bail!("{} holds no decisions for the configured tickers", args.decisions.display());
    }

    let mut portfolio = Portfolio::new(args.cash.unwrap_or(config.trader.initial_cash));
    let outcome = executor.execute_portfolio_decisions(&mut portfolio, &batch).await;

    print_portfolio(&portfolio);
    let signals = outcome?;
    println!("{} order(s) applied.", signals.len());
    Ok(())
}

fn print_portfolio(portfolio: &Portfolio) {
    let snapshot = portfolio.snapshot();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Ticker", "Shares", "Avg Price"]);
    for position in &snapshot.positions {
        table.add_row(vec![
            position.ticker.clone(),
            position.shares.to_string(),
            format!("{:.2}", position.avg_price),
        ]);
    }

    println!("Cash: {:.2}", snapshot.cash);
    println!("{table}");
}
