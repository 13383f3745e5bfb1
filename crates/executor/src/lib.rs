//! # Executor Crate
//!
//! This crate provides the order-execution and portfolio-accounting engine. It turns
//! buy, sell, short, cover and hold decisions into mutations of an in-memory
//! `Portfolio`, subject to cash, margin and holdings checks.
//!
//! ## Architectural Principles
//!
//! - **Validate, then mutate, then notify:** `Portfolio::apply` checks every
//!   precondition before its first write, and `TradeExecutor` only reports a fill
//!   after the mutation has happened.
//! - **Capabilities at the seams:** prices come from an `api_client::PriceSource`
//!   and reports go to an optional `alerter::Notifier`; both are trait objects so
//!   tests and the live binary plug in different implementations.
//! - **Sequential batches:** a batch is applied strictly in order and stops at the
//!   first rejected order. Nothing is rolled back.
//!
//! ## Public API
//!
//! - `TradeExecutor`: executes single orders and ordered batches.
//! - `Portfolio`: the in-memory state of the trading account.
//! - `OrderRejection` / `ExecutorError`: why an order was refused.

// Declare the modules that constitute this crate.
pub mod error;
pub mod portfolio;
pub mod trade_executor;

// Re-export the key components to provide a clean, public-facing API.
pub use error::{ExecutorError, OrderRejection};
pub use portfolio::{Portfolio, SHORT_MARGIN_RATIO};
pub use trade_executor::TradeExecutor;
