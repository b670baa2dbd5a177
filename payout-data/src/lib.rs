//! File-facing side of the payout engine: transaction CSVs, TOML settings,
//! and logging setup for the `payout-calc` binary.

pub mod config;
pub mod loader;
pub mod logging;

pub use config::{ConfigLoadError, PayoutSettings};
pub use loader::{TransactionLoadError, TransactionLoader, TransactionRecord};
pub use logging::init_logging;
