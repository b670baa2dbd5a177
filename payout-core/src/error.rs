use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the payout engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayoutError {
    /// The amount is not a finite number, cannot be parsed, or overflows
    /// decimal arithmetic.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A hierarchy level index outside 0–6.
    #[error("hierarchy level must be between 0 and 6, got {0}")]
    InvalidLevel(i64),

    /// A map key that does not name a usable level.
    #[error("invalid level key '{0}'")]
    InvalidLevelKey(String),

    /// A persisted payout map lacks one of levels 1–6.
    #[error("payout for level {0} is missing")]
    MissingPayoutLevel(u8),

    /// A statement period that is not a real `YYYY-MM` month.
    #[error("invalid statement period '{0}', expected YYYY-MM")]
    InvalidPeriod(String),

    /// Stored level payouts do not add up to the stored net pool.
    #[error("corrupt breakdown: level payouts total {distributed} but net pool is {net_pool}")]
    CorruptBreakdown {
        net_pool: Decimal,
        distributed: Decimal,
    },

    /// Stored level payouts are too large to add up.
    #[error("corrupt breakdown: level payouts overflow when summed (net pool is {net_pool})")]
    PayoutTotalOverflow { net_pool: Decimal },
}
