//! Payout calculations for brokerage transactions.
//!
//! This module splits gross brokerage across the referral hierarchy, reads
//! members' shares back for reporting, and builds simulator and statement
//! views on top of those two paths.

pub mod common;
pub mod payout;
pub mod simulator;
pub mod statement;

pub use payout::{
    PayoutCalculator, ShareSource, compute_breakdown_exact, estimate_share_proportional,
};
pub use simulator::{PayoutSimulation, SimulationRow};
pub use statement::{MemberStatement, StatementLine, StatementPeriod};
