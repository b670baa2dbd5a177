pub mod calculations;
pub mod error;
pub mod models;
pub mod money;

pub use calculations::{
    MemberStatement, PayoutCalculator, PayoutSimulation, ShareSource, SimulationRow,
    StatementLine, StatementPeriod, compute_breakdown_exact, estimate_share_proportional,
};
pub use error::PayoutError;
pub use models::*;
