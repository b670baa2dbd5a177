mod brokerage_transaction;
mod hierarchy_level;
mod level_map;
mod payout_breakdown;
mod sharing_config;
mod team_member;

pub use brokerage_transaction::{BrokerageTransaction, TransactionStatus};
pub use hierarchy_level::HierarchyLevel;
pub use level_map::{LevelNames, LevelPercentages};
pub use payout_breakdown::{LevelPayouts, PayoutBreakdown};
pub use sharing_config::{SharingConfig, SharingConfigError};
pub use team_member::TeamMember;
