use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::PayoutBreakdown;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Validated,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Validated => "VALIDATED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "VALIDATED" => Some(Self::Validated),
            _ => None,
        }
    }
}

/// One imported brokerage line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerageTransaction {
    pub id: String,
    pub trade_date: Option<NaiveDate>,
    pub registrar: Option<String>,

    /// Client identifier as it appears in the registrar file.
    pub client_code: Option<String>,

    pub gross_amount: Decimal,

    /// Client this line was mapped to. Unmapped lines are excluded from
    /// payout accounting.
    pub mapped_client_id: Option<String>,

    #[serde(default)]
    pub status: TransactionStatus,

    #[serde(default)]
    pub breakdown: Option<PayoutBreakdown>,
}

impl BrokerageTransaction {
    pub fn new(
        id: impl Into<String>,
        gross_amount: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            trade_date: None,
            registrar: None,
            client_code: None,
            gross_amount,
            mapped_client_id: None,
            status: TransactionStatus::Pending,
            breakdown: None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped_client_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [TransactionStatus::Pending, TransactionStatus::Validated] {
            assert_eq!(TransactionStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(
            TransactionStatus::parse(" validated "),
            Some(TransactionStatus::Validated)
        );
        assert_eq!(TransactionStatus::parse("PAID"), None);
    }

    #[test]
    fn new_transaction_is_pending_and_unmapped() {
        let tx = BrokerageTransaction::new("T-1", dec!(250.00));

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(!tx.is_mapped());
        assert!(tx.breakdown.is_none());
    }
}
