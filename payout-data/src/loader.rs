//! CSV reading and writing of brokerage transactions.
//!
//! ## CSV Format
//!
//! Headers are matched by name; column order does not matter. The same
//! layout is used for input and output, so a file written after a
//! `breakdown` run can be fed back in and its stored breakdowns are read
//! rather than recomputed.
//!
//! | Column             | Required | Notes |
//! |--------------------|----------|-------|
//! | `id`               | yes      | |
//! | `gross_amount`     | yes      | Registrar text accepted, e.g. `₹1,23,456.78` |
//! | `trade_date`       | no       | `YYYY-MM-DD`, `DD-MM-YYYY` or `DD/MM/YYYY` |
//! | `registrar`        | no       | |
//! | `client_code`      | no       | |
//! | `mapped_client_id` | no       | Empty means unmapped |
//! | `status`           | no       | `PENDING` (default) or `VALIDATED` |
//! | `expense_amount`   | no       | Stored breakdown, all-or-nothing with the columns below |
//! | `net_pool`         | no       | |
//! | `level_1`..`level_6` | no     | |
//!
//! ### Minimal example
//!
//! ```csv
//! id,gross_amount,mapped_client_id
//! T-1,1000.00,C-17
//! ```

use std::io::{Read, Write};

use chrono::NaiveDate;
use payout_core::money::parse_amount;
use payout_core::{
    BrokerageTransaction, HierarchyLevel, LevelPayouts, PayoutBreakdown, PayoutError,
    TransactionStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Errors that can occur while reading or writing transaction files.
///
/// `row` is the 1-based data row (the header is row 0).
#[derive(Debug, Error)]
pub enum TransactionLoadError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {source}")]
    InvalidAmount {
        row: usize,
        #[source]
        source: PayoutError,
    },

    #[error("row {row}: unrecognised trade date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: unrecognised status '{value}'")]
    InvalidStatus { row: usize, value: String },

    #[error("row {row}: stored breakdown is missing column '{column}'")]
    IncompleteBreakdown { row: usize, column: &'static str },

    #[error("row {row}: {source}")]
    CorruptBreakdown {
        row: usize,
        #[source]
        source: PayoutError,
    },
}

/// A single row of a transactions CSV file, mirroring the layout exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    #[serde(default)]
    pub trade_date: Option<String>,
    #[serde(default)]
    pub registrar: Option<String>,
    #[serde(default)]
    pub client_code: Option<String>,
    pub gross_amount: String,
    #[serde(default)]
    pub mapped_client_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_breakdown_amount")]
    pub expense_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_breakdown_amount")]
    pub net_pool: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_breakdown_amount")]
    pub level_1: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_breakdown_amount")]
    pub level_2: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_breakdown_amount")]
    pub level_3: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_breakdown_amount")]
    pub level_4: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_breakdown_amount")]
    pub level_5: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_breakdown_amount")]
    pub level_6: Option<Decimal>,
}

// Breakdown columns are read as text so csv never routes them through f64;
// long amounts must read back exactly as they were written.
fn deserialize_breakdown_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match non_empty(raw) {
        Some(value) => value
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_trade_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

impl TransactionRecord {
    fn breakdown_columns(&self) -> [(&'static str, Option<Decimal>); 8] {
        [
            ("expense_amount", self.expense_amount),
            ("net_pool", self.net_pool),
            ("level_1", self.level_1),
            ("level_2", self.level_2),
            ("level_3", self.level_3),
            ("level_4", self.level_4),
            ("level_5", self.level_5),
            ("level_6", self.level_6),
        ]
    }

    fn stored_breakdown(
        &self,
        gross: Decimal,
        row: usize,
    ) -> Result<Option<PayoutBreakdown>, TransactionLoadError> {
        let columns = self.breakdown_columns();
        if columns.iter().all(|(_, value)| value.is_none()) {
            return Ok(None);
        }

        let mut values = [Decimal::ZERO; 8];
        for (slot, (column, value)) in values.iter_mut().zip(columns) {
            *slot = value.ok_or(TransactionLoadError::IncompleteBreakdown { row, column })?;
        }
        let [expense_amount, net_pool, l1, l2, l3, l4, l5, l6] = values;

        let breakdown = PayoutBreakdown::new(
            gross,
            expense_amount,
            net_pool,
            LevelPayouts::new([l1, l2, l3, l4, l5, l6]),
        );
        breakdown
            .verify()
            .map_err(|source| TransactionLoadError::CorruptBreakdown { row, source })?;
        Ok(Some(breakdown))
    }

    /// Converts the raw row into a transaction. `row` is used for errors only.
    ///
    /// # Errors
    ///
    /// See [`TransactionLoadError`].
    pub fn into_transaction(
        self,
        row: usize,
    ) -> Result<BrokerageTransaction, TransactionLoadError> {
        let gross_amount = parse_amount(&self.gross_amount)
            .map_err(|source| TransactionLoadError::InvalidAmount { row, source })?;

        let trade_date = match non_empty(self.trade_date.clone()) {
            Some(value) => Some(
                parse_trade_date(&value)
                    .ok_or(TransactionLoadError::InvalidDate { row, value })?,
            ),
            None => None,
        };

        let status = match non_empty(self.status.clone()) {
            Some(value) => TransactionStatus::parse(&value)
                .ok_or(TransactionLoadError::InvalidStatus { row, value })?,
            None => TransactionStatus::Pending,
        };

        let breakdown = self.stored_breakdown(gross_amount, row)?;

        Ok(BrokerageTransaction {
            id: self.id.trim().to_string(),
            trade_date,
            registrar: non_empty(self.registrar),
            client_code: non_empty(self.client_code),
            gross_amount,
            mapped_client_id: non_empty(self.mapped_client_id),
            status,
            breakdown,
        })
    }
}

impl From<&BrokerageTransaction> for TransactionRecord {
    fn from(tx: &BrokerageTransaction) -> Self {
        let breakdown = tx.breakdown.as_ref();
        let level = |index: i64| {
            let level = HierarchyLevel::new(index).ok()?;
            breakdown.map(|b| b.level_payouts.get(level))
        };
        Self {
            id: tx.id.clone(),
            trade_date: tx.trade_date.map(|d| d.format("%Y-%m-%d").to_string()),
            registrar: tx.registrar.clone(),
            client_code: tx.client_code.clone(),
            gross_amount: tx.gross_amount.to_string(),
            mapped_client_id: tx.mapped_client_id.clone(),
            status: Some(tx.status.as_str().to_string()),
            expense_amount: breakdown.map(|b| b.expense_amount),
            net_pool: breakdown.map(|b| b.net_pool),
            level_1: level(1),
            level_2: level(2),
            level_3: level(3),
            level_4: level(4),
            level_5: level(5),
            level_6: level(6),
        }
    }
}

/// Reads and writes transaction CSV files.
pub struct TransactionLoader;

impl TransactionLoader {
    /// Parses transactions from a CSV reader, in file order.
    ///
    /// Stored breakdown columns, when present, are checked with
    /// [`PayoutBreakdown::verify`].
    ///
    /// # Errors
    ///
    /// Returns the first [`TransactionLoadError`] encountered.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BrokerageTransaction>, TransactionLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut transactions = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: TransactionRecord = result?;
            transactions.push(record.into_transaction(index + 1)?);
        }

        debug!(count = transactions.len(), "Parsed transactions");
        Ok(transactions)
    }

    /// Writes transactions, including any attached breakdown, as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionLoadError::Csv`] if writing fails.
    pub fn write<W: Write>(
        writer: W,
        transactions: &[BrokerageTransaction],
    ) -> Result<(), TransactionLoadError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for tx in transactions {
            csv_writer.serialize(TransactionRecord::from(tx))?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use payout_core::{PayoutCalculator, SharingConfig};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = "\
id,trade_date,registrar,client_code,gross_amount,mapped_client_id,status
T-1,2025-04-02,CAMS,AB123,\"₹1,000.00\",C-1,
T-2,15/04/2025,KFin,,250.5,,PENDING
T-3,,,,0,C-2,validated
";

    #[test]
    fn parse_reads_all_rows() {
        let transactions = TransactionLoader::parse(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(transactions.len(), 3);
    }

    #[test]
    fn parse_converts_fields() {
        let transactions = TransactionLoader::parse(TEST_CSV.as_bytes()).unwrap();
        let first = &transactions[0];

        assert_eq!(first.id, "T-1");
        assert_eq!(first.trade_date, NaiveDate::from_ymd_opt(2025, 4, 2));
        assert_eq!(first.registrar.as_deref(), Some("CAMS"));
        assert_eq!(first.gross_amount, dec!(1000.00));
        assert_eq!(first.mapped_client_id.as_deref(), Some("C-1"));
        assert_eq!(first.status, TransactionStatus::Pending);
        assert!(first.breakdown.is_none());
    }

    #[test]
    fn parse_handles_day_first_dates_and_blanks() {
        let transactions = TransactionLoader::parse(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(transactions[1].trade_date, NaiveDate::from_ymd_opt(2025, 4, 15));
        assert!(transactions[1].client_code.is_none());
        assert!(transactions[1].mapped_client_id.is_none());
        assert!(transactions[2].trade_date.is_none());
        assert_eq!(transactions[2].status, TransactionStatus::Validated);
    }

    #[test]
    fn parse_rejects_bad_amount_with_row_number() {
        let csv = "id,gross_amount\nT-1,10\nT-2,ten\n";

        let err = TransactionLoader::parse(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            TransactionLoadError::InvalidAmount { row: 2, source: PayoutError::InvalidAmount(_) }
        ));
    }

    #[test]
    fn parse_rejects_bad_date() {
        let csv = "id,gross_amount,trade_date\nT-1,10,April 2nd\n";

        let err = TransactionLoader::parse(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            TransactionLoadError::InvalidDate { row: 1, ref value } if value == "April 2nd"
        ));
    }

    #[test]
    fn parse_rejects_bad_status() {
        let csv = "id,gross_amount,status\nT-1,10,PAID\n";

        let err = TransactionLoader::parse(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, TransactionLoadError::InvalidStatus { row: 1, .. }));
    }

    #[test]
    fn parse_reads_stored_breakdown() {
        let csv = "\
id,gross_amount,mapped_client_id,status,expense_amount,net_pool,level_1,level_2,level_3,level_4,level_5,level_6
T-1,1000,C-1,VALIDATED,150.00,850.00,297.50,127.50,127.50,127.50,127.50,42.50
";

        let transactions = TransactionLoader::parse(csv.as_bytes()).unwrap();
        let breakdown = transactions[0].breakdown.as_ref().unwrap();

        assert_eq!(breakdown.net_pool, dec!(850.00));
        assert_eq!(
            breakdown.level_payouts.get(HierarchyLevel::CORPORATE_HOUSE),
            dec!(297.50)
        );
    }

    #[test]
    fn parse_rejects_partial_breakdown() {
        let csv = "id,gross_amount,expense_amount,net_pool\nT-1,1000,150.00,850.00\n";

        let err = TransactionLoader::parse(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            TransactionLoadError::IncompleteBreakdown { row: 1, column: "level_1" }
        ));
    }

    #[test]
    fn parse_rejects_breakdown_that_does_not_sum() {
        let csv = "\
id,gross_amount,expense_amount,net_pool,level_1,level_2,level_3,level_4,level_5,level_6
T-1,1000,150.00,850.00,300.00,127.50,127.50,127.50,127.50,42.50
";

        let err = TransactionLoader::parse(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            TransactionLoadError::CorruptBreakdown {
                row: 1,
                source: PayoutError::CorruptBreakdown { .. }
            }
        ));
    }

    #[test]
    fn parse_reports_overflowing_breakdown_as_corrupt() {
        let csv = "\
id,gross_amount,expense_amount,net_pool,level_1,level_2,level_3,level_4,level_5,level_6
T-1,1000,150.00,850.00,50000000000000000000000000000,50000000000000000000000000000,0,0,0,0
";

        let err = TransactionLoader::parse(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            TransactionLoadError::CorruptBreakdown {
                row: 1,
                source: PayoutError::PayoutTotalOverflow { .. }
            }
        ));
    }

    #[test]
    fn long_amounts_read_back_exactly() {
        let calculator = PayoutCalculator::new(SharingConfig::system_default());
        let mut tx = BrokerageTransaction::new("T-7", dec!(123456789012345.67));
        tx.mapped_client_id = Some("C-7".to_string());
        let processed = calculator.compute_for_batch(&[tx]).unwrap();
        let mut out = Vec::new();

        TransactionLoader::write(&mut out, &processed).unwrap();
        let reread = TransactionLoader::parse(out.as_slice()).unwrap();

        assert_eq!(reread, processed);
        let breakdown = reread[0].breakdown.as_ref().unwrap();
        assert_eq!(breakdown.net_pool, dec!(104938270660493.82));
    }

    #[test]
    fn write_emits_breakdown_columns() {
        let mut tx = BrokerageTransaction::new("T-9", dec!(1000));
        tx.mapped_client_id = Some("C-9".to_string());
        tx.status = TransactionStatus::Validated;
        tx.breakdown = Some(PayoutBreakdown::new(
            dec!(1000),
            dec!(150.00),
            dec!(850.00),
            LevelPayouts::new([
                dec!(297.50),
                dec!(127.50),
                dec!(127.50),
                dec!(127.50),
                dec!(127.50),
                dec!(42.50),
            ]),
        ));
        let mut out = Vec::new();

        TransactionLoader::write(&mut out, &[tx]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some(
                "id,trade_date,registrar,client_code,gross_amount,mapped_client_id,status,\
                 expense_amount,net_pool,level_1,level_2,level_3,level_4,level_5,level_6"
            )
        );
        assert_eq!(
            lines.next(),
            Some("T-9,,,,1000,C-9,VALIDATED,150.00,850.00,297.50,127.50,127.50,127.50,127.50,42.50")
        );
    }
}
