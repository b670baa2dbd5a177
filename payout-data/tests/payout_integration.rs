//! End-to-end runs over the on-disk fixtures: settings from TOML,
//! transactions from CSV, breakdowns written back out and re-read.

use std::fs::File;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use payout_core::{
    BrokerageTransaction, HierarchyLevel, MemberStatement, PayoutCalculator, StatementPeriod,
    TransactionStatus,
};
use payout_data::{PayoutSettings, TransactionLoader};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_settings() -> PayoutSettings {
    PayoutSettings::load(&fixture("sharing.toml")).expect("fixture settings should load")
}

fn load_transactions() -> Vec<BrokerageTransaction> {
    let file = File::open(fixture("transactions_2025_04.csv")).unwrap();
    TransactionLoader::parse(file).expect("fixture transactions should parse")
}

fn april() -> StatementPeriod {
    StatementPeriod::new(2025, 4).unwrap()
}

// ============================================================================
// Fixtures
// ============================================================================

#[test]
fn fixture_settings_are_valid() {
    let settings = load_settings();

    assert_eq!(settings.validate().map_err(|e| e.to_string()), Ok(()));
    assert_eq!(settings.members.len(), 3);
    assert_eq!(settings.sharing.company_expense_pct, dec!(15));
}

#[test]
fn fixture_transactions_parse() {
    let transactions = load_transactions();

    assert_eq!(transactions.len(), 4);
    assert_eq!(transactions[0].gross_amount, dec!(1000.00));
    assert!(!transactions[2].is_mapped());
    assert!(transactions.iter().all(|tx| tx.breakdown.is_none()));
}

// ============================================================================
// Batch breakdowns
// ============================================================================

#[test]
fn batch_splits_mapped_transactions() {
    let calculator = PayoutCalculator::new(load_settings().sharing);

    let processed = calculator.compute_for_batch(&load_transactions()).unwrap();

    let first = processed[0].breakdown.as_ref().unwrap();
    assert_eq!(first.expense_amount, dec!(150.00));
    assert_eq!(first.net_pool, dec!(850.00));
    assert_eq!(first.level_payouts.get(HierarchyLevel::CORPORATE_HOUSE), dec!(297.50));
    assert_eq!(first.level_payouts.get(HierarchyLevel::FRONT_LINE), dec!(42.50));

    let second = processed[1].breakdown.as_ref().unwrap();
    assert_eq!(second.expense_amount, dec!(185.18));
    assert_eq!(second.net_pool, dec!(1049.38));
    for index in 2..=5 {
        let level = HierarchyLevel::new(index).unwrap();
        assert_eq!(second.level_payouts.get(level), dec!(157.40));
    }
    assert_eq!(second.level_payouts.get(HierarchyLevel::FRONT_LINE), dec!(52.46));
    assert_eq!(second.level_payouts.get(HierarchyLevel::CORPORATE_HOUSE), dec!(367.32));

    assert_eq!(processed[0].status, TransactionStatus::Validated);
    assert_eq!(processed[2].status, TransactionStatus::Pending);
    assert!(processed[2].breakdown.is_none());
}

#[test]
fn written_breakdowns_read_back_as_stored() {
    let calculator = PayoutCalculator::new(load_settings().sharing);
    let processed = calculator.compute_for_batch(&load_transactions()).unwrap();
    let mut out = Vec::new();

    TransactionLoader::write(&mut out, &processed).unwrap();
    let reread = TransactionLoader::parse(out.as_slice()).unwrap();

    assert_eq!(reread, processed);
}

#[test]
fn backfill_keeps_breakdowns_computed_under_old_config() {
    let mut settings = load_settings();
    let processed = PayoutCalculator::new(settings.sharing.clone())
        .compute_for_batch(&load_transactions())
        .unwrap();

    settings.sharing.company_expense_pct = dec!(20);
    let backfilled = PayoutCalculator::new(settings.sharing)
        .backfill_breakdowns(&processed)
        .unwrap();

    assert_eq!(backfilled, processed);
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn statement_from_stored_breakdowns() {
    let settings = load_settings();
    let calculator = PayoutCalculator::new(settings.sharing.clone());
    let processed = calculator.compute_for_batch(&load_transactions()).unwrap();
    let asha = settings.member("M001").unwrap();

    let statement = MemberStatement::build(&calculator, asha, &processed, april()).unwrap();

    // T-1004 is dated May; T-1003 is unmapped.
    assert_eq!(statement.lines.len(), 2);
    assert_eq!(statement.stored_lines(), 2);
    assert_eq!(statement.skipped_unmapped, 1);
    assert_eq!(statement.total_share, dec!(94.96));
}

#[test]
fn statement_estimates_differ_from_stored_by_rounding() {
    let settings = load_settings();
    let calculator = PayoutCalculator::new(settings.sharing.clone());
    let asha = settings.member("M001").unwrap();

    let statement =
        MemberStatement::build(&calculator, asha, &load_transactions(), april()).unwrap();

    // 42.50 + 52.4688 before rounding; the floored stored path gives 94.96.
    assert_eq!(statement.estimated_lines(), 2);
    assert_eq!(statement.total_share, dec!(94.97));
}

#[test]
fn override_applies_to_estimates_but_not_stored_batch() {
    let settings = load_settings();
    let calculator = PayoutCalculator::new(settings.sharing.clone());
    let meera = settings.member("M003").unwrap();
    let raw = load_transactions();
    let processed = calculator.compute_for_batch(&raw).unwrap();

    let estimated = MemberStatement::build(&calculator, meera, &raw, april()).unwrap();
    let stored = MemberStatement::build(&calculator, meera, &processed, april()).unwrap();

    // 1000 x 0.85 x 60% + 1234.56 x 0.85 x 60%
    assert_eq!(estimated.total_share, dec!(1139.63));
    // Batch breakdowns use the global 15% for level 4.
    assert_eq!(stored.total_share, dec!(284.90));
}

#[test]
fn corporate_house_statement_collects_remainders() {
    let settings = load_settings();
    let calculator = PayoutCalculator::new(settings.sharing.clone());
    let processed = calculator.compute_for_batch(&load_transactions()).unwrap();
    let ravi = settings.member("M002").unwrap();

    let statement = MemberStatement::build(&calculator, ravi, &processed, april()).unwrap();

    assert_eq!(statement.total_share, dec!(664.82));
}

// ============================================================================
// Simulation
// ============================================================================

#[test]
fn simulation_with_member_override() {
    let settings = load_settings();
    let calculator = PayoutCalculator::new(settings.sharing.clone());
    let meera = settings.member("M003").unwrap();

    let simulation = calculator.simulate(dec!(1000), Some(meera)).unwrap();
    let payouts = &simulation.breakdown.level_payouts;

    assert_eq!(payouts.get(HierarchyLevel::new(4).unwrap()), dec!(510.00));
    assert_eq!(payouts.get(HierarchyLevel::CORPORATE_HOUSE), dec!(340.00));
    assert_eq!(payouts.get(HierarchyLevel::FRONT_LINE), dec!(0));
    assert_eq!(simulation.unassigned_pct, dec!(0));
    assert_eq!(simulation.rows[0].payout, None);
}
