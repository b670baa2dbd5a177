//! Payout allocation for brokerage transactions.
//!
//! A gross brokerage amount is split in four steps:
//!
//! | Step | Amount | Rule |
//! |------|--------|------|
//! | 1 | Company expense | `round(gross × expense% / 100)` |
//! | 2 | Net pool | `round(gross − expense)` |
//! | 3 | Levels 2–6, in order | `floor(net × level% / 100)` each |
//! | 4 | Level 1 | `round(net − Σ levels 2–6)` |
//!
//! Level 1 never uses its own percentage: it takes whatever levels 2–6 leave,
//! which keeps `Σ payouts == net pool` exact to the cent no matter what the
//! percentages add up to. Level 0 is not paid out at all.
//!
//! Reports read amounts through [`PayoutCalculator::user_share_of`], which
//! prefers the breakdown stored on the transaction and otherwise falls back
//! to [`estimate_share_proportional`]. The two paths can disagree for the
//! same configuration; stored amounts always win.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use payout_core::{HierarchyLevel, PayoutCalculator, SharingConfig};
//!
//! let calculator = PayoutCalculator::new(SharingConfig::system_default());
//! let breakdown = calculator.compute_breakdown(dec!(1000)).unwrap();
//!
//! assert_eq!(breakdown.expense_amount, dec!(150.00));
//! assert_eq!(breakdown.net_pool, dec!(850.00));
//! assert_eq!(breakdown.level_payouts.get(HierarchyLevel::FRONT_LINE), dec!(42.50));
//! assert_eq!(breakdown.level_payouts.get(HierarchyLevel::CORPORATE_HOUSE), dec!(297.50));
//! ```

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::{floor_cents, percent_of, round_half_up};
use crate::{
    BrokerageTransaction, HierarchyLevel, LevelPayouts, LevelPercentages, PayoutBreakdown,
    PayoutError, SharingConfig, TeamMember, TransactionStatus,
};

/// Where a member's share of a transaction was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareSource {
    /// Taken from the breakdown stored on the transaction.
    Stored,
    /// Computed on the fly because no breakdown was stored.
    Estimated,
}

fn overflow(gross: Decimal) -> PayoutError {
    PayoutError::InvalidAmount(format!("{gross} overflows payout arithmetic"))
}

/// Splits `gross` across levels 1–6 after deducting company expense.
///
/// This is the algorithm behind every stored breakdown and must stay
/// bit-for-bit stable: levels 2–6 are floored in that order and level 1
/// receives the remainder. Missing levels count as 0%. Neither the expense
/// percentage nor the level total is validated; a level total above 100
/// leaves level 1 negative.
///
/// # Errors
///
/// Returns [`PayoutError::InvalidAmount`] only if the arithmetic overflows.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use payout_core::{HierarchyLevel, LevelPercentages, compute_breakdown_exact};
///
/// let levels = LevelPercentages::from_pairs([
///     (1, dec!(1)), (2, dec!(33)), (3, dec!(33)), (4, dec!(33)),
/// ]).unwrap();
///
/// let breakdown = compute_breakdown_exact(dec!(100.01), dec!(0), &levels).unwrap();
///
/// // 33% of 100.01 is 33.0033, floored to 33.00 three times.
/// assert_eq!(breakdown.level_payouts.get(HierarchyLevel::new(2).unwrap()), dec!(33.00));
/// // Level 1 absorbs the rest rather than taking 1%.
/// assert_eq!(breakdown.level_payouts.get(HierarchyLevel::CORPORATE_HOUSE), dec!(1.01));
/// ```
pub fn compute_breakdown_exact(
    gross: Decimal,
    company_expense_pct: Decimal,
    levels: &LevelPercentages,
) -> Result<PayoutBreakdown, PayoutError> {
    let expense_amount =
        round_half_up(percent_of(gross, company_expense_pct).ok_or_else(|| overflow(gross))?);
    let net_pool = round_half_up(
        gross
            .checked_sub(expense_amount)
            .ok_or_else(|| overflow(gross))?,
    );

    if net_pool < Decimal::ZERO {
        warn!(
            gross = %gross,
            company_expense_pct = %company_expense_pct,
            net_pool = %net_pool,
            "Net pool is negative; every level payout will be zero or negative"
        );
    }

    let mut level_payouts = LevelPayouts::default();
    let mut distributed = Decimal::ZERO;

    for level in HierarchyLevel::DISTRIBUTION_ORDER {
        let amount =
            floor_cents(percent_of(net_pool, levels.pct(level)).ok_or_else(|| overflow(gross))?);
        level_payouts.set(level, amount);
        distributed = distributed
            .checked_add(amount)
            .ok_or_else(|| overflow(gross))?;
    }

    let remainder = round_half_up(
        net_pool
            .checked_sub(distributed)
            .ok_or_else(|| overflow(gross))?,
    );
    if remainder < Decimal::ZERO && net_pool >= Decimal::ZERO {
        warn!(
            net_pool = %net_pool,
            distributed = %distributed,
            remainder = %remainder,
            "Levels 2-6 exceed the net pool; corporate house remainder is negative"
        );
    }
    level_payouts.set(HierarchyLevel::CORPORATE_HOUSE, remainder);

    let breakdown = PayoutBreakdown::new(gross, expense_amount, net_pool, level_payouts);
    debug!(
        gross = %breakdown.gross,
        expense_amount = %breakdown.expense_amount,
        net_pool = %breakdown.net_pool,
        corporate_house = %remainder,
        "Computed payout breakdown"
    );
    Ok(breakdown)
}

/// Direct proportional share of `gross` at `user_pct`, with no flooring and
/// no remainder handling.
///
/// `net_pool = gross × (1 − expense% / 100)`, result `net_pool × user% / 100`.
/// The value is not rounded. It is only an estimate for transactions that
/// never had a breakdown stored and can differ from what
/// [`compute_breakdown_exact`] assigns the same level.
///
/// # Errors
///
/// Returns [`PayoutError::InvalidAmount`] only if the arithmetic overflows.
///
/// ```
/// use rust_decimal_macros::dec;
/// use payout_core::estimate_share_proportional;
///
/// let share = estimate_share_proportional(dec!(1000), dec!(15), dec!(15)).unwrap();
///
/// assert_eq!(share, dec!(127.5));
/// ```
pub fn estimate_share_proportional(
    gross: Decimal,
    company_expense_pct: Decimal,
    user_pct: Decimal,
) -> Result<Decimal, PayoutError> {
    let retained_pct = Decimal::ONE_HUNDRED
        .checked_sub(company_expense_pct)
        .ok_or_else(|| overflow(gross))?;
    let net_pool = percent_of(gross, retained_pct).ok_or_else(|| overflow(gross))?;
    percent_of(net_pool, user_pct).ok_or_else(|| overflow(gross))
}

/// Applies the global [`SharingConfig`] (and per-member overrides) to
/// brokerage transactions.
///
/// The calculator holds no mutable state and can be shared freely across
/// threads.
#[derive(Debug, Clone)]
pub struct PayoutCalculator {
    config: SharingConfig,
}

impl PayoutCalculator {
    /// Creates a calculator over the global configuration.
    ///
    /// Configurations that would not pass [`SharingConfig::validate`] are
    /// accepted and logged; the allocation rules tolerate them.
    pub fn new(config: SharingConfig) -> Self {
        if let Err(error) = config.validate() {
            warn!(%error, "Sharing configuration would not pass validation; computing literally");
        }
        Self { config }
    }

    pub fn config(&self) -> &SharingConfig {
        &self.config
    }

    /// Breakdown of `gross` under the global configuration.
    ///
    /// # Errors
    ///
    /// See [`compute_breakdown_exact`].
    pub fn compute_breakdown(
        &self,
        gross: Decimal,
    ) -> Result<PayoutBreakdown, PayoutError> {
        compute_breakdown_exact(gross, self.config.company_expense_pct, &self.config.levels)
    }

    /// Breakdown of `gross` with `member`'s level override, if any.
    ///
    /// The level percentages come from the override when present; the
    /// expense percentage always comes from the global configuration.
    ///
    /// # Errors
    ///
    /// See [`compute_breakdown_exact`].
    pub fn compute_breakdown_for_member(
        &self,
        gross: Decimal,
        member: &TeamMember,
    ) -> Result<PayoutBreakdown, PayoutError> {
        let levels = member.effective_levels(&self.config);
        let expense_pct = self.config.company_expense_pct;
        compute_breakdown_exact(gross, expense_pct, levels)
    }

    /// Attaches a fresh breakdown to every mapped transaction and marks it
    /// validated. Unmapped transactions are returned untouched. The input is
    /// not modified.
    ///
    /// # Errors
    ///
    /// Fails on the first transaction whose amount overflows.
    pub fn compute_for_batch(
        &self,
        transactions: &[BrokerageTransaction],
    ) -> Result<Vec<BrokerageTransaction>, PayoutError> {
        let processed = transactions
            .iter()
            .map(|tx| self.with_breakdown(tx))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            total = processed.len(),
            unmapped = processed.iter().filter(|tx| !tx.is_mapped()).count(),
            "Computed batch breakdowns"
        );
        Ok(processed)
    }

    /// Like [`compute_for_batch`](Self::compute_for_batch), but transactions
    /// that already carry a breakdown keep it.
    ///
    /// # Errors
    ///
    /// Fails on the first transaction whose amount overflows.
    pub fn backfill_breakdowns(
        &self,
        transactions: &[BrokerageTransaction],
    ) -> Result<Vec<BrokerageTransaction>, PayoutError> {
        transactions
            .iter()
            .map(|tx| {
                if tx.breakdown.is_some() {
                    Ok(tx.clone())
                } else {
                    self.with_breakdown(tx)
                }
            })
            .collect()
    }

    fn with_breakdown(
        &self,
        tx: &BrokerageTransaction,
    ) -> Result<BrokerageTransaction, PayoutError> {
        if !tx.is_mapped() {
            return Ok(tx.clone());
        }
        let breakdown = self.compute_breakdown(tx.gross_amount).map_err(|e| {
            warn!(transaction = %tx.id, error = %e, "Failed to compute breakdown");
            e
        })?;
        Ok(BrokerageTransaction {
            breakdown: Some(breakdown),
            status: TransactionStatus::Validated,
            ..tx.clone()
        })
    }

    /// The amount of `tx` owed to `member`'s level.
    ///
    /// Uses the stored breakdown when there is one; otherwise estimates with
    /// [`estimate_share_proportional`] at the member's own percentage
    /// (override, then global, then 0%). Level 0 members receive 0 on both
    /// paths.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::InvalidAmount`] only if the estimate overflows.
    pub fn user_share_of(
        &self,
        tx: &BrokerageTransaction,
        member: &TeamMember,
    ) -> Result<Decimal, PayoutError> {
        self.share_with_source(tx, member).map(|(share, _)| share)
    }

    /// [`user_share_of`](Self::user_share_of), also reporting which path
    /// produced the amount.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::InvalidAmount`] only if the estimate overflows.
    pub fn share_with_source(
        &self,
        tx: &BrokerageTransaction,
        member: &TeamMember,
    ) -> Result<(Decimal, ShareSource), PayoutError> {
        if let Some(breakdown) = &tx.breakdown {
            return Ok((breakdown.level_payouts.get(member.level), ShareSource::Stored));
        }

        if !member.level.is_payout_level() {
            debug!(
                transaction = %tx.id,
                member = %member.id,
                "Level 0 member has no estimated share"
            );
            return Ok((Decimal::ZERO, ShareSource::Estimated));
        }

        let user_pct = member.own_percentage(&self.config);
        let share =
            estimate_share_proportional(tx.gross_amount, self.config.company_expense_pct, user_pct)?;
        Ok((share, ShareSource::Estimated))
    }
}
