use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{HierarchyLevel, PayoutError};

/// Amounts allocated to levels 1 through 6.
///
/// Level 0 has no slot: it is a simulator-only concept and never part of a
/// persisted payout. Reading level 0 yields zero.
///
/// Serialized as a map with exactly the keys `"1"`..`"6"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Decimal>",
    into = "BTreeMap<String, Decimal>"
)]
pub struct LevelPayouts([Decimal; 6]);

impl LevelPayouts {
    /// Builds payouts from the amounts for levels 1 through 6, in order.
    pub fn new(amounts: [Decimal; 6]) -> Self {
        Self(amounts)
    }

    pub fn get(
        &self,
        level: HierarchyLevel,
    ) -> Decimal {
        match level.index() {
            0 => Decimal::ZERO,
            index => self.0[usize::from(index) - 1],
        }
    }

    /// Sets the amount for a payout level. Level 0 is ignored.
    pub(crate) fn set(
        &mut self,
        level: HierarchyLevel,
        amount: Decimal,
    ) {
        if let Some(index) = usize::from(level.index()).checked_sub(1) {
            self.0[index] = amount;
        }
    }

    /// Sum of levels 1 through 6, or `None` if the sum overflows.
    pub fn total(&self) -> Option<Decimal> {
        self.0
            .iter()
            .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    pub fn iter(&self) -> impl Iterator<Item = (HierarchyLevel, Decimal)> + '_ {
        HierarchyLevel::payout_levels().zip(self.0.iter().copied())
    }
}

impl TryFrom<BTreeMap<String, Decimal>> for LevelPayouts {
    type Error = PayoutError;

    fn try_from(raw: BTreeMap<String, Decimal>) -> Result<Self, Self::Error> {
        let mut payouts = Self::default();
        let mut seen = [false; 6];
        for (key, amount) in raw {
            let index: i64 = key
                .trim()
                .parse()
                .map_err(|_| PayoutError::InvalidLevelKey(key.clone()))?;
            let level = HierarchyLevel::new(index)?;
            if !level.is_payout_level() {
                return Err(PayoutError::InvalidLevelKey(key));
            }
            payouts.set(level, amount);
            seen[usize::from(level.index()) - 1] = true;
        }
        if let Some(missing) = seen.iter().position(|present| !present) {
            return Err(PayoutError::MissingPayoutLevel(missing as u8 + 1));
        }
        Ok(payouts)
    }
}

impl From<LevelPayouts> for BTreeMap<String, Decimal> {
    fn from(payouts: LevelPayouts) -> Self {
        payouts
            .iter()
            .map(|(level, amount)| (level.index().to_string(), amount))
            .collect()
    }
}

/// The result of splitting one transaction's gross brokerage.
///
/// Once attached to a transaction this is the number of record: reports read
/// it back rather than recomputing from whatever configuration is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutBreakdown {
    /// The input amount, unchanged.
    pub gross: Decimal,

    /// `gross × expense% / 100`, rounded to cents.
    pub expense_amount: Decimal,

    /// `gross − expense_amount`, rounded to cents.
    pub net_pool: Decimal,

    pub level_payouts: LevelPayouts,
}

impl PayoutBreakdown {
    pub fn new(
        gross: Decimal,
        expense_amount: Decimal,
        net_pool: Decimal,
        level_payouts: LevelPayouts,
    ) -> Self {
        Self {
            gross,
            expense_amount,
            net_pool,
            level_payouts,
        }
    }

    /// Checks that the level payouts sum to the net pool to the cent.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::CorruptBreakdown`] when they do not, or
    /// [`PayoutError::PayoutTotalOverflow`] when they cannot even be summed.
    pub fn verify(&self) -> Result<(), PayoutError> {
        let distributed = self
            .level_payouts
            .total()
            .ok_or(PayoutError::PayoutTotalOverflow { net_pool: self.net_pool })?;
        if distributed != self.net_pool {
            return Err(PayoutError::CorruptBreakdown {
                net_pool: self.net_pool,
                distributed,
            });
        }
        Ok(())
    }
}
