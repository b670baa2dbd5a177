use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{HierarchyLevel, LevelNames, LevelPercentages};

/// Reasons a sharing configuration cannot be saved.
///
/// The calculator itself never checks these; they gate the admin save path
/// for the global configuration and for per-member overrides.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SharingConfigError {
    #[error("company expense must be between 0 and 100 percent, got {0}")]
    ExpenseOutOfRange(Decimal),

    #[error("level {level} percentage must not be negative, got {pct}")]
    NegativePercentage { level: HierarchyLevel, pct: Decimal },

    #[error("level {level} percentage must not exceed 100, got {pct}")]
    PercentageAboveHundred { level: HierarchyLevel, pct: Decimal },

    #[error("level percentages must total 100, got {0}")]
    LevelsTotalMismatch(Decimal),

    #[error("level percentages overflow when summed")]
    LevelsTotalOverflow,
}

impl LevelPercentages {
    /// Checks that every percentage lies in 0–100 and that levels 0–6 total
    /// exactly 100.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use payout_core::{LevelPercentages, SharingConfigError};
    ///
    /// let levels = LevelPercentages::from_pairs([(1, dec!(60)), (6, dec!(30))]).unwrap();
    ///
    /// assert_eq!(
    ///     levels.validate_total(),
    ///     Err(SharingConfigError::LevelsTotalMismatch(dec!(90)))
    /// );
    /// ```
    pub fn validate_total(&self) -> Result<(), SharingConfigError> {
        for (level, pct) in self.iter() {
            if pct < Decimal::ZERO {
                return Err(SharingConfigError::NegativePercentage { level, pct });
            }
            if pct > Decimal::ONE_HUNDRED {
                return Err(SharingConfigError::PercentageAboveHundred { level, pct });
            }
        }
        let total = self.total().ok_or(SharingConfigError::LevelsTotalOverflow)?;
        if total != Decimal::ONE_HUNDRED {
            return Err(SharingConfigError::LevelsTotalMismatch(total));
        }
        Ok(())
    }
}

/// The global allocation policy.
///
/// Per-member overrides live on [`TeamMember`](crate::TeamMember) and replace
/// only `levels`; `company_expense_pct` is always read from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Percentage of gross deducted before the split.
    pub company_expense_pct: Decimal,

    /// Percentage of the net pool per level.
    pub levels: LevelPercentages,

    /// Display labels; irrelevant to computation.
    #[serde(default = "LevelNames::standard")]
    pub level_names: LevelNames,
}

impl SharingConfig {
    /// The configuration seeded when no admin has saved one yet.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use payout_core::SharingConfig;
    ///
    /// let config = SharingConfig::system_default();
    ///
    /// assert_eq!(config.company_expense_pct, dec!(15));
    /// assert_eq!(config.levels.total(), Some(dec!(100)));
    /// ```
    pub fn system_default() -> Self {
        let pcts = [20, 15, 15, 15, 15, 15, 5];
        let mut levels = LevelPercentages::new();
        for (level, pct) in HierarchyLevel::all().zip(pcts) {
            levels.set(level, Decimal::from(pct));
        }
        Self {
            company_expense_pct: Decimal::from(15),
            levels,
            level_names: LevelNames::standard(),
        }
    }

    /// Validates the configuration before an admin save.
    ///
    /// # Errors
    ///
    /// Returns [`SharingConfigError`] if the expense percentage is outside
    /// 0–100 or the level percentages fail [`LevelPercentages::validate_total`].
    pub fn validate(&self) -> Result<(), SharingConfigError> {
        if self.company_expense_pct < Decimal::ZERO
            || self.company_expense_pct > Decimal::ONE_HUNDRED
        {
            return Err(SharingConfigError::ExpenseOutOfRange(
                self.company_expense_pct,
            ));
        }
        self.levels.validate_total()
    }
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self::system_default()
    }
}
