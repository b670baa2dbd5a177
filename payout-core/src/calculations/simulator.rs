//! What-if view of a payout, including the display-only level 0.
//!
//! The simulator shows every level's configured percentage next to the
//! direct amount it would represent, alongside the breakdown that would
//! actually be stored. Level 0 appears here and nowhere else.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculations::common::{percent_of, round_half_up};
use crate::{HierarchyLevel, PayoutBreakdown, PayoutCalculator, PayoutError, TeamMember};

/// One level's line in a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationRow {
    pub level: HierarchyLevel,
    pub label: String,
    pub pct: Decimal,

    /// `round(net_pool × pct / 100)`, ignoring the floor/remainder rules.
    pub what_if_amount: Decimal,

    /// Amount the stored breakdown would carry. `None` for level 0.
    pub payout: Option<Decimal>,
}

impl SimulationRow {
    /// Whether this level is part of a persisted breakdown.
    pub fn is_persisted(&self) -> bool {
        self.payout.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutSimulation {
    pub rows: Vec<SimulationRow>,

    /// `100 − Σ pct` over levels 0–6. Non-zero means the configuration
    /// would be rejected on save.
    pub unassigned_pct: Decimal,

    pub breakdown: PayoutBreakdown,
}

impl PayoutCalculator {
    /// Simulates a payout of `gross`, optionally with `member`'s override.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::InvalidAmount`] only if the arithmetic overflows.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use payout_core::{HierarchyLevel, PayoutCalculator, SharingConfig};
    ///
    /// let calculator = PayoutCalculator::new(SharingConfig::system_default());
    /// let simulation = calculator.simulate(dec!(1000), None).unwrap();
    ///
    /// let super_holding = &simulation.rows[0];
    /// assert_eq!(super_holding.level, HierarchyLevel::SUPER_HOLDING);
    /// assert_eq!(super_holding.what_if_amount, dec!(170.00));
    /// assert!(!super_holding.is_persisted());
    /// ```
    pub fn simulate(
        &self,
        gross: Decimal,
        member: Option<&TeamMember>,
    ) -> Result<PayoutSimulation, PayoutError> {
        let config = self.config();
        let (levels, breakdown) = match member {
            Some(member) => (
                member.effective_levels(config),
                self.compute_breakdown_for_member(gross, member)?,
            ),
            None => (&config.levels, self.compute_breakdown(gross)?),
        };

        let rows = HierarchyLevel::all()
            .map(|level| -> Result<SimulationRow, PayoutError> {
                let pct = levels.pct(level);
                let what_if = percent_of(breakdown.net_pool, pct).ok_or_else(|| {
                    PayoutError::InvalidAmount(format!("{gross} overflows simulation"))
                })?;
                Ok(SimulationRow {
                    level,
                    label: config.level_names.label(level),
                    pct,
                    what_if_amount: round_half_up(what_if),
                    payout: level
                        .is_payout_level()
                        .then(|| breakdown.level_payouts.get(level)),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let unassigned_pct = levels
            .total()
            .and_then(|total| Decimal::ONE_HUNDRED.checked_sub(total))
            .ok_or_else(|| {
                PayoutError::InvalidAmount("level percentages overflow when summed".to_string())
            })?;

        Ok(PayoutSimulation {
            rows,
            unassigned_pct,
            breakdown,
        })
    }
}
