use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{HierarchyLevel, LevelPercentages, SharingConfig, SharingConfigError};

/// A person placed in the referral hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub level: HierarchyLevel,

    /// Per-member replacement for the global `levels` map. Only the level
    /// percentages are overridable; company expense always comes from the
    /// global configuration.
    #[serde(default)]
    pub custom_levels: Option<LevelPercentages>,
}

impl TeamMember {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        level: HierarchyLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            custom_levels: None,
        }
    }

    /// The level map this member's computations distribute with: the
    /// override when present, otherwise the global map.
    pub fn effective_levels<'a>(
        &'a self,
        global: &'a SharingConfig,
    ) -> &'a LevelPercentages {
        self.custom_levels.as_ref().unwrap_or(&global.levels)
    }

    /// The percentage this member earns at their own level.
    ///
    /// Looks in the override first, then the global map, then 0%. An override
    /// that omits the member's level falls through to the global value.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use payout_core::{HierarchyLevel, LevelPercentages, SharingConfig, TeamMember};
    ///
    /// let global = SharingConfig::system_default();
    /// let mut member = TeamMember::new("M1", "Asha", HierarchyLevel::FRONT_LINE);
    /// assert_eq!(member.own_percentage(&global), dec!(5));
    ///
    /// member.custom_levels = Some(LevelPercentages::from_pairs([(6, dec!(8))]).unwrap());
    /// assert_eq!(member.own_percentage(&global), dec!(8));
    /// ```
    pub fn own_percentage(
        &self,
        global: &SharingConfig,
    ) -> Decimal {
        self.custom_levels
            .as_ref()
            .and_then(|custom| custom.get(self.level))
            .or_else(|| global.levels.get(self.level))
            .unwrap_or(Decimal::ZERO)
    }

    /// Installs a validated override.
    ///
    /// # Errors
    ///
    /// Returns [`SharingConfigError`] if `levels` does not pass
    /// [`LevelPercentages::validate_total`]; the existing override is kept.
    pub fn set_custom_levels(
        &mut self,
        levels: LevelPercentages,
    ) -> Result<(), SharingConfigError> {
        levels.validate_total()?;
        self.custom_levels = Some(levels);
        Ok(())
    }

    /// Drops the override so the member follows the global map again.
    pub fn clear_custom_levels(&mut self) {
        self.custom_levels = None;
    }
}
