use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PayoutError;

/// A rung in the seven-level referral hierarchy.
///
/// | Level | Role |
/// |-------|------|
/// | 0     | Super holding (simulator display only, never paid out) |
/// | 1     | Corporate house, the balancing account for rounding slack |
/// | 2–5   | Intermediate tiers |
/// | 6     | Front-line relationship manager |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct HierarchyLevel(u8);

impl HierarchyLevel {
    pub const SUPER_HOLDING: Self = Self(0);
    pub const CORPORATE_HOUSE: Self = Self(1);
    pub const FRONT_LINE: Self = Self(6);

    /// Highest valid level index.
    pub const MAX: u8 = 6;

    /// Levels whose payouts are computed directly from their percentage, in
    /// the order the floor amounts are accumulated. Level 1 is excluded: it
    /// receives whatever these leave behind.
    pub const DISTRIBUTION_ORDER: [Self; 5] = [Self(2), Self(3), Self(4), Self(5), Self(6)];

    /// Creates a level from its index.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::InvalidLevel`] for anything outside 0–6.
    ///
    /// ```
    /// use payout_core::HierarchyLevel;
    ///
    /// assert_eq!(HierarchyLevel::new(6).unwrap(), HierarchyLevel::FRONT_LINE);
    /// assert!(HierarchyLevel::new(7).is_err());
    /// ```
    pub fn new(index: i64) -> Result<Self, PayoutError> {
        match u8::try_from(index) {
            Ok(value) if value <= Self::MAX => Ok(Self(value)),
            _ => Err(PayoutError::InvalidLevel(index)),
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Every level, 0 through 6.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=Self::MAX).map(Self)
    }

    /// Levels that appear in a persisted payout breakdown (1 through 6).
    pub fn payout_levels() -> impl Iterator<Item = Self> {
        (1..=Self::MAX).map(Self)
    }

    pub fn is_payout_level(self) -> bool {
        self.0 >= 1
    }
}

impl TryFrom<i64> for HierarchyLevel {
    type Error = PayoutError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HierarchyLevel> for u8 {
    fn from(level: HierarchyLevel) -> Self {
        level.0
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn new_accepts_zero_through_six() {
        let indices: Vec<u8> = (0..=6)
            .map(|i| HierarchyLevel::new(i).unwrap().index())
            .collect();

        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert_eq!(HierarchyLevel::new(7), Err(PayoutError::InvalidLevel(7)));
        assert_eq!(HierarchyLevel::new(-1), Err(PayoutError::InvalidLevel(-1)));
    }

    #[test]
    fn payout_levels_exclude_super_holding() {
        let levels: Vec<u8> = HierarchyLevel::payout_levels().map(u8::from).collect();

        assert_eq!(levels, vec![1, 2, 3, 4, 5, 6]);
        assert!(!HierarchyLevel::SUPER_HOLDING.is_payout_level());
    }

    #[test]
    fn deserializes_from_integer() {
        let level: HierarchyLevel = serde_json::from_str("3").unwrap();

        assert_eq!(level.index(), 3);
        assert!(serde_json::from_str::<HierarchyLevel>("9").is_err());
    }

    #[test]
    fn display_uses_short_label() {
        assert_eq!(HierarchyLevel::FRONT_LINE.to_string(), "L6");
    }
}
