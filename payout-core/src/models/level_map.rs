use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{HierarchyLevel, PayoutError};

fn parse_level_key(key: &str) -> Result<HierarchyLevel, PayoutError> {
    let index: i64 = key
        .trim()
        .parse()
        .map_err(|_| PayoutError::InvalidLevelKey(key.to_string()))?;
    HierarchyLevel::new(index)
}

/// Percentage share of the net pool per hierarchy level.
///
/// Levels that were never set are reported as absent by [`get`](Self::get) and
/// as 0% by [`pct`](Self::pct). The distinction matters for per-member
/// overrides, which fall back to the global value for absent levels.
///
/// Serialized as a map keyed by the level index as a string (`"0"`..`"6"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Decimal>",
    into = "BTreeMap<String, Decimal>"
)]
pub struct LevelPercentages(BTreeMap<HierarchyLevel, Decimal>);

impl LevelPercentages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from `(level index, percentage)` pairs.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use payout_core::{HierarchyLevel, LevelPercentages};
    ///
    /// let levels = LevelPercentages::from_pairs([(1, dec!(40)), (6, dec!(60))]).unwrap();
    ///
    /// assert_eq!(levels.pct(HierarchyLevel::FRONT_LINE), dec!(60));
    /// assert_eq!(levels.pct(HierarchyLevel::new(3).unwrap()), dec!(0));
    /// ```
    pub fn from_pairs<I>(pairs: I) -> Result<Self, PayoutError>
    where
        I: IntoIterator<Item = (i64, Decimal)>,
    {
        let mut map = BTreeMap::new();
        for (index, pct) in pairs {
            map.insert(HierarchyLevel::new(index)?, pct);
        }
        Ok(Self(map))
    }

    /// The configured percentage, if this level was set at all.
    pub fn get(
        &self,
        level: HierarchyLevel,
    ) -> Option<Decimal> {
        self.0.get(&level).copied()
    }

    /// The configured percentage, treating absent levels as 0%.
    pub fn pct(
        &self,
        level: HierarchyLevel,
    ) -> Decimal {
        self.get(level).unwrap_or(Decimal::ZERO)
    }

    pub fn set(
        &mut self,
        level: HierarchyLevel,
        pct: Decimal,
    ) {
        self.0.insert(level, pct);
    }

    /// Sum of all configured percentages, levels 0 through 6, or `None` if
    /// the sum overflows.
    pub fn total(&self) -> Option<Decimal> {
        self.0
            .values()
            .try_fold(Decimal::ZERO, |acc, pct| acc.checked_add(*pct))
    }

    pub fn iter(&self) -> impl Iterator<Item = (HierarchyLevel, Decimal)> + '_ {
        self.0.iter().map(|(level, pct)| (*level, *pct))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<String, Decimal>> for LevelPercentages {
    type Error = PayoutError;

    fn try_from(raw: BTreeMap<String, Decimal>) -> Result<Self, Self::Error> {
        let mut map = BTreeMap::new();
        for (key, pct) in raw {
            map.insert(parse_level_key(&key)?, pct);
        }
        Ok(Self(map))
    }
}

impl From<LevelPercentages> for BTreeMap<String, Decimal> {
    fn from(levels: LevelPercentages) -> Self {
        levels
            .0
            .into_iter()
            .map(|(level, pct)| (level.index().to_string(), pct))
            .collect()
    }
}

/// Display labels per hierarchy level. Never used in computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct LevelNames(BTreeMap<HierarchyLevel, String>);

impl LevelNames {
    /// Labels used when no configuration overrides them.
    pub fn standard() -> Self {
        let names = [
            "Super Holding",
            "Corporate House",
            "Master Franchise",
            "Franchise",
            "Senior Partner",
            "Partner",
            "Relationship Manager",
        ];
        Self(
            HierarchyLevel::all()
                .zip(names)
                .map(|(level, name)| (level, name.to_string()))
                .collect(),
        )
    }

    /// The label for `level`, or a generic `Level N` when none is configured.
    pub fn label(
        &self,
        level: HierarchyLevel,
    ) -> String {
        self.0
            .get(&level)
            .cloned()
            .unwrap_or_else(|| format!("Level {}", level.index()))
    }

    pub fn set(
        &mut self,
        level: HierarchyLevel,
        name: impl Into<String>,
    ) {
        self.0.insert(level, name.into());
    }
}

impl TryFrom<BTreeMap<String, String>> for LevelNames {
    type Error = PayoutError;

    fn try_from(raw: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let mut map = BTreeMap::new();
        for (key, name) in raw {
            map.insert(parse_level_key(&key)?, name);
        }
        Ok(Self(map))
    }
}

impl From<LevelNames> for BTreeMap<String, String> {
    fn from(names: LevelNames) -> Self {
        names
            .0
            .into_iter()
            .map(|(level, name)| (level.index().to_string(), name))
            .collect()
    }
}
