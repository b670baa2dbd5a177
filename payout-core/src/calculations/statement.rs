//! Monthly payout statements for a single team member.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::calculations::payout::ShareSource;
use crate::{BrokerageTransaction, HierarchyLevel, PayoutCalculator, PayoutError, TeamMember};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StatementPeriod {
    year: i32,
    month: u32,
}

impl StatementPeriod {
    /// # Errors
    ///
    /// Returns [`PayoutError::InvalidPeriod`] if `month` is not 1–12 or the
    /// year is outside the supported date range.
    pub fn new(
        year: i32,
        month: u32,
    ) -> Result<Self, PayoutError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|_| Self { year, month })
            .ok_or_else(|| PayoutError::InvalidPeriod(format!("{year:04}-{month:02}")))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(
        &self,
        date: NaiveDate,
    ) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for StatementPeriod {
    type Err = PayoutError;

    /// Parses `YYYY-MM`.
    ///
    /// ```
    /// use payout_core::StatementPeriod;
    ///
    /// let period: StatementPeriod = "2025-04".parse().unwrap();
    /// assert_eq!(period.month(), 4);
    /// assert!("2025-13".parse::<StatementPeriod>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PayoutError::InvalidPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for StatementPeriod {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub transaction_id: String,
    pub trade_date: NaiveDate,
    pub gross: Decimal,
    pub share: Decimal,
    #[serde(skip)]
    pub source: ShareSource,
}

/// A member's share of every mapped transaction traded in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberStatement {
    pub member_id: String,
    pub member_name: String,
    pub level: HierarchyLevel,
    pub period: StatementPeriod,
    pub lines: Vec<StatementLine>,

    /// Sum of line shares, rounded to cents.
    pub total_share: Decimal,

    /// Unmapped transactions in the period, left out of the total.
    pub skipped_unmapped: usize,
}

impl MemberStatement {
    /// Builds the statement for `member` over `transactions`.
    ///
    /// `transactions` is expected to be already narrowed to the member's
    /// part of the hierarchy. Lines outside `period` or without a trade date
    /// are ignored; unmapped lines are counted but not paid.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::InvalidAmount`] if share estimation or the
    /// total overflows.
    pub fn build(
        calculator: &PayoutCalculator,
        member: &TeamMember,
        transactions: &[BrokerageTransaction],
        period: StatementPeriod,
    ) -> Result<Self, PayoutError> {
        let mut lines = Vec::new();
        let mut skipped_unmapped = 0;

        for tx in transactions {
            let Some(trade_date) = tx.trade_date.filter(|d| period.contains(*d)) else {
                continue;
            };
            if !tx.is_mapped() {
                skipped_unmapped += 1;
                continue;
            }
            let (share, source) = calculator.share_with_source(tx, member)?;
            lines.push(StatementLine {
                transaction_id: tx.id.clone(),
                trade_date,
                gross: tx.gross_amount,
                share,
                source,
            });
        }

        let total_share = lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.share))
            .map(round_half_up)
            .ok_or_else(|| {
                PayoutError::InvalidAmount(format!("statement total for {} overflows", member.id))
            })?;
        debug!(
            member = %member.id,
            period = %period,
            lines = lines.len(),
            skipped_unmapped,
            total_share = %total_share,
            "Built member statement"
        );

        Ok(Self {
            member_id: member.id.clone(),
            member_name: member.name.clone(),
            level: member.level,
            period,
            lines,
            total_share,
            skipped_unmapped,
        })
    }

    pub fn stored_lines(&self) -> usize {
        self.count_source(ShareSource::Stored)
    }

    pub fn estimated_lines(&self) -> usize {
        self.count_source(ShareSource::Estimated)
    }

    fn count_source(
        &self,
        source: ShareSource,
    ) -> usize {
        self.lines.iter().filter(|line| line.source == source).count()
    }
}
