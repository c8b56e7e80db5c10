//! Core data types: fund records, feature kinds and strategy picks.
//!
//! Every per-fund sequence is indexed "months ago": index 0 is the most recent
//! month of the snapshot and `duration - 1` the oldest month of that fund. Two
//! funds therefore agree on what month index `i` means, whatever their
//! inception dates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One fund as handed over by the scraper, before any table is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundRecord {
    /// Fund name, used as its identity.
    pub name: String,
    /// Minimum amount accepted for a first investment.
    pub minimum_investment: f64,
    /// Days between the redemption request and the quota conversion.
    pub settlement_days: u32,
    /// Days between quota conversion and cash availability.
    pub redemption_days: u32,
    /// Raw "active" flag as published by the broker.
    pub active: String,
    /// Monthly return multipliers (1 + r/100), index 0 = most recent month.
    pub monthly: Vec<f64>,
}

impl FundRecord {
    /// Create a record with only a name and a return history.
    pub fn new(name: impl Into<String>, monthly: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            minimum_investment: 0.0,
            settlement_days: 0,
            redemption_days: 0,
            active: String::new(),
            monthly,
        }
    }

    /// Set the minimum investment.
    pub fn with_minimum_investment(mut self, amount: f64) -> Self {
        self.minimum_investment = amount;
        self
    }

    /// Number of months of history.
    pub fn duration(&self) -> usize {
        self.monthly.len()
    }

    /// Total days until redeemed money is available.
    pub fn redemption_delay(&self) -> u32 {
        self.settlement_days + self.redemption_days
    }

    /// Check that every multiplier is finite and strictly positive.
    pub fn validate(&self) -> bool {
        self.monthly.iter().all(|m| m.is_finite() && *m > 0.0)
    }
}

/// Per-period statistics derived from a fund's monthly multipliers.
///
/// The discriminant is the position of the feature in every feature array, so
/// feature sets, ratio tables and weight vectors all share one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKind {
    /// Compounded return multiplier.
    Return = 0,
    /// Median monthly multiplier.
    Median = 1,
    /// Population standard deviation of monthly multipliers.
    StdDev = 2,
    /// Fraction of months with a multiplier below 1.
    NegativeMonthRatio = 3,
    /// Lowest compounded sub-run multiplier inside the period.
    GreatestFall = 4,
    /// Length in months of the greatest fall.
    GreatestFallLength = 5,
}

impl FeatureKind {
    /// Number of feature kinds.
    pub const COUNT: usize = 6;

    /// All feature kinds in index order.
    pub const ALL: [FeatureKind; FeatureKind::COUNT] = [
        FeatureKind::Return,
        FeatureKind::Median,
        FeatureKind::StdDev,
        FeatureKind::NegativeMonthRatio,
        FeatureKind::GreatestFall,
        FeatureKind::GreatestFallLength,
    ];

    /// Array position of this feature.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in configuration files and reports.
    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::Return => "return",
            FeatureKind::Median => "median",
            FeatureKind::StdDev => "stdDev",
            FeatureKind::NegativeMonthRatio => "negativeMonthRatio",
            FeatureKind::GreatestFall => "greatestFall",
            FeatureKind::GreatestFallLength => "greatestFallLength",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown feature: {}", s))
    }
}

/// Sort direction for single-feature ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Largest values first.
    #[default]
    Highest,
    /// Smallest values first.
    Lowest,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Highest => f.write_str("highest"),
            Direction::Lowest => f.write_str("lowest"),
        }
    }
}

/// A fund chosen by a strategy, with the share of money allocated to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    /// Index of the fund in the universe.
    pub fund: usize,
    /// Allocation weight; only relative sizes matter.
    pub weight: f64,
}

impl Pick {
    /// An equally weighted pick.
    pub fn equal(fund: usize) -> Self {
        Self { fund, weight: 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_indices_match_all() {
        for (i, kind) in FeatureKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_feature_from_str() {
        assert_eq!("stdDev".parse::<FeatureKind>(), Ok(FeatureKind::StdDev));
        assert_eq!("RETURN".parse::<FeatureKind>(), Ok(FeatureKind::Return));
        assert!("volume".parse::<FeatureKind>().is_err());
    }

    #[test]
    fn test_feature_serde_names() {
        let json = serde_json::to_string(&FeatureKind::NegativeMonthRatio).unwrap();
        assert_eq!(json, "\"negativeMonthRatio\"");
    }

    #[test]
    fn test_record_validate() {
        assert!(FundRecord::new("a", vec![1.01, 0.99]).validate());
        assert!(!FundRecord::new("b", vec![1.01, 0.0]).validate());
        assert!(!FundRecord::new("c", vec![f64::NAN]).validate());
    }

    #[test]
    fn test_redemption_delay() {
        let mut record = FundRecord::new("a", vec![1.0]);
        record.settlement_days = 30;
        record.redemption_days = 2;
        assert_eq!(record.redemption_delay(), 32);
    }
}
