use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Operation, SeverityCategory};

/// Thresholds used when suggesting a strategy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationRules {
    /// FOB value above which drawback is worth studying on its own
    pub high_value_fob: Decimal,
    /// Tariff codes with sector-specific reductions to review
    pub sector_review_codes: Vec<String>,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        Self {
            high_value_fob: Decimal::from(1_000_000),
            sector_review_codes: vec!["8471".to_string()],
        }
    }
}

/// Suggested course of action for one operation, most urgent first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Urgent,
    Review,
    StudyDrawback,
    SectorReview,
    WithinParameters,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Urgent => "URGENT",
            Recommendation::Review => "REVIEW",
            Recommendation::StudyDrawback => "STUDY_DRAWBACK",
            Recommendation::SectorReview => "SECTOR_REVIEW",
            Recommendation::WithinParameters => "WITHIN_PARAMETERS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Recommendation::Urgent => "Drawback + tariff code review + legal counsel",
            Recommendation::Review => "Drawback + state VAT optimisation",
            Recommendation::StudyDrawback => "Study drawback: high customs value",
            Recommendation::SectorReview => "Check sector-specific tariff reductions",
            Recommendation::WithinParameters => "Within expected parameters",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick a strategy from the operation's severity and absolute value bucket.
///
/// `value_rank` is the bucket index of the operation's total tax and
/// `bucket_count` the number of configured buckets; the top bucket counts
/// as urgent and the one below it as review.
pub fn recommend(
    op: &Operation,
    value_rank: usize,
    bucket_count: usize,
    rules: &RecommendationRules,
) -> Recommendation {
    let top = bucket_count.saturating_sub(1);
    let in_top_bucket = bucket_count > 0 && value_rank >= top;
    let in_second_bucket = bucket_count > 1 && value_rank + 1 == top;

    if in_top_bucket || op.severity_category == SeverityCategory::Overloaded {
        Recommendation::Urgent
    } else if in_second_bucket || op.severity_category == SeverityCategory::Critical {
        Recommendation::Review
    } else if op.fob_value > rules.high_value_fob {
        Recommendation::StudyDrawback
    } else if rules
        .sector_review_codes
        .iter()
        .any(|code| op.tariff_code.starts_with(code.as_str()))
    {
        Recommendation::SectorReview
    } else {
        Recommendation::WithinParameters
    }
}
