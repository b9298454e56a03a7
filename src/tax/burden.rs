//! Burden index and classification tables
//!
//! Both classifiers (ratio-based severity and absolute value buckets) are
//! backed by the same [`ClassificationTable`]: an ordered list of
//! `(lower_bound, label)` tiers where the highest bound not above the value
//! wins.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxError;
use crate::models::SeverityCategory;
use crate::utils::round_index;

/// One tier of a classification table
#[derive(Debug, Clone, PartialEq)]
pub struct Tier<L> {
    pub lower_bound: Decimal,
    pub label: L,
}

/// Ordered `(lower_bound, label)` pairs with strictly ascending bounds
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationTable<L> {
    tiers: Vec<Tier<L>>,
}

impl<L> ClassificationTable<L> {
    pub fn new(tiers: Vec<(Decimal, L)>) -> Result<Self, TaxError> {
        if tiers.is_empty() {
            return Err(TaxError::config("classification table has no tiers"));
        }
        for pair in tiers.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(TaxError::config(format!(
                    "classification bounds must be strictly ascending ({} then {})",
                    pair[0].0, pair[1].0
                )));
            }
        }
        Ok(Self {
            tiers: tiers
                .into_iter()
                .map(|(lower_bound, label)| Tier { lower_bound, label })
                .collect(),
        })
    }

    /// Index of the tier `value` falls into; values below the first bound
    /// land in the lowest tier.
    pub fn rank(&self, value: Decimal) -> usize {
        self.tiers
            .iter()
            .rposition(|tier| value >= tier.lower_bound)
            .unwrap_or(0)
    }

    pub fn classify(&self, value: Decimal) -> &L {
        &self.tiers[self.rank(value)].label
    }

    pub fn tiers(&self) -> &[Tier<L>] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn lowest(&self) -> &L {
        &self.tiers[0].label
    }
}

/// Inclusive lower bounds of the severity categories above `Low`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub moderate: Decimal,
    pub high: Decimal,
    pub critical: Decimal,
    pub overloaded: Decimal,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            moderate: Decimal::new(5, 1),
            high: Decimal::ONE,
            critical: Decimal::new(15, 1),
            overloaded: Decimal::TWO,
        }
    }
}

impl SeverityThresholds {
    /// Build the ratio table; `Low` starts at zero so no category is skipped.
    pub fn table(&self) -> Result<ClassificationTable<SeverityCategory>, TaxError> {
        if self.moderate <= Decimal::ZERO {
            return Err(TaxError::config(format!(
                "moderate threshold must be positive, got {}",
                self.moderate
            )));
        }
        ClassificationTable::new(vec![
            (Decimal::ZERO, SeverityCategory::Low),
            (self.moderate, SeverityCategory::Moderate),
            (self.high, SeverityCategory::High),
            (self.critical, SeverityCategory::Critical),
            (self.overloaded, SeverityCategory::Overloaded),
        ])
    }
}

/// Result of indexing one operation against the benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurdenAssessment {
    pub burden_index: Decimal,
    pub severity: SeverityCategory,
}

/// `round(total_tax / value_local / benchmark, 3)`, or zero when there is no
/// local value to divide by.
pub fn burden_index(
    total_tax: Decimal,
    value_local: Decimal,
    benchmark: Decimal,
) -> Result<Decimal, TaxError> {
    if benchmark <= Decimal::ZERO {
        return Err(TaxError::domain(format!(
            "benchmark must be positive, got {}",
            benchmark
        )));
    }
    if total_tax < Decimal::ZERO || value_local < Decimal::ZERO {
        return Err(TaxError::domain(format!(
            "tax and value must be non-negative (tax {}, value {})",
            total_tax, value_local
        )));
    }
    if value_local.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let effective_rate = total_tax
        .checked_div(value_local)
        .ok_or_else(|| TaxError::domain("effective rate overflow"))?;
    let ratio = effective_rate
        .checked_div(benchmark)
        .ok_or_else(|| TaxError::domain("burden index overflow"))?;
    Ok(round_index(ratio))
}

/// Compute the burden index and map it to a severity category
pub fn index(
    total_tax: Decimal,
    value_local: Decimal,
    benchmark: Decimal,
    severity: &ClassificationTable<SeverityCategory>,
) -> Result<BurdenAssessment, TaxError> {
    let burden_index = burden_index(total_tax, value_local, benchmark)?;
    Ok(BurdenAssessment {
        burden_index,
        severity: *severity.classify(burden_index),
    })
}

/// Severity for a burden index using the default thresholds
pub fn classify_severity(burden_index: Decimal) -> SeverityCategory {
    match burden_index {
        b if b >= Decimal::TWO => SeverityCategory::Overloaded,
        b if b >= Decimal::new(15, 1) => SeverityCategory::Critical,
        b if b >= Decimal::ONE => SeverityCategory::High,
        b if b >= Decimal::new(5, 1) => SeverityCategory::Moderate,
        _ => SeverityCategory::Low,
    }
}

/// Absolute classification of a tax amount against the value buckets
pub fn classify_value(total_tax: Decimal, buckets: &ClassificationTable<String>) -> &str {
    buckets.classify(total_tax).as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_table() -> ClassificationTable<SeverityCategory> {
        SeverityThresholds::default().table().unwrap()
    }

    #[test]
    fn test_zero_value_yields_zero_index_and_lowest_tier() {
        let result = index(dec!(1234.56), dec!(0), dec!(0.20), &default_table()).unwrap();
        assert_eq!(result.burden_index, Decimal::ZERO);
        assert_eq!(result.severity, SeverityCategory::Low);
    }

    #[test]
    fn test_golden_burden_index() {
        // 644805.85 / 560000 = 1.15143901..., / 0.20 = 5.7571950
        let result = index(dec!(644805.85), dec!(560000.00), dec!(0.20), &default_table()).unwrap();
        assert_eq!(result.burden_index, dec!(5.757));
        assert_eq!(result.severity, SeverityCategory::Overloaded);

        let result = index(dec!(644805.85), dec!(560000.00), dec!(0.35), &default_table()).unwrap();
        assert_eq!(result.burden_index, dec!(3.290));
    }

    #[test]
    fn test_thresholds_are_inclusive_lower_bounds() {
        let table = default_table();
        assert_eq!(*table.classify(dec!(0.499)), SeverityCategory::Low);
        assert_eq!(*table.classify(dec!(0.5)), SeverityCategory::Moderate);
        assert_eq!(*table.classify(dec!(1.0)), SeverityCategory::High);
        assert_eq!(*table.classify(dec!(1.5)), SeverityCategory::Critical);
        assert_eq!(*table.classify(dec!(1.999)), SeverityCategory::Critical);
        assert_eq!(*table.classify(dec!(2.0)), SeverityCategory::Overloaded);
    }

    #[test]
    fn test_severity_is_monotonic_in_index() {
        let table = default_table();
        let mut previous = SeverityCategory::Low;
        let mut seen = Vec::new();
        for step in 0..=3000 {
            let value = Decimal::new(step, 3);
            let category = *table.classify(value);
            assert!(category >= previous, "category dropped at {}", value);
            assert_eq!(category, classify_severity(value));
            if seen.last() != Some(&category) {
                seen.push(category);
            }
            previous = category;
        }
        assert_eq!(seen, SeverityCategory::ALL.to_vec());
    }

    #[test]
    fn test_benchmark_must_be_positive() {
        assert!(burden_index(dec!(10), dec!(100), dec!(0)).unwrap_err().is_domain());
        assert!(burden_index(dec!(-10), dec!(100), dec!(0.2)).unwrap_err().is_domain());
    }

    #[test]
    fn test_unordered_thresholds_are_config_errors() {
        let thresholds = SeverityThresholds {
            moderate: dec!(0.5),
            high: dec!(1.5),
            critical: dec!(1.0),
            overloaded: dec!(2.0),
        };
        assert!(thresholds.table().unwrap_err().is_config());

        let thresholds = SeverityThresholds {
            moderate: dec!(0),
            ..SeverityThresholds::default()
        };
        assert!(thresholds.table().unwrap_err().is_config());
    }

    #[test]
    fn test_value_classification_shares_the_table() {
        let buckets = ClassificationTable::new(vec![
            (dec!(0), "LIGHT".to_string()),
            (dec!(50000), "MEDIUM".to_string()),
            (dec!(200000), "HEAVY".to_string()),
            (dec!(1000000), "OVERLOADED".to_string()),
        ])
        .unwrap();
        assert_eq!(classify_value(dec!(49999.99), &buckets), "LIGHT");
        assert_eq!(classify_value(dec!(50000), &buckets), "MEDIUM");
        assert_eq!(classify_value(dec!(644805.85), &buckets), "HEAVY");
        assert_eq!(classify_value(dec!(5000000), &buckets), "OVERLOADED");
        assert_eq!(buckets.rank(dec!(5000000)), 3);
        assert_eq!(buckets.lowest(), "LIGHT");
    }
}
