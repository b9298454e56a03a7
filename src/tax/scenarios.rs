//! What-if savings for a single import
//!
//! Each scenario recomputes the full stack under changed rates instead of
//! subtracting a flat share, so the ICMS base shrinks along with II and IPI.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::burden;
use super::stack::{self, TaxStack};
use crate::config::Config;
use crate::error::TaxError;
use crate::models::{Operation, TradeDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scenario {
    /// II and IPI suspended under the drawback regime
    Drawback,
    /// ICMS at the reduced (incentive) rate
    StateVatReduction,
    /// Both of the above
    FullOptimization,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::Drawback,
        Scenario::StateVatReduction,
        Scenario::FullOptimization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Drawback => "DRAWBACK",
            Scenario::StateVatReduction => "STATE_VAT_REDUCTION",
            Scenario::FullOptimization => "FULL_OPTIMIZATION",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Drawback => "Drawback suspension (no II/IPI)",
            Scenario::StateVatReduction => "Reduced ICMS rate",
            Scenario::FullOptimization => "Drawback + reduced ICMS",
        }
    }

    fn suspends_duties(&self) -> bool {
        matches!(self, Scenario::Drawback | Scenario::FullOptimization)
    }

    fn reduces_state_vat(&self) -> bool {
        matches!(self, Scenario::StateVatReduction | Scenario::FullOptimization)
    }
}

/// Knobs for the what-if scenarios and the per-entity tax share alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRules {
    /// ICMS rate assumed by the reduced-VAT scenarios
    pub reduced_state_vat: Decimal,
    /// Entities whose taxes exceed this share of their customs value are flagged
    pub tax_share_alert: Decimal,
}

impl Default for ScenarioRules {
    fn default() -> Self {
        Self {
            reduced_state_vat: Decimal::new(12, 2),
            tax_share_alert: Decimal::new(60, 2),
        }
    }
}

impl ScenarioRules {
    pub fn validate(&self) -> Result<(), TaxError> {
        if self.reduced_state_vat < Decimal::ZERO || self.reduced_state_vat >= Decimal::ONE {
            return Err(TaxError::config(format!(
                "reduced VAT rate must be within [0, 1), got {}",
                self.reduced_state_vat
            )));
        }
        if self.tax_share_alert <= Decimal::ZERO {
            return Err(TaxError::config(format!(
                "tax share alert must be positive, got {}",
                self.tax_share_alert
            )));
        }
        Ok(())
    }
}

/// One scenario recomputed for an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub state_vat_rate: Decimal,
    pub stack: TaxStack,
    /// Current total tax minus the scenario's total
    pub savings: Decimal,
    pub burden_index: Decimal,
}

/// Recompute `op` under every [`Scenario`].
///
/// Export legs carry no import tax and yield no scenarios. An operation whose
/// ICMS rate is already at or below the reduced rate keeps its own rate.
pub fn what_if(op: &Operation, config: &Config) -> Result<Vec<ScenarioOutcome>, TaxError> {
    if op.direction == TradeDirection::Export {
        return Ok(Vec::new());
    }
    let rates = &config.rates;
    let rules = &config.scenarios;

    Scenario::ALL
        .iter()
        .map(|&scenario| {
            let (duty, excise) = if scenario.suspends_duties() {
                (Decimal::ZERO, Decimal::ZERO)
            } else {
                (rates.import_duty, rates.excise)
            };
            let state_vat_rate = if scenario.reduces_state_vat() {
                op.state_vat_rate.min(rules.reduced_state_vat)
            } else {
                op.state_vat_rate
            };

            let stack = stack::compute(
                op.fob_value,
                op.exchange_rate,
                state_vat_rate,
                duty,
                excise,
                rates.exchange_tax,
                op.customs_fees,
            )?;
            let burden_index =
                burden::burden_index(stack.total_tax, stack.value_local, config.benchmark)?;

            Ok(ScenarioOutcome {
                scenario,
                state_vat_rate,
                savings: op.total_tax - stack.total_tax,
                stack,
                burden_index,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationInput;
    use crate::tax::Assessor;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn reference_import(config: &Config) -> Operation {
        let input = OperationInput {
            id: 1,
            direction: TradeDirection::Import,
            entity_id: "12345678".to_string(),
            tariff_code: "8471".to_string(),
            fob_value: dec!(100000),
            exchange_rate: dec!(5.60),
            state_vat_rate: Some(dec!(0.18)),
            customs_fees: Decimal::ZERO,
            operation_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            quantity: 100,
        };
        Assessor::new(config).unwrap().assess(&input).unwrap()
    }

    fn run(op: &Operation, config: &Config) -> Vec<ScenarioOutcome> {
        what_if(op, config).unwrap()
    }

    #[test]
    fn test_reference_import_scenarios() {
        let config = Config::default();
        let op = reference_import(&config);
        let outcomes = run(&op, &config);
        let scenarios: Vec<Scenario> = outcomes.iter().map(|o| o.scenario).collect();
        assert_eq!(scenarios, Scenario::ALL.to_vec());

        // 562128 * 0.18 / 0.82 = 123393.951...
        let drawback = &outcomes[0];
        assert_eq!(drawback.stack.import_duty, Decimal::ZERO);
        assert_eq!(drawback.stack.state_vat, dec!(123393.95));
        assert_eq!(drawback.stack.total_tax, dec!(125521.95));
        assert_eq!(drawback.savings, dec!(519283.90));
        assert_eq!(drawback.burden_index, dec!(1.121));

        // 987940.80 * 0.12 / 0.88 = 134719.20
        let vat = &outcomes[1];
        assert_eq!(vat.state_vat_rate, dec!(0.12));
        assert_eq!(vat.stack.total_tax, dec!(562660.00));
        assert_eq!(vat.savings, dec!(82145.85));
        assert_eq!(vat.burden_index, dec!(5.024));

        let full = &outcomes[2];
        assert_eq!(full.stack.total_tax, dec!(78781.82));
        assert_eq!(full.savings, dec!(566024.03));
        assert_eq!(full.burden_index, dec!(0.703));
    }

    #[test]
    fn test_full_optimization_saves_the_most() {
        let config = Config::default();
        let op = reference_import(&config);
        let outcomes = run(&op, &config);
        let best = outcomes.iter().map(|o| o.savings).max().unwrap();
        assert_eq!(best, outcomes[2].savings);
        assert!(outcomes.iter().all(|o| o.savings > Decimal::ZERO));
        assert!(outcomes.iter().all(|o| o.burden_index < op.burden_index));
    }

    #[test]
    fn test_low_vat_rate_is_not_raised() {
        let config = Config::default();
        let mut op = reference_import(&config);
        op.state_vat_rate = dec!(0.07);
        let outcomes = run(&op, &config);
        assert_eq!(outcomes[1].state_vat_rate, dec!(0.07));
    }

    #[test]
    fn test_configured_reduced_rate_is_used() {
        let mut config = Config::default();
        config.scenarios.reduced_state_vat = dec!(0.04);
        let op = reference_import(&config);
        let outcomes = run(&op, &config);
        assert_eq!(outcomes[1].state_vat_rate, dec!(0.04));
        assert!(outcomes[1].savings > dec!(82145.85));
    }

    #[test]
    fn test_export_leg_has_no_scenarios() {
        let config = Config::default();
        let op = Operation::export_leg(
            9,
            "A",
            "8471",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            10,
            "LIGHT",
        );
        assert!(run(&op, &config).is_empty());
    }

    #[test]
    fn test_rules_validation() {
        assert!(ScenarioRules::default().validate().is_ok());
        let rules = ScenarioRules {
            reduced_state_vat: Decimal::ONE,
            ..ScenarioRules::default()
        };
        assert!(rules.validate().unwrap_err().is_config());
        let rules = ScenarioRules {
            tax_share_alert: Decimal::ZERO,
            ..ScenarioRules::default()
        };
        assert!(rules.validate().is_err());
    }
}
