use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::burden::{self, ClassificationTable};
use super::recommendation::{self, Recommendation};
use super::stack;
use crate::config::Config;
use crate::error::TaxError;
use crate::models::{Operation, OperationInput, SeverityCategory, TradeDirection};

/// Runs raw operations through the tax stack and both classifiers.
///
/// Classification tables are built once from the configuration and shared
/// read-only by every assessment.
#[derive(Debug, Clone)]
pub struct Assessor<'a> {
    config: &'a Config,
    severity: ClassificationTable<SeverityCategory>,
    values: ClassificationTable<String>,
}

impl<'a> Assessor<'a> {
    pub fn new(config: &'a Config) -> Result<Self, TaxError> {
        Ok(Self {
            config,
            severity: config.severity_table()?,
            values: config.value_table()?,
        })
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn value_table(&self) -> &ClassificationTable<String> {
        &self.values
    }

    /// Compute taxes, burden index and value class for one operation.
    ///
    /// Export rows carry no import-side tax and are passed through as export legs.
    pub fn assess(&self, input: &OperationInput) -> Result<Operation, TaxError> {
        if input.quantity == 0 {
            return Err(TaxError::domain(format!(
                "operation {} has zero quantity",
                input.id
            )));
        }
        if input.direction == TradeDirection::Export {
            return Ok(Operation::export_leg(
                input.id,
                &input.entity_id,
                &input.tariff_code,
                input.operation_date,
                input.quantity,
                self.values.lowest(),
            ));
        }

        let rates = &self.config.rates;
        let state_vat_rate = input.state_vat_rate.unwrap_or(rates.state_vat);
        let stack = stack::compute(
            input.fob_value,
            input.exchange_rate,
            state_vat_rate,
            rates.import_duty,
            rates.excise,
            rates.exchange_tax,
            input.customs_fees + rates.customs_fees,
        )?;
        let assessment = burden::index(
            stack.total_tax,
            stack.value_local,
            self.config.benchmark,
            &self.severity,
        )?;
        let value_class = burden::classify_value(stack.total_tax, &self.values).to_string();

        Ok(Operation::from_parts(
            input,
            state_vat_rate,
            &stack,
            assessment.burden_index,
            assessment.severity,
            value_class,
        ))
    }

    pub fn recommend(&self, op: &Operation) -> Recommendation {
        recommendation::recommend(
            op,
            self.values.rank(op.total_tax),
            self.values.len(),
            &self.config.recommendation,
        )
    }
}

/// Per-record outcome of a batch evaluation
#[derive(Debug)]
pub struct BatchOutcome {
    /// Position of the record in the input slice
    pub index: usize,
    pub id: u64,
    pub result: Result<Operation, TaxError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Evaluate every input independently; a failing record never aborts the batch.
///
/// Outcomes come back in input order.
pub fn evaluate_batch(
    inputs: &[OperationInput],
    config: &Config,
) -> Result<Vec<BatchOutcome>, TaxError> {
    let assessor = Assessor::new(config)?;
    debug!("Evaluating batch of {} operations", inputs.len());

    let outcomes: Vec<BatchOutcome> = inputs
        .par_iter()
        .enumerate()
        .map(|(index, input)| BatchOutcome {
            index,
            id: input.id,
            result: assessor.assess(input),
        })
        .collect();

    for outcome in outcomes.iter().filter(|o| !o.is_ok()) {
        if let Err(e) = &outcome.result {
            warn!("Operation {} (row {}) failed: {}", outcome.id, outcome.index, e);
        }
    }

    Ok(outcomes)
}

/// Sum of total tax over successfully evaluated records
pub fn total_tax(outcomes: &[BatchOutcome]) -> Decimal {
    outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .map(|op| op.total_tax)
        .sum()
}
