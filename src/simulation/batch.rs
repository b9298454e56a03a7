use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::generator::generate;
use crate::config::Config;
use crate::error::TaxError;
use crate::models::{Operation, TradeDirection};
use crate::tax::{Assessor, BatchOutcome};

/// Stream tag mixed into the seed for export-leg draws
const EXPORT_STREAM: u64 = 0x4558_504F_5254_0001;

/// How a batch is spread over threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

/// SplitMix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Independent random source for record `index` of a seeded run.
///
/// Each record owns its stream, so results do not depend on which thread
/// draws them or in which order.
pub fn record_rng(seed: u64, index: u64) -> StdRng {
    StdRng::seed_from_u64(mix(seed ^ mix(index)))
}

/// Outcome of a simulated batch, in record order
#[derive(Debug)]
pub struct SimulationRun {
    pub seed: u64,
    pub outcomes: Vec<BatchOutcome>,
}

impl SimulationRun {
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.outcomes.into_iter().filter_map(|o| o.result.ok()).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &TaxError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)))
    }
}

fn simulate_one(assessor: &Assessor<'_>, seed: u64, index: usize) -> BatchOutcome {
    let id = index as u64 + 1;
    let mut rng = record_rng(seed, index as u64);
    let result = generate(assessor.config(), id, &mut rng).and_then(|input| assessor.assess(&input));
    BatchOutcome { index, id, result }
}

/// Generate and evaluate `count` synthetic imports.
///
/// Sequential and parallel modes produce the same records in the same order
/// for a given seed. Operation ids are `1..=count`.
pub fn simulate(
    config: &Config,
    count: usize,
    seed: u64,
    mode: ExecutionMode,
) -> Result<SimulationRun, TaxError> {
    let assessor = Assessor::new(config)?;
    info!("Simulating {} operations (seed {}, {:?})", count, seed, mode);

    let outcomes: Vec<BatchOutcome> = match mode {
        ExecutionMode::Sequential => (0..count)
            .map(|index| simulate_one(&assessor, seed, index))
            .collect(),
        ExecutionMode::Parallel => (0..count)
            .into_par_iter()
            .map(|index| simulate_one(&assessor, seed, index))
            .collect(),
    };

    let run = SimulationRun { seed, outcomes };
    debug!("{} operations failed", run.failures().count());
    Ok(run)
}

/// Build export legs for a seeded share of the imports.
///
/// A selected import gets one export of the same entity and tariff code,
/// dated within the configured delay range and shipping 90% to 100% of the
/// imported quantity. Export ids continue after the highest import id.
pub fn simulate_exports(
    imports: &[Operation],
    config: &Config,
    seed: u64,
) -> Result<Vec<Operation>, TaxError> {
    let sim = &config.simulation;
    let lowest_class = config.value_table()?.lowest().clone();
    let threshold = (sim.export_fraction * Decimal::from(10_000))
        .trunc()
        .to_u32()
        .unwrap_or(0);

    let mut next_id = imports.iter().map(|op| op.id).max().unwrap_or(0) + 1;
    let mut exports = Vec::new();

    for import in imports
        .iter()
        .filter(|op| op.direction == TradeDirection::Import && op.quantity > 0)
    {
        let mut rng = record_rng(seed ^ EXPORT_STREAM, import.id);
        if rng.gen_range(0..10_000u32) >= threshold {
            continue;
        }
        let delay = rng.gen_range(sim.export_delay_min_days..=sim.export_delay_max_days);
        let min_quantity = import.quantity - import.quantity / 10;
        let quantity = rng.gen_range(min_quantity..=import.quantity);

        exports.push(Operation::export_leg(
            next_id,
            &import.entity_id,
            &import.tariff_code,
            import.operation_date + Duration::days(i64::from(delay)),
            quantity,
            &lowest_class,
        ));
        next_id += 1;
    }

    info!(
        "Simulated {} export legs for {} imports",
        exports.len(),
        imports.len()
    );
    Ok(exports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawback::{match_all, DrawbackRules};

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = Config::default();
        let a = simulate(&config, 50, 42, ExecutionMode::Sequential).unwrap();
        let b = simulate(&config, 50, 42, ExecutionMode::Sequential).unwrap();
        let a: Vec<Operation> = a.into_operations();
        let b: Vec<Operation> = b.into_operations();
        assert_eq!(a.len(), 50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = Config::default();
        let seq = simulate(&config, 200, 7, ExecutionMode::Sequential)
            .unwrap()
            .into_operations();
        let par = simulate(&config, 200, 7, ExecutionMode::Parallel)
            .unwrap()
            .into_operations();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = Config::default();
        let a = simulate(&config, 20, 1, ExecutionMode::Sequential)
            .unwrap()
            .into_operations();
        let b = simulate(&config, 20, 2, ExecutionMode::Sequential)
            .unwrap()
            .into_operations();
        assert_ne!(a, b);
    }

    #[test]
    fn test_simulated_operations_hold_invariants() {
        let config = Config::default();
        let run = simulate(&config, 300, 11, ExecutionMode::Parallel).unwrap();
        assert_eq!(run.failures().count(), 0);
        for (expected_id, op) in (1u64..).zip(run.operations()) {
            assert_eq!(op.id, expected_id);
            assert_eq!(op.total_tax, op.component_sum());
            assert!(op.burden_index >= Decimal::ZERO);
            assert_eq!(op.direction, TradeDirection::Import);
        }
    }

    #[test]
    fn test_zero_count_is_empty_run() {
        let run = simulate(&Config::default(), 0, 1, ExecutionMode::Parallel).unwrap();
        assert!(run.outcomes.is_empty());
    }

    #[test]
    fn test_simulated_exports_link_back_to_imports() {
        let config = Config::default();
        let imports = simulate(&config, 200, 5, ExecutionMode::Parallel)
            .unwrap()
            .into_operations();
        let exports = simulate_exports(&imports, &config, 5).unwrap();

        assert!(!exports.is_empty());
        assert!(exports.len() < imports.len());
        assert!(exports.iter().all(|e| e.id > 200));
        assert!(exports.iter().all(|e| e.recoverable_duties() == Decimal::ZERO));
        assert_eq!(exports, simulate_exports(&imports, &config, 5).unwrap());

        // every export ships >= 90% within the 365-day window, so each links
        let links = match_all(&imports, &exports, &DrawbackRules::default());
        let linked_exports: std::collections::HashSet<u64> = links
            .values()
            .flatten()
            .map(|l| l.export_operation_id)
            .collect();
        assert_eq!(linked_exports.len(), exports.len());
    }

    #[test]
    fn test_export_fraction_bounds() {
        let mut config = Config::default();
        let imports = simulate(&config, 30, 3, ExecutionMode::Sequential)
            .unwrap()
            .into_operations();

        config.simulation.export_fraction = Decimal::ZERO;
        assert!(simulate_exports(&imports, &config, 3).unwrap().is_empty());

        config.simulation.export_fraction = Decimal::ONE;
        assert_eq!(simulate_exports(&imports, &config, 3).unwrap().len(), 30);
    }

    #[test]
    fn test_export_quantity_for_very_large_imports() {
        let mut config = Config::default();
        config.simulation.export_fraction = Decimal::ONE;
        assert!(config.validate().is_ok());

        let mut imports = simulate(&config, 5, 9, ExecutionMode::Sequential)
            .unwrap()
            .into_operations();
        let quantities = [500_000_000, u32::MAX, 10, 9, 1];
        for (op, quantity) in imports.iter_mut().zip(quantities) {
            op.quantity = quantity;
        }

        let exports = simulate_exports(&imports, &config, 9).unwrap();
        assert_eq!(exports.len(), 5);
        for (import, export) in imports.iter().zip(&exports) {
            // at least 90% of the import, rounded up
            let min = (u64::from(import.quantity) * 9).div_ceil(10);
            assert!(u64::from(export.quantity) >= min);
            assert!(export.quantity <= import.quantity);
        }
        assert!(exports[0].quantity >= 450_000_000);
    }
}
