use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{DrawbackLink, Operation};

/// Drawback modality recommended for matched operations
pub const DEFAULT_REGIME: &str = "EXEMPTION";

/// Recoverable duties for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawbackSummary {
    pub entity_id: String,
    pub link_count: usize,
    pub linked_imports: usize,
    pub tariff_codes: Vec<String>,
    pub import_duty_total: Decimal,
    pub excise_total: Decimal,
    pub recoverable_total: Decimal,
    pub regime: String,
}

/// Aggregate an entity's links into a savings estimate.
///
/// Each import counts once even when it links to several exports, so the
/// total never exceeds the duties actually paid. Imports referenced by a link
/// but absent from `imports` contribute nothing.
pub fn summarize(entity_id: &str, links: &[DrawbackLink], imports: &[Operation]) -> DrawbackSummary {
    let by_id: HashMap<u64, &Operation> = imports
        .iter()
        .filter(|op| op.entity_id == entity_id)
        .map(|op| (op.id, op))
        .collect();

    let mut seen = HashSet::new();
    let mut tariff_codes = BTreeSet::new();
    let mut import_duty_total = Decimal::ZERO;
    let mut excise_total = Decimal::ZERO;

    for link in links.iter().filter(|l| l.entity_id == entity_id) {
        tariff_codes.insert(link.tariff_code.clone());
        if !seen.insert(link.import_operation_id) {
            continue;
        }
        if let Some(import) = by_id.get(&link.import_operation_id) {
            import_duty_total += import.import_duty;
            excise_total += import.excise_tax;
        }
    }

    DrawbackSummary {
        entity_id: entity_id.to_string(),
        link_count: links.iter().filter(|l| l.entity_id == entity_id).count(),
        linked_imports: seen.len(),
        tariff_codes: tariff_codes.into_iter().collect(),
        import_duty_total,
        excise_total,
        recoverable_total: import_duty_total + excise_total,
        regime: DEFAULT_REGIME.to_string(),
    }
}
