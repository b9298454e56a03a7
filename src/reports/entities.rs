use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Operation, TradeDirection};
use crate::utils::round_index;

/// One of an entity's most taxed imports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxedOperation {
    pub id: u64,
    pub tariff_code: String,
    pub operation_date: chrono::NaiveDate,
    pub total_tax: Decimal,
    pub burden_index: Decimal,
}

impl From<&Operation> for TaxedOperation {
    fn from(op: &Operation) -> Self {
        Self {
            id: op.id,
            tariff_code: op.tariff_code.clone(),
            operation_date: op.operation_date,
            total_tax: op.total_tax,
            burden_index: op.burden_index,
        }
    }
}

/// Import tax profile of a single entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityProfile {
    pub entity_id: String,
    pub operation_count: usize,
    pub value_local_total: Decimal,
    pub total_tax: Decimal,
    /// Taxes over customs value, 3 dp
    pub tax_share: Decimal,
    /// `tax_share` above the configured alert level
    pub alert: bool,
    /// Most taxed imports first
    pub top_operations: Vec<TaxedOperation>,
}

/// Group imports by entity and rank each entity's operations by total tax.
///
/// Export legs are skipped. Profiles come back heaviest entity first; ties
/// keep entity id order.
pub fn profile_entities(
    operations: &[Operation],
    top_n: usize,
    alert_share: Decimal,
) -> Vec<EntityProfile> {
    let mut by_entity: BTreeMap<&str, Vec<&Operation>> = BTreeMap::new();
    for op in operations
        .iter()
        .filter(|op| op.direction == TradeDirection::Import)
    {
        by_entity.entry(op.entity_id.as_str()).or_default().push(op);
    }

    let mut profiles: Vec<EntityProfile> = by_entity
        .into_iter()
        .map(|(entity_id, mut ops)| {
            let value_local_total: Decimal = ops.iter().map(|op| op.value_local).sum();
            let total_tax: Decimal = ops.iter().map(|op| op.total_tax).sum();
            let tax_share = if value_local_total > Decimal::ZERO {
                round_index(total_tax / value_local_total)
            } else {
                Decimal::ZERO
            };

            ops.sort_by(|a, b| b.total_tax.cmp(&a.total_tax).then(a.id.cmp(&b.id)));

            EntityProfile {
                entity_id: entity_id.to_string(),
                operation_count: ops.len(),
                value_local_total,
                total_tax,
                tax_share,
                alert: tax_share > alert_share,
                top_operations: ops.into_iter().take(top_n).map(TaxedOperation::from).collect(),
            }
        })
        .collect();

    profiles.sort_by(|a, b| b.total_tax.cmp(&a.total_tax));
    profiles
}
