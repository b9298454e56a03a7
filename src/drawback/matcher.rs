use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use rayon::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::TaxError;
use crate::models::{DrawbackLink, Operation, TradeDirection};

/// Eligibility rules for linking an import to a later export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawbackRules {
    /// Exports must happen within this many days after the import (inclusive)
    pub window_days: u32,
    /// Export quantity must be at least this share of the imported quantity
    pub min_quantity_ratio: Decimal,
}

impl Default for DrawbackRules {
    fn default() -> Self {
        Self {
            window_days: 365,
            min_quantity_ratio: Decimal::new(9, 1),
        }
    }
}

impl DrawbackRules {
    pub fn with_window(window_days: u32) -> Self {
        Self {
            window_days,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TaxError> {
        if self.window_days == 0 {
            return Err(TaxError::config("drawback window must be at least one day"));
        }
        if self.min_quantity_ratio <= Decimal::ZERO || self.min_quantity_ratio > Decimal::ONE {
            return Err(TaxError::config(format!(
                "minimum quantity ratio must be within (0, 1], got {}",
                self.min_quantity_ratio
            )));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::days(i64::from(self.window_days))
    }

    /// Last export date still inside the window; saturates at the calendar end
    fn window_end(&self, import_date: NaiveDate) -> NaiveDate {
        import_date
            .checked_add_signed(self.window())
            .unwrap_or(NaiveDate::MAX)
    }

    fn quantity_qualifies(&self, import_quantity: u32, export_quantity: u32) -> bool {
        Decimal::from(export_quantity) >= self.min_quantity_ratio * Decimal::from(import_quantity)
    }
}

/// Decimal places kept on a stored quantity ratio
const RATIO_DP: u32 = 4;

/// Share of the imported quantity covered by the export, capped at 1.
///
/// Truncated to four places, or to the minimum's own scale when finer, so a
/// qualifying link never stores a ratio below `min_quantity_ratio`.
fn quantity_ratio(import_quantity: u32, export_quantity: u32, rules: &DrawbackRules) -> Decimal {
    if import_quantity == 0 {
        return Decimal::ZERO;
    }
    let ratio = Decimal::from(export_quantity) / Decimal::from(import_quantity);
    let dp = RATIO_DP.max(rules.min_quantity_ratio.scale());
    ratio
        .min(Decimal::ONE)
        .round_dp_with_strategy(dp, RoundingStrategy::ToZero)
        .normalize()
}

fn link(import: &Operation, export: &Operation, rules: &DrawbackRules) -> DrawbackLink {
    DrawbackLink {
        entity_id: import.entity_id.clone(),
        tariff_code: import.tariff_code.clone(),
        import_operation_id: import.id,
        export_operation_id: export.id,
        import_date: import.operation_date,
        export_date: export.operation_date,
        import_quantity: import.quantity,
        export_quantity: export.quantity,
        matched_quantity_ratio: quantity_ratio(import.quantity, export.quantity, rules),
        recoverable_amount: import.recoverable_duties(),
    }
}

/// Link every import of `entity_id` to each export that qualifies for drawback.
///
/// An export qualifies when it belongs to the same entity, has the same tariff
/// code, falls within `[import_date, import_date + window]` and ships at least
/// `min_quantity_ratio` of the imported quantity. One import may link to
/// several exports (partial shipments). Links follow import order, then export
/// order. Records with the wrong direction are ignored.
pub fn match_entity(
    imports: &[Operation],
    exports: &[Operation],
    entity_id: &str,
    rules: &DrawbackRules,
) -> Vec<DrawbackLink> {
    let entity_exports: Vec<&Operation> = exports
        .iter()
        .filter(|e| e.entity_id == entity_id && e.direction == TradeDirection::Export)
        .collect();
    if entity_exports.is_empty() {
        return Vec::new();
    }

    let mut links = Vec::new();
    for import in imports
        .iter()
        .filter(|i| i.entity_id == entity_id && i.direction == TradeDirection::Import)
    {
        if import.quantity == 0 {
            continue;
        }
        let window_end = rules.window_end(import.operation_date);
        links.extend(
            entity_exports
                .iter()
                .filter(|export| {
                    export.tariff_code == import.tariff_code
                        && export.operation_date >= import.operation_date
                        && export.operation_date <= window_end
                        && rules.quantity_qualifies(import.quantity, export.quantity)
                })
                .map(|export| link(import, export, rules)),
        );
    }

    debug!("Entity {}: {} drawback links", entity_id, links.len());
    links
}

/// Run the matcher for every entity present on both sides, in parallel.
///
/// Results are keyed by entity id; entities without links are omitted.
pub fn match_all(
    imports: &[Operation],
    exports: &[Operation],
    rules: &DrawbackRules,
) -> BTreeMap<String, Vec<DrawbackLink>> {
    let import_entities: BTreeSet<&str> = imports.iter().map(|o| o.entity_id.as_str()).collect();
    let candidates = exports
        .iter()
        .map(|o| o.entity_id.as_str())
        .filter(|entity| import_entities.contains(entity))
        .unique()
        .collect::<Vec<_>>();

    debug!(
        "{} entities with both imports and exports",
        candidates.len()
    );

    candidates
        .par_iter()
        .map(|entity| {
            (
                entity.to_string(),
                match_entity(imports, exports, entity, rules),
            )
        })
        .filter(|(_, links)| !links.is_empty())
        .collect()
}
