use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{DrawbackLink, Operation, SeverityCategory, TradeDirection};
use crate::utils::{round_index, round_money};

/// Aggregate view of a batch of evaluated imports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub count: usize,
    pub failed: usize,
    pub total_tax: Decimal,
    pub mean_total_tax: Decimal,
    pub mean_burden_index: Decimal,
    pub by_severity: BTreeMap<SeverityCategory, usize>,
    pub by_value_class: BTreeMap<String, usize>,
    /// Critical plus Overloaded operations
    pub alerts: usize,
    /// Duties recoverable through drawback, when links were computed
    pub recoverable_potential: Option<Decimal>,
}

pub fn summarize(operations: &[Operation], failed: usize) -> SimulationSummary {
    let imports: Vec<&Operation> = operations
        .iter()
        .filter(|op| op.direction == TradeDirection::Import)
        .collect();

    let mut by_severity: BTreeMap<SeverityCategory, usize> =
        SeverityCategory::ALL.iter().map(|c| (*c, 0)).collect();
    let mut by_value_class = BTreeMap::new();
    for op in &imports {
        *by_severity.entry(op.severity_category).or_insert(0) += 1;
        *by_value_class.entry(op.value_class.clone()).or_insert(0) += 1;
    }

    let total_tax: Decimal = imports.iter().map(|op| op.total_tax).sum();
    let index_sum: Decimal = imports.iter().map(|op| op.burden_index).sum();
    let (mean_total_tax, mean_burden_index) = if imports.is_empty() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let n = Decimal::from(imports.len());
        (round_money(total_tax / n), round_index(index_sum / n))
    };

    SimulationSummary {
        count: imports.len(),
        failed,
        total_tax,
        mean_total_tax,
        mean_burden_index,
        alerts: imports.iter().filter(|op| op.severity_category.is_alert()).count(),
        by_severity,
        by_value_class,
        recoverable_potential: None,
    }
}

impl SimulationSummary {
    /// Attach the drawback potential, counting each linked import once
    pub fn with_drawback<'a>(
        mut self,
        links: impl IntoIterator<Item = &'a DrawbackLink>,
    ) -> Self {
        let mut per_import = BTreeMap::new();
        for link in links {
            per_import.insert(link.import_operation_id, link.recoverable_amount);
        }
        self.recoverable_potential = Some(per_import.values().copied().sum());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn import(id: u64, tax: Decimal, index: Decimal, severity: SeverityCategory, class: &str) -> Operation {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut op = Operation::export_leg(id, "A", "8471", date, 100, class);
        op.direction = TradeDirection::Import;
        op.total_tax = tax;
        op.burden_index = index;
        op.severity_category = severity;
        op
    }

    #[test]
    fn test_summary_counts_and_means() {
        let ops = vec![
            import(1, dec!(100.00), dec!(0.400), SeverityCategory::Low, "LIGHT"),
            import(2, dec!(300.00), dec!(1.600), SeverityCategory::Critical, "LIGHT"),
            import(3, dec!(200.01), dec!(2.500), SeverityCategory::Overloaded, "MEDIUM"),
        ];
        let summary = summarize(&ops, 1);

        assert_eq!(summary.count, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_tax, dec!(600.01));
        assert_eq!(summary.mean_total_tax, dec!(200.00));
        assert_eq!(summary.mean_burden_index, dec!(1.5));
        assert_eq!(summary.alerts, 2);
        assert_eq!(summary.by_severity[&SeverityCategory::Low], 1);
        assert_eq!(summary.by_severity[&SeverityCategory::High], 0);
        assert_eq!(summary.by_value_class["LIGHT"], 2);
        assert_eq!(summary.recoverable_potential, None);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], 0);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean_total_tax, Decimal::ZERO);
        assert_eq!(summary.by_severity.len(), 5);
    }

    #[test]
    fn test_drawback_potential_counts_imports_once() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let link = |import_id: u64, export_id: u64| DrawbackLink {
            entity_id: "A".to_string(),
            tariff_code: "8471".to_string(),
            import_operation_id: import_id,
            export_operation_id: export_id,
            import_date: date,
            export_date: date,
            import_quantity: 100,
            export_quantity: 100,
            matched_quantity_ratio: Decimal::ONE,
            recoverable_amount: dec!(10) * Decimal::from(import_id),
        };
        let links = vec![link(1, 10), link(1, 11), link(2, 12)];
        let summary = summarize(&[], 0).with_drawback(&links);
        assert_eq!(summary.recoverable_potential, Some(dec!(30)));
    }
}
