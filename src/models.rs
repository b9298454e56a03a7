use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tax::TaxStack;

/// Direction of a trade operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    #[serde(alias = "IMPORTACAO")]
    Import,
    #[serde(alias = "EXPORTACAO")]
    Export,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Import => "IMPORT",
            TradeDirection::Export => "EXPORT",
        }
    }
}

impl FromStr for TradeDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IMPORT" | "IMPORTACAO" => Ok(TradeDirection::Import),
            "EXPORT" | "EXPORTACAO" => Ok(TradeDirection::Export),
            _ => Err(()),
        }
    }
}

/// Severity of the tax burden, ordered from lightest to heaviest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityCategory {
    Low,
    Moderate,
    High,
    Critical,
    Overloaded,
}

impl SeverityCategory {
    pub const ALL: [SeverityCategory; 5] = [
        SeverityCategory::Low,
        SeverityCategory::Moderate,
        SeverityCategory::High,
        SeverityCategory::Critical,
        SeverityCategory::Overloaded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityCategory::Low => "LOW",
            SeverityCategory::Moderate => "MODERATE",
            SeverityCategory::High => "HIGH",
            SeverityCategory::Critical => "CRITICAL",
            SeverityCategory::Overloaded => "OVERLOADED",
        }
    }

    /// Critical and Overloaded operations are flagged in summaries
    pub fn is_alert(&self) -> bool {
        matches!(self, SeverityCategory::Critical | SeverityCategory::Overloaded)
    }
}

impl fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(SeverityCategory::Low),
            "MODERATE" => Ok(SeverityCategory::Moderate),
            "HIGH" => Ok(SeverityCategory::High),
            "CRITICAL" => Ok(SeverityCategory::Critical),
            "OVERLOADED" => Ok(SeverityCategory::Overloaded),
            _ => Err(()),
        }
    }
}

/// Raw fields of an operation before any tax is derived.
///
/// Produced by the simulator or read from a CSV of real operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationInput {
    pub id: u64,
    pub direction: TradeDirection,
    pub entity_id: String,
    pub tariff_code: String,
    pub fob_value: Decimal,
    pub exchange_rate: Decimal,
    /// Falls back to the configured state VAT rate when absent
    #[serde(default)]
    pub state_vat_rate: Option<Decimal>,
    #[serde(default)]
    pub customs_fees: Decimal,
    pub operation_date: NaiveDate,
    pub quantity: u32,
}

/// A fully evaluated import or export operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub id: u64,
    pub direction: TradeDirection,
    pub entity_id: String,
    pub tariff_code: String,
    pub operation_date: NaiveDate,
    pub quantity: u32,
    pub fob_value: Decimal,
    pub exchange_rate: Decimal,
    pub state_vat_rate: Decimal,
    pub value_local: Decimal,
    pub import_duty: Decimal,
    pub excise_tax: Decimal,
    pub state_vat: Decimal,
    pub exchange_tax: Decimal,
    pub customs_fees: Decimal,
    pub total_tax: Decimal,
    pub burden_index: Decimal,
    pub severity_category: SeverityCategory,
    pub value_class: String,
}

impl Operation {
    /// Build an operation record from its raw input and computed tax stack
    pub fn from_parts(
        input: &OperationInput,
        state_vat_rate: Decimal,
        stack: &TaxStack,
        burden_index: Decimal,
        severity_category: SeverityCategory,
        value_class: String,
    ) -> Self {
        Self {
            id: input.id,
            direction: input.direction,
            entity_id: input.entity_id.clone(),
            tariff_code: input.tariff_code.clone(),
            operation_date: input.operation_date,
            quantity: input.quantity,
            fob_value: input.fob_value,
            exchange_rate: input.exchange_rate,
            state_vat_rate,
            value_local: stack.value_local,
            import_duty: stack.import_duty,
            excise_tax: stack.excise_tax,
            state_vat: stack.state_vat,
            exchange_tax: stack.exchange_tax,
            customs_fees: stack.customs_fees,
            total_tax: stack.total_tax,
            burden_index,
            severity_category,
            value_class,
        }
    }

    /// Export leg of a trade: carries no import-side tax.
    pub fn export_leg(
        id: u64,
        entity_id: &str,
        tariff_code: &str,
        operation_date: NaiveDate,
        quantity: u32,
        lowest_value_class: &str,
    ) -> Self {
        Self {
            id,
            direction: TradeDirection::Export,
            entity_id: entity_id.to_string(),
            tariff_code: tariff_code.to_string(),
            operation_date,
            quantity,
            fob_value: Decimal::ZERO,
            exchange_rate: Decimal::ZERO,
            state_vat_rate: Decimal::ZERO,
            value_local: Decimal::ZERO,
            import_duty: Decimal::ZERO,
            excise_tax: Decimal::ZERO,
            state_vat: Decimal::ZERO,
            exchange_tax: Decimal::ZERO,
            customs_fees: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            burden_index: Decimal::ZERO,
            severity_category: SeverityCategory::Low,
            value_class: lowest_value_class.to_string(),
        }
    }

    /// Duties recoverable under drawback: import duty plus excise.
    pub fn recoverable_duties(&self) -> Decimal {
        match self.direction {
            TradeDirection::Import => self.import_duty + self.excise_tax,
            TradeDirection::Export => Decimal::ZERO,
        }
    }

    /// Sum of the stored components, for invariant checks
    pub fn component_sum(&self) -> Decimal {
        self.import_duty + self.excise_tax + self.state_vat + self.exchange_tax + self.customs_fees
    }
}

/// A matched import/export pair eligible for drawback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawbackLink {
    pub entity_id: String,
    pub tariff_code: String,
    pub import_operation_id: u64,
    pub export_operation_id: u64,
    pub import_date: NaiveDate,
    pub export_date: NaiveDate,
    pub import_quantity: u32,
    pub export_quantity: u32,
    pub matched_quantity_ratio: Decimal,
    pub recoverable_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_severity_total_order() {
        let mut sorted = SeverityCategory::ALL;
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted, SeverityCategory::ALL);
        assert!(SeverityCategory::Low < SeverityCategory::Overloaded);
    }

    #[test]
    fn test_severity_round_trips_through_str() {
        for category in SeverityCategory::ALL {
            assert_eq!(SeverityCategory::from_str(category.as_str()), Ok(category));
        }
        assert!(SeverityCategory::from_str("extreme").is_err());
    }

    #[test]
    fn test_direction_accepts_portuguese_labels() {
        assert_eq!(TradeDirection::from_str("importacao"), Ok(TradeDirection::Import));
        assert_eq!(TradeDirection::from_str(" EXPORT "), Ok(TradeDirection::Export));
        assert!(TradeDirection::from_str("transfer").is_err());
    }

    #[test]
    fn test_export_leg_has_no_recoverable_duty() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut export = Operation::export_leg(7, "12345678", "8471", date, 95, "LIGHT");
        export.import_duty = dec!(100);
        assert_eq!(export.recoverable_duties(), Decimal::ZERO);
        assert_eq!(export.total_tax, Decimal::ZERO);
        assert_eq!(export.direction, TradeDirection::Export);
    }
}
