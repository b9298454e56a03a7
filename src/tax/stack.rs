use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxError;
use crate::utils::round_money;

/// Fixed component rates applied to every import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxRates {
    /// Import Duty (II) over the local-currency customs value
    pub import_duty: Decimal,
    /// Excise (IPI) over value + duty + exchange tax + fees
    pub excise: Decimal,
    /// Exchange-operation tax (IOF câmbio)
    pub exchange_tax: Decimal,
    /// State VAT (ICMS), grossed up over its own base
    pub state_vat: Decimal,
    /// Customs clearance fees in local currency (broker, storage)
    pub customs_fees: Decimal,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            import_duty: Decimal::new(60, 2),
            excise: Decimal::new(10, 2),
            exchange_tax: Decimal::new(38, 4),
            state_vat: Decimal::new(18, 2),
            customs_fees: Decimal::ZERO,
        }
    }
}

impl TaxRates {
    /// Check every rate lies in [0, 1) and fees are non-negative
    pub fn validate(&self) -> Result<(), TaxError> {
        check_rate("import duty", self.import_duty)?;
        check_rate("excise", self.excise)?;
        check_rate("exchange tax", self.exchange_tax)?;
        check_vat_rate(self.state_vat)?;
        if self.customs_fees < Decimal::ZERO {
            return Err(TaxError::domain(format!(
                "customs fees must be non-negative, got {}",
                self.customs_fees
            )));
        }
        Ok(())
    }
}

/// Every component of one import's tax stack, rounded to centavos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxStack {
    pub value_local: Decimal,
    pub exchange_tax: Decimal,
    pub import_duty: Decimal,
    pub excise_base: Decimal,
    pub excise_tax: Decimal,
    /// State VAT base without the VAT itself
    pub vat_base: Decimal,
    pub state_vat: Decimal,
    pub customs_fees: Decimal,
    pub total_tax: Decimal,
}

fn check_rate(name: &str, rate: Decimal) -> Result<(), TaxError> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(TaxError::domain(format!(
            "invalid {} rate: {} (expected 0 <= rate < 1)",
            name, rate
        )));
    }
    Ok(())
}

fn check_vat_rate(rate: Decimal) -> Result<(), TaxError> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(TaxError::domain(format!("invalid VAT rate: {}", rate)));
    }
    Ok(())
}

fn overflow(step: &str) -> TaxError {
    TaxError::domain(format!("arithmetic overflow computing {}", step))
}

fn mul(a: Decimal, b: Decimal, step: &str) -> Result<Decimal, TaxError> {
    a.checked_mul(b).ok_or_else(|| overflow(step))
}

fn add_all(values: &[Decimal], step: &str) -> Result<Decimal, TaxError> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| overflow(step))
}

/// Compute the import tax stack for one operation.
///
/// Each component is rounded to two places (half away from zero) before it is
/// used by the next step, and `total_tax` is the sum of the rounded parts.
/// State VAT is calculated "por dentro": `base * rate / (1 - rate)`.
pub fn compute(
    fob_value: Decimal,
    exchange_rate: Decimal,
    state_vat_rate: Decimal,
    import_duty_rate: Decimal,
    excise_rate: Decimal,
    exchange_tax_rate: Decimal,
    customs_fees: Decimal,
) -> Result<TaxStack, TaxError> {
    if fob_value <= Decimal::ZERO {
        return Err(TaxError::domain(format!(
            "FOB value must be positive, got {}",
            fob_value
        )));
    }
    if exchange_rate <= Decimal::ZERO {
        return Err(TaxError::domain(format!(
            "exchange rate must be positive, got {}",
            exchange_rate
        )));
    }
    if customs_fees < Decimal::ZERO {
        return Err(TaxError::domain(format!(
            "customs fees must be non-negative, got {}",
            customs_fees
        )));
    }
    check_vat_rate(state_vat_rate)?;
    check_rate("import duty", import_duty_rate)?;
    check_rate("excise", excise_rate)?;
    check_rate("exchange tax", exchange_tax_rate)?;

    let customs_fees = round_money(customs_fees);

    let value_local = round_money(mul(fob_value, exchange_rate, "local value")?);
    let exchange_tax = round_money(mul(value_local, exchange_tax_rate, "exchange tax")?);
    let import_duty = round_money(mul(value_local, import_duty_rate, "import duty")?);

    let excise_base = add_all(
        &[value_local, import_duty, exchange_tax, customs_fees],
        "excise base",
    )?;
    let excise_tax = round_money(mul(excise_base, excise_rate, "excise")?);

    let vat_base = add_all(
        &[value_local, import_duty, excise_tax, exchange_tax, customs_fees],
        "VAT base",
    )?;
    let gross_up = mul(vat_base, state_vat_rate, "state VAT")?
        .checked_div(Decimal::ONE - state_vat_rate)
        .ok_or_else(|| overflow("state VAT"))?;
    let state_vat = round_money(gross_up);

    let total_tax = add_all(
        &[import_duty, excise_tax, state_vat, exchange_tax, customs_fees],
        "total tax",
    )?;

    Ok(TaxStack {
        value_local,
        exchange_tax,
        import_duty,
        excise_base,
        excise_tax,
        vat_base,
        state_vat,
        customs_fees,
        total_tax,
    })
}

/// Compute the stack with configured rates, overriding the state VAT rate
pub fn compute_with_rates(
    fob_value: Decimal,
    exchange_rate: Decimal,
    state_vat_rate: Decimal,
    rates: &TaxRates,
    customs_fees: Decimal,
) -> Result<TaxStack, TaxError> {
    compute(
        fob_value,
        exchange_rate,
        state_vat_rate,
        rates.import_duty,
        rates.excise,
        rates.exchange_tax,
        customs_fees,
    )
}
