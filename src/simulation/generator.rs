use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::Config;
use crate::error::TaxError;
use crate::models::{OperationInput, TradeDirection};

const CENTS: i64 = 100;
const RATE_STEPS: i64 = 10_000;

fn scaled(value: Decimal, factor: i64, what: &str) -> Result<i64, TaxError> {
    (value * Decimal::from(factor))
        .trunc()
        .to_i64()
        .ok_or_else(|| TaxError::config(format!("{} {} is out of range", what, value)))
}

/// Uniform value in `[min, max)` at centavo resolution, never zero
fn draw_fob<R: Rng + ?Sized>(rng: &mut R, min: Decimal, max: Decimal) -> Result<Decimal, TaxError> {
    let low = scaled(min, CENTS, "bucket bound")?.max(1);
    let high = scaled(max, CENTS, "bucket bound")?;
    if high <= low {
        return Err(TaxError::config(format!(
            "value bucket [{}, {}) is too narrow to sample",
            min, max
        )));
    }
    Ok(Decimal::new(rng.gen_range(low..high), 2))
}

/// Uniform rate in `[min, max]` with four decimal places
fn draw_exchange_rate<R: Rng + ?Sized>(
    rng: &mut R,
    min: Decimal,
    max: Decimal,
) -> Result<Decimal, TaxError> {
    let low = scaled(min, RATE_STEPS, "exchange rate")?.max(1);
    let high = scaled(max, RATE_STEPS, "exchange rate")?.max(low);
    Ok(Decimal::new(rng.gen_range(low..=high), 4))
}

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T], what: &str) -> Result<&'a T, TaxError> {
    items
        .choose(rng)
        .ok_or_else(|| TaxError::config(format!("no {} configured", what)))
}

/// Draw the raw fields of one synthetic import.
///
/// Everything random comes from `rng`, so a seeded source reproduces the same
/// operation. The open-ended top bucket is never sampled.
pub fn generate<R: Rng + ?Sized>(
    config: &Config,
    id: u64,
    rng: &mut R,
) -> Result<OperationInput, TaxError> {
    let sim = &config.simulation;

    let buckets = config.sampling_buckets();
    let bucket = pick(rng, &buckets, "bounded value bucket")?;
    let max = bucket
        .max
        .ok_or_else(|| TaxError::config("sampling bucket has no upper bound"))?;
    let fob_value = draw_fob(rng, bucket.min, max)?;

    let exchange_rate = draw_exchange_rate(rng, sim.exchange_rate_min, sim.exchange_rate_max)?;
    let tariff_code = pick(rng, &config.tariff_focus, "focus tariff code")?.clone();
    let state_vat_rate = if sim.state_vat_choices.is_empty() {
        None
    } else {
        Some(*pick(rng, &sim.state_vat_choices, "state VAT rate")?)
    };
    let entity_id = pick(rng, &sim.entity_ids, "entity id")?.clone();
    let offset = rng.gen_range(0..=i64::from(sim.date_spread_days));

    Ok(OperationInput {
        id,
        direction: TradeDirection::Import,
        entity_id,
        tariff_code,
        fob_value,
        exchange_rate,
        state_vat_rate,
        customs_fees: Decimal::ZERO,
        operation_date: sim.base_date + Duration::days(offset),
        quantity: sim.quantity,
    })
}
