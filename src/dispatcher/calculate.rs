use anyhow::Result;
use rust_decimal::Decimal;
use tracing::info;

use tributec::models::{OperationInput, TradeDirection};
use tributec::tax::{compute_with_rates, what_if, Assessor};
use tributec::Config;

use crate::cli::formatters;

pub struct CalculateArgs {
    pub fob: Decimal,
    pub rate: Decimal,
    pub vat: Option<Decimal>,
    pub duty: Option<Decimal>,
    pub excise: Option<Decimal>,
    pub iof: Option<Decimal>,
    pub fees: Decimal,
    pub tariff: String,
    pub what_if: bool,
}

pub fn dispatch_calculate(mut config: Config, args: CalculateArgs, json_output: bool) -> Result<()> {
    if let Some(duty) = args.duty {
        config.rates.import_duty = duty;
    }
    if let Some(excise) = args.excise {
        config.rates.excise = excise;
    }
    if let Some(iof) = args.iof {
        config.rates.exchange_tax = iof;
    }
    config.validate()?;

    let state_vat_rate = args.vat.unwrap_or(config.rates.state_vat);
    info!(
        "Calculating tax stack for FOB {} at {} (ICMS {})",
        args.fob, args.rate, state_vat_rate
    );

    let stack = compute_with_rates(
        args.fob,
        args.rate,
        state_vat_rate,
        &config.rates,
        args.fees + config.rates.customs_fees,
    )?;

    let input = OperationInput {
        id: 1,
        direction: TradeDirection::Import,
        entity_id: String::new(),
        tariff_code: args.tariff,
        fob_value: args.fob,
        exchange_rate: args.rate,
        state_vat_rate: Some(state_vat_rate),
        customs_fees: args.fees,
        operation_date: chrono::Local::now().date_naive(),
        quantity: 1,
    };
    let assessor = Assessor::new(&config)?;
    let operation = assessor.assess(&input)?;
    let recommendation = assessor.recommend(&operation);
    let scenarios = if args.what_if {
        what_if(&operation, &config)?
    } else {
        Vec::new()
    };

    if json_output {
        let mut payload = serde_json::json!({
            "stack": stack,
            "burden_index": operation.burden_index,
            "severity_category": operation.severity_category,
            "value_class": operation.value_class,
            "benchmark": config.benchmark,
            "recommendation": recommendation,
        });
        if args.what_if {
            payload["scenarios"] = serde_json::to_value(&scenarios)?;
        }
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{}", formatters::format_stack(&operation, &stack, recommendation));
    if args.what_if {
        println!("{}", formatters::format_scenarios(&operation, &scenarios));
    }
    Ok(())
}
