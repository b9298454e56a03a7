//! Command dispatcher that routes parsed clap commands to their handlers.

mod calculate;
mod config;
mod drawback;
mod entities;
mod evaluate;
mod simulate;

use anyhow::Result;
use tributec::Config;

use crate::cli::{Cli, Commands};

/// Route a parsed command line to its handler
pub fn dispatch(cli: Cli) -> Result<()> {
    let json_output = cli.json;
    let config_path = cli.config;
    let load_config = || Config::resolve(config_path.as_deref());

    match cli.command {
        Commands::Config { action } => {
            config::dispatch_config(action, config_path.as_deref(), json_output)
        }
        Commands::Calculate {
            fob,
            rate,
            vat,
            duty,
            excise,
            iof,
            fees,
            tariff,
            what_if,
        } => calculate::dispatch_calculate(
            load_config()?,
            calculate::CalculateArgs {
                fob,
                rate,
                vat,
                duty,
                excise,
                iof,
                fees,
                tariff,
                what_if,
            },
            json_output,
        ),
        Commands::Simulate {
            count,
            seed,
            sequential,
            with_exports,
            output,
        } => simulate::dispatch_simulate(
            &load_config()?,
            simulate::SimulateArgs {
                count,
                seed,
                sequential,
                with_exports,
                output,
            },
            json_output,
        ),
        Commands::Evaluate { file, output } => {
            evaluate::dispatch_evaluate(&load_config()?, &file, output.as_deref(), json_output)
        }
        Commands::Drawback {
            imports,
            exports,
            entity,
            window,
            output,
        } => drawback::dispatch_drawback(
            &load_config()?,
            drawback::DrawbackArgs {
                imports,
                exports,
                entity,
                window,
                output,
            },
            json_output,
        ),
        Commands::Entities { file, top, entity } => entities::dispatch_entities(
            &load_config()?,
            &file,
            top,
            entity.as_deref(),
            json_output,
        ),
    }
}
