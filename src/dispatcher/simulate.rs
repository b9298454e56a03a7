use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use tributec::drawback::{self, match_all};
use tributec::models::DrawbackLink;
use tributec::reports::{
    write_drawback_summary_csv, write_json, write_links_csv, write_operations_csv, OutputPaths,
};
use tributec::simulation::{self, simulate, simulate_exports, ExecutionMode};
use tributec::Config;

use crate::cli::formatters;

pub struct SimulateArgs {
    pub count: Option<usize>,
    pub seed: Option<u64>,
    pub sequential: bool,
    pub with_exports: bool,
    pub output: Option<PathBuf>,
}

pub fn dispatch_simulate(config: &Config, args: SimulateArgs, json_output: bool) -> Result<()> {
    let count = args.count.unwrap_or(config.simulation.count);
    let seed = args
        .seed
        .or(config.simulation.seed)
        .unwrap_or_else(rand::random::<u64>);
    let mode = if args.sequential {
        ExecutionMode::Sequential
    } else {
        ExecutionMode::Parallel
    };

    let run = simulate(config, count, seed, mode)?;
    let failed = run.failures().count();
    let imports = run.into_operations();

    let mut summary = simulation::summarize(&imports, failed);
    let mut exports = Vec::new();
    let mut links: Vec<DrawbackLink> = Vec::new();
    let mut entity_summaries = Vec::new();

    if args.with_exports {
        exports = simulate_exports(&imports, config, seed)?;
        let by_entity = match_all(&imports, &exports, &config.drawback);
        for (entity, entity_links) in &by_entity {
            entity_summaries.push(drawback::summarize(entity, entity_links, &imports));
        }
        links = by_entity.into_values().flatten().collect();
        info!("{} exports, {} drawback links", exports.len(), links.len());
        summary = summary.with_drawback(&links);
    }

    if let Some(dir) = &args.output {
        let paths = OutputPaths::in_dir(dir);
        write_operations_csv(&paths.imports, &imports)
            .with_context(|| format!("Failed to write simulation output to {}", dir.display()))?;
        if args.with_exports {
            write_operations_csv(&paths.exports, &exports)?;
            write_links_csv(&paths.links, &links)?;
            write_drawback_summary_csv(&paths.drawback_summary, &entity_summaries)?;
        }
        write_json(&paths.summary, &summary)?;
    }

    if json_output {
        let payload = serde_json::json!({
            "seed": seed,
            "summary": summary,
            "drawback": entity_summaries,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{} seed {}", "ℹ".blue().bold(), seed);
    println!("{}", formatters::format_simulation_summary(&summary, config.benchmark));
    if args.with_exports {
        println!("{}", formatters::format_drawback_summaries(&entity_summaries));
    }
    if let Some(dir) = &args.output {
        println!("{} Output written to {}", "✓".green().bold(), dir.display());
    }
    Ok(())
}
