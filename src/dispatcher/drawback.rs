use anyhow::{bail, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

use tributec::drawback::{self, match_all, match_entity, DrawbackRules};
use tributec::importers::load_operations;
use tributec::models::DrawbackLink;
use tributec::reports::write_links_csv;
use tributec::tax::Assessor;
use tributec::Config;

use crate::cli::formatters;

pub struct DrawbackArgs {
    pub imports: PathBuf,
    pub exports: PathBuf,
    pub entity: Option<String>,
    pub window: Option<u32>,
    pub output: Option<PathBuf>,
}

pub fn dispatch_drawback(config: &Config, args: DrawbackArgs, json_output: bool) -> Result<()> {
    let rules = match args.window {
        Some(days) => DrawbackRules {
            window_days: days,
            ..config.drawback.clone()
        },
        None => config.drawback.clone(),
    };
    rules.validate()?;

    let assessor = Assessor::new(config)?;
    let imports = load_operations(&args.imports, &assessor)?;
    let exports = load_operations(&args.exports, &assessor)?;
    if imports.is_empty() {
        bail!("No valid operations in {}", args.imports.display());
    }

    info!(
        "Matching {} imports against {} exports ({} day window)",
        imports.records.len(),
        exports.records.len(),
        rules.window_days
    );

    let by_entity: BTreeMap<String, Vec<DrawbackLink>> = match &args.entity {
        Some(entity) => {
            let links = match_entity(&imports.records, &exports.records, entity, &rules);
            if links.is_empty() {
                BTreeMap::new()
            } else {
                std::iter::once((entity.clone(), links)).collect()
            }
        }
        None => match_all(&imports.records, &exports.records, &rules),
    };

    let summaries: Vec<_> = by_entity
        .iter()
        .map(|(entity, links)| drawback::summarize(entity, links, &imports.records))
        .collect();
    let links: Vec<DrawbackLink> = by_entity.into_values().flatten().collect();

    if let Some(path) = &args.output {
        write_links_csv(path, &links)?;
    }

    let rejected: Vec<(usize, String)> = imports
        .rejected
        .into_iter()
        .map(|(line, reason)| (line, format!("{}: {}", args.imports.display(), reason)))
        .chain(
            exports
                .rejected
                .into_iter()
                .map(|(line, reason)| (line, format!("{}: {}", args.exports.display(), reason))),
        )
        .collect();

    if json_output {
        let errors: Vec<serde_json::Value> = rejected
            .iter()
            .map(|(line, reason)| serde_json::json!({ "line": line, "error": reason }))
            .collect();
        let payload = serde_json::json!({
            "window_days": rules.window_days,
            "links": links,
            "entities": summaries,
            "rejected": errors,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if !rejected.is_empty() {
        println!("{} {} rows rejected", "⚠".yellow().bold(), rejected.len());
        print!("{}", formatters::format_rejections(&rejected));
    }

    println!("{}", formatters::format_drawback_summaries(&summaries));
    if !links.is_empty() {
        println!("{}", formatters::format_links_preview(&links, 20));
    }
    Ok(())
}
