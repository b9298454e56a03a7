use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;
use tracing::info;

use tributec::importers::load_operations;
use tributec::reports::profile_entities;
use tributec::tax::Assessor;
use tributec::Config;

use crate::cli::formatters;

pub fn dispatch_entities(
    config: &Config,
    file: &Path,
    top: usize,
    entity: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let assessor = Assessor::new(config)?;
    let load = load_operations(file, &assessor)?;
    if load.is_empty() {
        bail!("No valid operations in {}", file.display());
    }

    let mut profiles = profile_entities(&load.records, top, config.scenarios.tax_share_alert);
    if let Some(entity) = entity {
        profiles.retain(|p| p.entity_id == entity);
    }
    info!("Profiled {} entities from {}", profiles.len(), file.display());

    if json_output {
        let errors: Vec<serde_json::Value> = load
            .rejected
            .iter()
            .map(|(line, reason)| serde_json::json!({ "line": line, "error": reason }))
            .collect();
        let payload = serde_json::json!({
            "entities": profiles,
            "rejected": errors,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if !load.rejected.is_empty() {
        println!("{} {} rows rejected", "⚠".yellow().bold(), load.rejected.len());
        print!("{}", formatters::format_rejections(&load.rejected));
    }
    println!(
        "{}",
        formatters::format_entity_profiles(&profiles, config.scenarios.tax_share_alert)
    );
    Ok(())
}
