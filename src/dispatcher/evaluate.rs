use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use tributec::importers::{read_operation_inputs, CsvLoad};
use tributec::models::Operation;
use tributec::reports::write_operations_csv;
use tributec::simulation;
use tributec::tax::{evaluate_batch, Assessor};
use tributec::utils::format_currency;
use tributec::Config;

use crate::cli::formatters;

pub fn dispatch_evaluate(
    config: &Config,
    file: &Path,
    output: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    info!("Evaluating operations from {}", file.display());

    let load = read_operation_inputs(file)?;
    let outcomes = evaluate_batch(&load.records, config)?;
    let assessor = Assessor::new(config)?;

    let CsvLoad {
        lines,
        mut rejected,
        ..
    } = load;
    let mut operations: Vec<Operation> = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome.result {
            Ok(op) => operations.push(op),
            Err(e) => {
                let line = lines.get(outcome.index).copied().unwrap_or(0);
                rejected.push((line, format!("operation {}: {}", outcome.id, e)));
            }
        }
    }
    rejected.sort_by_key(|(line, _)| *line);

    if let Some(path) = output {
        write_operations_csv(path, &operations)?;
    }

    let summary = simulation::summarize(&operations, rejected.len());

    if json_output {
        let evaluated: Vec<serde_json::Value> = operations
            .iter()
            .map(|op| {
                serde_json::json!({
                    "operation": op,
                    "recommendation": assessor.recommend(op),
                })
            })
            .collect();
        let errors: Vec<serde_json::Value> = rejected
            .iter()
            .map(|(line, reason)| serde_json::json!({ "line": line, "error": reason }))
            .collect();
        let payload = serde_json::json!({
            "operations": evaluated,
            "rejected": errors,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: u64,
        #[tabled(rename = "Dir")]
        direction: &'static str,
        #[tabled(rename = "Entity")]
        entity: String,
        #[tabled(rename = "NCM")]
        tariff: String,
        #[tabled(rename = "Total tax")]
        total_tax: String,
        #[tabled(rename = "Index")]
        index: String,
        #[tabled(rename = "Severity")]
        severity: &'static str,
        #[tabled(rename = "Class")]
        class: String,
        #[tabled(rename = "Recommendation")]
        recommendation: &'static str,
    }

    let rows: Vec<Row> = operations
        .iter()
        .map(|op| Row {
            id: op.id,
            direction: op.direction.as_str(),
            entity: op.entity_id.clone(),
            tariff: op.tariff_code.clone(),
            total_tax: format_currency(op.total_tax),
            index: op.burden_index.to_string(),
            severity: op.severity_category.as_str(),
            class: op.value_class.clone(),
            recommendation: assessor.recommend(op).as_str(),
        })
        .collect();

    println!(
        "\n{} Evaluated {} operations from {}\n",
        "✓".green().bold(),
        operations.len(),
        file.display()
    );
    if !rows.is_empty() {
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
    if !rejected.is_empty() {
        println!("\n{} {} rows rejected", "⚠".yellow().bold(), rejected.len());
        print!("{}", formatters::format_rejections(&rejected));
    }
    println!(
        "\n{:<22} {}",
        "Total tax:".bold(),
        format_currency(summary.total_tax)
    );
    println!("{:<22} {}", "Mean burden index:".bold(), summary.mean_burden_index);
    Ok(())
}
