//! Output formatting module for CLI display
//!
//! Calculation results arrive here fully computed; this module only turns
//! them into terminal tables and JSON.

use colored::{ColoredString, Colorize};
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use tributec::drawback::DrawbackSummary;
use tributec::models::{DrawbackLink, Operation, SeverityCategory};
use tributec::reports::EntityProfile;
use tributec::simulation::SimulationSummary;
use tributec::tax::{Recommendation, ScenarioOutcome, TaxStack};
use tributec::utils::{format_currency, format_decimal_br, format_rate};

fn severity_colored(category: SeverityCategory) -> ColoredString {
    match category {
        SeverityCategory::Low => category.as_str().blue(),
        SeverityCategory::Moderate => category.as_str().green(),
        SeverityCategory::High => category.as_str().yellow(),
        SeverityCategory::Critical => category.as_str().red(),
        SeverityCategory::Overloaded => category.as_str().red().bold(),
    }
}

/// Tax stack breakdown for a single operation
pub fn format_stack(
    op: &Operation,
    stack: &TaxStack,
    recommendation: Recommendation,
) -> String {
    #[derive(Tabled)]
    struct Line {
        #[tabled(rename = "Component")]
        name: &'static str,
        #[tabled(rename = "Amount")]
        amount: String,
    }

    let lines = vec![
        Line { name: "Customs value (BRL)", amount: format_currency(stack.value_local) },
        Line { name: "IOF câmbio", amount: format_currency(stack.exchange_tax) },
        Line { name: "Import duty (II)", amount: format_currency(stack.import_duty) },
        Line { name: "Excise (IPI)", amount: format_currency(stack.excise_tax) },
        Line { name: "Customs fees", amount: format_currency(stack.customs_fees) },
        Line { name: "ICMS base (without ICMS)", amount: format_currency(stack.vat_base) },
        Line { name: "ICMS (por dentro)", amount: format_currency(stack.state_vat) },
        Line { name: "Total taxes", amount: format_currency(stack.total_tax) },
    ];

    let mut table = Table::new(&lines);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());

    let mut output = format!(
        "\n{} Import tax stack - FOB {} at {} (ICMS {})\n\n",
        "📦".cyan().bold(),
        format_decimal_br(op.fob_value),
        op.exchange_rate,
        format_rate(op.state_vat_rate)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{:<16} {}\n{:<16} {}\n{:<16} {}\n{:<16} {}\n",
        "Burden index:".bold(),
        op.burden_index,
        "Severity:".bold(),
        severity_colored(op.severity_category),
        "Value class:".bold(),
        op.value_class,
        "Recommendation:".bold(),
        recommendation.description()
    ));
    output
}

/// Savings per what-if scenario, next to the current figures
pub fn format_scenarios(op: &Operation, scenarios: &[ScenarioOutcome]) -> String {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Scenario")]
        name: &'static str,
        #[tabled(rename = "ICMS")]
        vat: String,
        #[tabled(rename = "Total taxes")]
        total: String,
        #[tabled(rename = "Savings")]
        savings: String,
        #[tabled(rename = "Index")]
        index: String,
    }

    let mut rows = vec![Row {
        name: "Current",
        vat: format_rate(op.state_vat_rate),
        total: format_currency(op.total_tax),
        savings: "-".to_string(),
        index: op.burden_index.to_string(),
    }];
    rows.extend(scenarios.iter().map(|s| Row {
        name: s.scenario.description(),
        vat: format_rate(s.state_vat_rate),
        total: format_currency(s.stack.total_tax),
        savings: format_currency(s.savings),
        index: s.burden_index.to_string(),
    }));

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(2..4), Alignment::right());
    format!("\n{} What-if savings\n\n{}\n", "💡".yellow(), table)
}

/// Entities ranked by total import tax, each with its heaviest operations
pub fn format_entity_profiles(profiles: &[EntityProfile], alert_share: rust_decimal::Decimal) -> String {
    if profiles.is_empty() {
        return format!("{} No import operations found\n", "ℹ".blue().bold());
    }

    let mut output = String::new();
    for profile in profiles {
        let share = format_rate(profile.tax_share);
        output.push_str(&format!(
            "\n{} {} - {} imports, {} in taxes ({} of customs value)\n",
            "🏢".cyan(),
            profile.entity_id.bold(),
            profile.operation_count,
            format_currency(profile.total_tax),
            if profile.alert { share.red().bold() } else { share.normal() }
        ));
        if profile.alert {
            output.push_str(&format!(
                "  {} Taxes above {} of customs value, review the import strategy\n",
                "⚠".yellow().bold(),
                format_rate(alert_share)
            ));
        }
        for (rank, op) in profile.top_operations.iter().enumerate() {
            output.push_str(&format!(
                "  {}. #{} NCM {} {} - {} (index {})\n",
                rank + 1,
                op.id,
                op.tariff_code,
                op.operation_date.format("%d/%m/%Y"),
                format_currency(op.total_tax),
                op.burden_index
            ));
        }
    }
    output
}

/// Batch summary with the per-category breakdown
pub fn format_simulation_summary(summary: &SimulationSummary, benchmark: rust_decimal::Decimal) -> String {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Class")]
        class: String,
        #[tabled(rename = "Operations")]
        count: usize,
        #[tabled(rename = "Share")]
        share: String,
    }

    let share = |n: usize| {
        if summary.count == 0 {
            "0.0%".to_string()
        } else {
            format!("{:.1}%", n as f64 * 100.0 / summary.count as f64)
        }
    };

    let severity_rows: Vec<Row> = summary
        .by_severity
        .iter()
        .map(|(category, count)| Row {
            class: severity_colored(*category).to_string(),
            count: *count,
            share: share(*count),
        })
        .collect();
    let value_rows: Vec<Row> = summary
        .by_value_class
        .iter()
        .map(|(label, count)| Row {
            class: label.clone(),
            count: *count,
            share: share(*count),
        })
        .collect();

    let mut output = format!(
        "\n{} Simulated {} operations ({} failed)\n\n",
        "✓".green().bold(),
        summary.count,
        summary.failed
    );

    let mut severity_table = Table::new(&severity_rows);
    severity_table.with(Style::rounded());
    output.push_str("By burden index\n");
    output.push_str(&severity_table.to_string());

    let mut value_table = Table::new(&value_rows);
    value_table.with(Style::rounded());
    output.push_str("\n\nBy total tax\n");
    output.push_str(&value_table.to_string());

    output.push_str(&format!("\n\n{}", "━".repeat(60).bright_black()));
    output.push_str(&format!("\n{:<22} {}", "Benchmark:".bold(), benchmark));
    output.push_str(&format!("\n{:<22} {}", "Mean burden index:".bold(), summary.mean_burden_index));
    output.push_str(&format!(
        "\n{:<22} {}",
        "Mean total tax:".bold(),
        format_currency(summary.mean_total_tax)
    ));
    output.push_str(&format!(
        "\n{:<22} {}",
        "Critical/Overloaded:".bold(),
        summary.alerts.to_string().red()
    ));
    if let Some(potential) = summary.recoverable_potential {
        output.push_str(&format!(
            "\n{:<22} {}",
            "Drawback potential:".bold(),
            format_currency(potential).green()
        ));
    }
    output.push('\n');
    output
}

/// Per-entity drawback table
pub fn format_drawback_summaries(summaries: &[DrawbackSummary]) -> String {
    if summaries.is_empty() {
        return format!("{} No operations eligible for drawback\n", "ℹ".blue().bold());
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Entity")]
        entity: String,
        #[tabled(rename = "Links")]
        links: usize,
        #[tabled(rename = "Imports")]
        imports: usize,
        #[tabled(rename = "Tariff codes")]
        tariffs: String,
        #[tabled(rename = "II")]
        duty: String,
        #[tabled(rename = "IPI")]
        excise: String,
        #[tabled(rename = "Recoverable")]
        total: String,
    }

    let rows: Vec<Row> = summaries
        .iter()
        .map(|s| Row {
            entity: s.entity_id.clone(),
            links: s.link_count,
            imports: s.linked_imports,
            tariffs: s.tariff_codes.join(", "),
            duty: format_currency(s.import_duty_total),
            excise: format_currency(s.excise_total),
            total: format_currency(s.recoverable_total),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(4..), Alignment::right());

    let total: rust_decimal::Decimal = summaries.iter().map(|s| s.recoverable_total).sum();
    format!(
        "\n{} {} entities eligible for drawback\n\n{}\n\n{:<22} {}\n",
        "✓".green().bold(),
        summaries.len(),
        table,
        "Total recoverable:".bold(),
        format_currency(total).green()
    )
}

/// First rows of a link list
pub fn format_links_preview(links: &[DrawbackLink], limit: usize) -> String {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Entity")]
        entity: String,
        #[tabled(rename = "Tariff")]
        tariff: String,
        #[tabled(rename = "Import")]
        import: String,
        #[tabled(rename = "Export")]
        export: String,
        #[tabled(rename = "Ratio")]
        ratio: String,
        #[tabled(rename = "Recoverable")]
        recoverable: String,
    }

    let rows: Vec<Row> = links
        .iter()
        .take(limit)
        .map(|l| Row {
            entity: l.entity_id.clone(),
            tariff: l.tariff_code.clone(),
            import: format!("#{} {}", l.import_operation_id, l.import_date.format("%d/%m/%Y")),
            export: format!("#{} {}", l.export_operation_id, l.export_date.format("%d/%m/%Y")),
            ratio: l.matched_quantity_ratio.to_string(),
            recoverable: format_currency(l.recoverable_amount),
        })
        .collect();

    let mut output = Table::new(&rows).with(Style::rounded()).to_string();
    if links.len() > limit {
        output.push_str(&format!("\n... and {} more links", links.len() - limit));
    }
    output
}

/// Rows that failed to load or evaluate
pub fn format_rejections(rejected: &[(usize, String)]) -> String {
    let mut output = String::new();
    for (line, reason) in rejected {
        if *line > 0 {
            output.push_str(&format!("  {} line {}: {}\n", "✗".red(), line, reason));
        } else {
            output.push_str(&format!("  {} {}\n", "✗".red(), reason));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_drawback_message() {
        colored::control::set_override(false);
        let msg = format_drawback_summaries(&[]);
        assert!(msg.contains("No operations eligible for drawback"));
    }

    #[test]
    fn test_entity_profile_lists_top_operations() {
        use rust_decimal_macros::dec;
        use tributec::reports::profile_entities;

        colored::control::set_override(false);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut op = Operation::export_leg(7, "12345678", "8517", date, 1, "LIGHT");
        op.direction = tributec::TradeDirection::Import;
        op.value_local = dec!(1000);
        op.state_vat = dec!(700);
        op.total_tax = dec!(700);

        let profiles = profile_entities(&[op], 3, dec!(0.60));
        let text = format_entity_profiles(&profiles, dec!(0.60));
        assert!(text.contains("12345678"));
        assert!(text.contains("1. #7 NCM 8517 01/02/2024"));
        assert!(text.contains("review the import strategy"));
        assert!(format_entity_profiles(&[], dec!(0.60)).contains("No import operations"));
    }

    #[test]
    fn test_rejections_list_lines() {
        colored::control::set_override(false);
        let text = format_rejections(&[(3, "bad value".to_string()), (0, "operation 9: x".to_string())]);
        assert!(text.contains("line 3: bad value"));
        assert!(text.contains("operation 9: x"));
    }
}
