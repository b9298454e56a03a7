use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::drawback::DrawbackSummary;
use crate::models::{DrawbackLink, Operation};

/// File names written into an output directory by a simulation run
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub imports: PathBuf,
    pub exports: PathBuf,
    pub links: PathBuf,
    pub drawback_summary: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            imports: dir.join("operations.csv"),
            exports: dir.join("exports.csv"),
            links: dir.join("drawback_links.csv"),
            drawback_summary: dir.join("drawback_entities.csv"),
            summary: dir.join("summary.json"),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Serialize rows into a comma-separated file with a header line
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_operations_csv(path: &Path, operations: &[Operation]) -> Result<()> {
    write_csv(path, operations)
}

pub fn write_links_csv(path: &Path, links: &[DrawbackLink]) -> Result<()> {
    write_csv(path, links)
}

/// Flat row for per-entity drawback summaries
#[derive(Debug, Serialize)]
struct DrawbackSummaryRow<'a> {
    entity_id: &'a str,
    link_count: usize,
    linked_imports: usize,
    tariff_codes: String,
    import_duty_total: Decimal,
    excise_total: Decimal,
    recoverable_total: Decimal,
    regime: &'a str,
}

pub fn write_drawback_summary_csv(path: &Path, summaries: &[DrawbackSummary]) -> Result<()> {
    let rows: Vec<DrawbackSummaryRow> = summaries
        .iter()
        .map(|s| DrawbackSummaryRow {
            entity_id: &s.entity_id,
            link_count: s.link_count,
            linked_imports: s.linked_imports,
            tariff_codes: s.tariff_codes.join("|"),
            import_duty_total: s.import_duty_total,
            excise_total: s.excise_total,
            recoverable_total: s.recoverable_total,
            regime: &s.regime,
        })
        .collect();
    write_csv(path, &rows)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let text = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::importers::load_operations;
    use crate::simulation::{simulate, ExecutionMode};
    use crate::tax::Assessor;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_operations_round_trip_through_csv() {
        let config = Config::default();
        let operations = simulate(&config, 25, 9, ExecutionMode::Sequential)
            .unwrap()
            .into_operations();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("operations.csv");
        write_operations_csv(&path, &operations).unwrap();

        let assessor = Assessor::new(&config).unwrap();
        let loaded = load_operations(&path, &assessor).unwrap();
        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.records, operations);
    }

    #[test]
    fn test_drawback_summary_is_flattened() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.csv");
        let summary = DrawbackSummary {
            entity_id: "A".to_string(),
            link_count: 2,
            linked_imports: 1,
            tariff_codes: vec!["8471".to_string(), "8517".to_string()],
            import_duty_total: dec!(600),
            excise_total: dec!(100),
            recoverable_total: dec!(700),
            regime: "EXEMPTION".to_string(),
        };
        write_drawback_summary_csv(&path, &[summary]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("entity_id,link_count"));
        assert_eq!(lines.next().unwrap(), "A,2,1,8471|8517,600,100,700,EXEMPTION");
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }
}
