use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::{Operation, OperationInput};
use crate::tax::Assessor;

/// Rows read from a CSV file plus the rows that could not be used
#[derive(Debug)]
pub struct CsvLoad<T> {
    pub records: Vec<T>,
    /// Source line of each entry in `records`
    pub lines: Vec<usize>,
    /// (line number, reason)
    pub rejected: Vec<(usize, String)>,
}

impl<T> CsvLoad<T> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// File line the record at `index` was read from
    pub fn line(&self, index: usize) -> Option<usize> {
        self.lines.get(index).copied()
    }
}

/// Brazilian spreadsheets usually export with `;`; pick whichever separator
/// dominates the header line.
fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .context("Failed to read CSV header line")?;
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    Ok(if semicolons > commas { b';' } else { b',' })
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<(StringRecord, CsvLoad<T>)> {
    let delimiter = detect_delimiter(path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("CSV headers: {:?}", headers);

    let mut records = Vec::new();
    let mut lines = Vec::new();
    let mut rejected = Vec::new();
    for (idx, row) in reader.deserialize::<T>().enumerate() {
        let line = idx + 2;
        match row {
            Ok(record) => {
                records.push(record);
                lines.push(line);
            }
            Err(e) => {
                warn!("Skipping line {}: {}", line, e);
                rejected.push((line, e.to_string()));
            }
        }
    }

    Ok((
        headers,
        CsvLoad {
            records,
            lines,
            rejected,
        },
    ))
}

/// Read raw operation rows (`id, direction, entity_id, tariff_code, fob_value,
/// exchange_rate, state_vat_rate, customs_fees, operation_date, quantity`).
pub fn read_operation_inputs<P: AsRef<Path>>(path: P) -> Result<CsvLoad<OperationInput>> {
    let path = path.as_ref();
    info!("Reading operation inputs from {:?}", path);
    let (_, load) = read_rows(path)?;
    info!(
        "Read {} operations ({} rejected)",
        load.records.len(),
        load.rejected.len()
    );
    Ok(load)
}

/// Read operations for drawback matching.
///
/// Files written by `simulate` already carry every tax column and are read
/// as-is; raw input files are evaluated on the way in. Rows that fail either
/// step are rejected individually.
pub fn load_operations<P: AsRef<Path>>(path: P, assessor: &Assessor<'_>) -> Result<CsvLoad<Operation>> {
    let path = path.as_ref();
    let delimiter = detect_delimiter(path)?;
    let headers = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    if headers.iter().any(|h| h == "total_tax") {
        info!("Reading evaluated operations from {:?}", path);
        let (_, load) = read_rows::<Operation>(path)?;
        return Ok(load);
    }

    let inputs = read_operation_inputs(path)?;
    let mut rejected = inputs.rejected;
    let mut records = Vec::with_capacity(inputs.records.len());
    let mut lines = Vec::with_capacity(inputs.lines.len());
    for (input, &line) in inputs.records.iter().zip(&inputs.lines) {
        match assessor.assess(input) {
            Ok(op) => {
                records.push(op);
                lines.push(line);
            }
            Err(e) => {
                warn!("Line {}: operation {} rejected: {}", line, input.id, e);
                rejected.push((line, format!("operation {}: {}", input.id, e)));
            }
        }
    }
    rejected.sort_by_key(|(line, _)| *line);
    Ok(CsvLoad {
        records,
        lines,
        rejected,
    })
}
