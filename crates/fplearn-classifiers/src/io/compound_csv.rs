//! Compound table CSV reader.
//!
//! Expected layout: an identifier column, a structure column (SMILES or a
//! 0/1 bit string) and one or more label columns whose cells are 0, 1 or
//! blank (blank means the label is missing for that record).
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::data_handling::MISSING_LABEL;

/// Parsed compound table, still structure strings rather than fingerprints.
#[derive(Debug, Clone)]
pub struct CompoundTable {
    pub ids: Vec<String>,
    pub structures: Vec<String>,
    pub label_names: Vec<String>,
    /// Row-major label values, one row per record.
    pub labels: Vec<Vec<i8>>,
}

/// Configuration for reading compound CSV files.
#[derive(Debug, Clone)]
pub struct CompoundReaderConfig {
    /// Column holding record identifiers.
    pub id_column: String,
    /// Column holding the structure string.
    pub structure_column: String,
    /// Optional explicit list of label columns (in order).
    /// When `None`, all remaining columns are treated as labels.
    pub label_columns: Option<Vec<String>>,
}

impl Default for CompoundReaderConfig {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            structure_column: "smiles".to_string(),
            label_columns: None,
        }
    }
}

/// Read a compound CSV file with the default column layout.
pub fn read_compound_csv<P: AsRef<Path>>(path: P) -> Result<CompoundTable> {
    read_compound_csv_with_config(path, &CompoundReaderConfig::default())
}

/// Read a compound CSV file using a custom configuration.
pub fn read_compound_csv_with_config<P: AsRef<Path>>(
    path: P,
    config: &CompoundReaderConfig,
) -> Result<CompoundTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open compound file: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read compound header row")?
        .clone();

    let id_idx = find_column(&headers, &config.id_column)
        .ok_or_else(|| anyhow!("Missing identifier column '{}'", config.id_column))?;
    let structure_idx = find_column(&headers, &config.structure_column)
        .ok_or_else(|| anyhow!("Missing structure column '{}'", config.structure_column))?;

    let label_indices: Vec<usize> = match &config.label_columns {
        Some(names) => names
            .iter()
            .map(|name| {
                find_column(&headers, name)
                    .ok_or_else(|| anyhow!("Missing label column '{}'", name))
            })
            .collect::<Result<_>>()?,
        None => (0..headers.len())
            .filter(|&i| i != id_idx && i != structure_idx)
            .collect(),
    };
    if label_indices.is_empty() {
        return Err(anyhow!("No label columns detected in compound header"));
    }
    let label_names: Vec<String> = label_indices
        .iter()
        .map(|&i| headers.get(i).unwrap_or("").to_string())
        .collect();

    let mut ids = Vec::new();
    let mut structures = Vec::new();
    let mut labels = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let id = record
            .get(id_idx)
            .ok_or_else(|| anyhow!("Missing identifier at row {}", row_idx + 1))?
            .trim()
            .to_string();
        let structure = record
            .get(structure_idx)
            .ok_or_else(|| anyhow!("Missing structure at row {}", row_idx + 1))?
            .trim()
            .to_string();

        let mut row_labels = Vec::with_capacity(label_indices.len());
        for (&idx, name) in label_indices.iter().zip(label_names.iter()) {
            let cell = record.get(idx).unwrap_or("").trim();
            row_labels.push(parse_label_cell(cell).with_context(|| {
                format!("Invalid label '{}' value '{}' at row {}", name, cell, row_idx + 1)
            })?);
        }

        ids.push(id);
        structures.push(structure);
        labels.push(row_labels);
    }

    log::info!(
        "Read {} record(s) with {} label column(s) from {}",
        ids.len(),
        label_names.len(),
        path.as_ref().display()
    );

    Ok(CompoundTable {
        ids,
        structures,
        label_names,
        labels,
    })
}

fn parse_label_cell(cell: &str) -> Result<i8> {
    if cell.is_empty() {
        return Ok(MISSING_LABEL);
    }
    // Accept both integer and float spellings of the two classes.
    let value: f32 = cell
        .parse()
        .map_err(|_| anyhow!("expected 0, 1 or blank"))?;
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(anyhow!("expected 0, 1 or blank"))
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name.trim()))
}
