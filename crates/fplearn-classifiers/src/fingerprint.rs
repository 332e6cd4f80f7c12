//! Fingerprint generation from structure strings.
//!
//! Real cheminformatics perception is an external collaborator; the
//! pipeline only requires the black-box contract below: a structure string
//! maps to a fixed-length bit vector, and an individual record may fail.
//! Failed records are dropped with a reported count, never a run abort.
use rayon::prelude::*;

use crate::data_handling::{FeatureStore, FingerprintRecord};
use crate::error::PipelineError;
use crate::io::compound_csv::CompoundTable;

/// Black-box mapping from a structure string to a bit vector of `size`
/// positions (0.0 / 1.0 values).
pub trait FingerprintGenerator: Send + Sync {
    fn fingerprint(&self, structure: &str, size: usize) -> anyhow::Result<Vec<f32>>;

    fn name(&self) -> &str {
        "fingerprint"
    }
}

/// Deterministic stand-in generator: hashes every substring window of the
/// structure string into a bit position. A cheminformatics toolkit can be
/// plugged in through the trait without touching the pipeline.
#[derive(Debug, Clone)]
pub struct HashedSubstructureGenerator {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for HashedSubstructureGenerator {
    fn default() -> Self {
        Self {
            min_len: 1,
            max_len: 7,
        }
    }
}

impl FingerprintGenerator for HashedSubstructureGenerator {
    fn fingerprint(&self, structure: &str, size: usize) -> anyhow::Result<Vec<f32>> {
        if structure.is_empty() {
            anyhow::bail!("empty structure string");
        }
        if !structure.is_ascii() || structure.chars().any(|c| c.is_whitespace()) {
            anyhow::bail!("structure contains whitespace or non-ASCII characters");
        }
        let bytes = structure.as_bytes();
        let mut bits = vec![0.0f32; size];
        for window in self.min_len..=self.max_len.min(bytes.len()) {
            for start in 0..=(bytes.len() - window) {
                let bit = hash_bytes(&bytes[start..start + window]) as usize % size;
                bits[bit] = 1.0;
            }
        }
        Ok(bits)
    }

    fn name(&self) -> &str {
        "hashed-substructure"
    }
}

/// Parses precomputed fingerprints supplied as 0/1 strings.
#[derive(Debug, Clone, Default)]
pub struct BitStringParser;

impl FingerprintGenerator for BitStringParser {
    fn fingerprint(&self, structure: &str, size: usize) -> anyhow::Result<Vec<f32>> {
        if structure.len() != size {
            anyhow::bail!(
                "bit string length {} does not match fingerprint size {}",
                structure.len(),
                size
            );
        }
        structure
            .chars()
            .map(|c| match c {
                '0' => Ok(0.0),
                '1' => Ok(1.0),
                other => Err(anyhow::anyhow!("invalid bit character '{}'", other)),
            })
            .collect()
    }

    fn name(&self) -> &str {
        "bit-string"
    }
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Fingerprint every record of the table in parallel.
///
/// Returns the assembled store and the number of dropped records. Order
/// of the surviving records matches the input table.
pub fn generate_fingerprints(
    table: &CompoundTable,
    generator: &dyn FingerprintGenerator,
    size: usize,
) -> Result<(FeatureStore, usize), PipelineError> {
    let rows: Vec<Option<FingerprintRecord>> = table
        .ids
        .par_iter()
        .zip(table.structures.par_iter())
        .zip(table.labels.par_iter())
        .map(|((id, structure), labels)| match generator.fingerprint(structure, size) {
            Ok(features) => Some(FingerprintRecord {
                id: id.clone(),
                features,
                labels: labels.clone(),
            }),
            Err(e) => {
                log::debug!("dropping record '{}': {}", id, e);
                None
            }
        })
        .collect();

    let total = rows.len();
    let records: Vec<FingerprintRecord> = rows.into_iter().flatten().collect();
    let dropped = total - records.len();
    if dropped > 0 {
        log::warn!(
            "Dropped {} of {} record(s) during {} fingerprint generation",
            dropped,
            total,
            generator.name()
        );
    }
    let store = FeatureStore::from_records(records, table.label_names.clone())?;
    Ok((store, dropped))
}
