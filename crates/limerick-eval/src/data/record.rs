use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EvalError, Result, resolve_loss};

/// One aligned unit of source, reference and generated text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub source_line: String,
    pub target_line: String,
    pub generated_line: String,
}

impl GenerationRecord {
    pub fn new(
        source_line: impl Into<String>,
        target_line: impl Into<String>,
        generated_line: impl Into<String>,
    ) -> Self {
        Self {
            source_line: source_line.into(),
            target_line: target_line.into(),
            generated_line: generated_line.into(),
        }
    }
}

/// Raw output of a generation run, as produced by a [`Generator`](crate::Generator)
/// or read back from an [`OutputCache`](crate::OutputCache).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Overall test loss reported by the generator.
    pub loss: Option<f64>,
    /// Aggregate log values keyed by name, e.g. `test_lm_loss`.
    #[serde(default)]
    pub log: BTreeMap<String, f64>,
    pub predictions: Vec<String>,
    pub targets: Vec<String>,
}

impl GenerationOutput {
    /// Resolves the loss used for perplexity.
    ///
    /// `primary` is looked up in the log. `fallback` names the overall loss: it is
    /// looked up in the log and then resolves to [`loss`](Self::loss).
    pub fn resolve_loss(&self, primary: &str, fallback: &str) -> Result<f64> {
        resolve_loss(self.loss, &self.log, primary, fallback)
    }
}

/// Ordered batch of records. Record `i` always pairs source line `i` with
/// prediction `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    pub records: Vec<GenerationRecord>,
}

impl Batch {
    /// Zips the three line sequences, failing before anything is paired if the
    /// lengths disagree.
    pub fn align(
        sources: Vec<String>,
        targets: Vec<String>,
        predictions: Vec<String>,
    ) -> Result<Self> {
        if sources.len() != predictions.len() {
            return Err(EvalError::LengthMismatch {
                sources: sources.len(),
                predictions: predictions.len(),
            });
        }
        if targets.len() != predictions.len() {
            return Err(EvalError::TargetMismatch {
                targets: targets.len(),
                predictions: predictions.len(),
            });
        }

        let records = sources
            .into_iter()
            .zip(targets)
            .zip(predictions)
            .map(|((source, target), generated)| GenerationRecord::new(source, target, generated))
            .collect();
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GenerationRecord> {
        self.records.iter()
    }

    pub fn source_lines(&self) -> Vec<String> {
        self.iter().map(|r| r.source_line.clone()).collect()
    }

    pub fn targets(&self) -> Vec<String> {
        self.iter().map(|r| r.target_line.clone()).collect()
    }

    pub fn predictions(&self) -> Vec<String> {
        self.iter().map(|r| r.generated_line.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a GenerationRecord;
    type IntoIter = std::slice::Iter<'a, GenerationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
