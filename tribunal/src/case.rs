//! Case records and dataset loading.
//!
//! A case pairs an external claim with the internal fact it is supposed to
//! restate. Cases are immutable once loaded; dataset problems are fatal to
//! the whole run rather than skipped silently.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::verdict::VerdictLabel;

/// One claim/fact pair to be debated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Stable index of the case within its dataset (0-based row order).
    pub id: u32,
    /// The external statement being checked.
    pub claim: String,
    /// The internal statement treated as ground truth.
    pub fact: String,
    /// Optional ground-truth verdict label carried from the dataset.
    pub ground_truth: Option<VerdictLabel>,
}

impl Case {
    pub fn new(id: u32, claim: impl Into<String>, fact: impl Into<String>) -> Self {
        Self {
            id,
            claim: claim.into(),
            fact: fact.into(),
            ground_truth: None,
        }
    }

    /// Compact one-line description for log output.
    pub fn summary_line(&self) -> String {
        let mut claim = self.claim.clone();
        if claim.chars().count() > 60 {
            claim = claim.chars().take(60).collect::<String>() + "…";
        }
        format!("case {}: {}", self.id, claim)
    }
}

/// Error loading or selecting cases.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed dataset row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("dataset contains no usable claim/truth rows")]
    Empty,

    #[error("case index {index} out of range (dataset has {len} cases)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// An ordered, immutable collection of cases loaded from one dataset.
#[derive(Debug, Clone)]
pub struct CaseSet {
    cases: Vec<Case>,
}

impl CaseSet {
    /// Load cases from a CSV file with `claim` and `truth` columns.
    ///
    /// An optional `label` column supplies ground-truth verdict labels.
    /// Rows with an empty claim or truth are skipped; surviving values are
    /// trimmed. An empty result is an error — there is nothing to run.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;

        let headers = reader
            .headers()
            .map_err(|e| DatasetError::MalformedRow {
                row: 0,
                reason: e.to_string(),
            })?
            .clone();
        let claim_idx = column_index(&headers, "claim").ok_or(DatasetError::MissingColumn("claim"))?;
        let truth_idx = column_index(&headers, "truth").ok_or(DatasetError::MissingColumn("truth"))?;
        let label_idx = column_index(&headers, "label");

        let mut cases = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| DatasetError::MalformedRow {
                row: row + 1,
                reason: e.to_string(),
            })?;

            let claim = record.get(claim_idx).unwrap_or("").trim();
            let truth = record.get(truth_idx).unwrap_or("").trim();
            if claim.is_empty() || truth.is_empty() {
                tracing::debug!(row = row + 1, "skipping row with empty claim or truth");
                continue;
            }

            let mut case = Case::new(cases.len() as u32, claim, truth);
            if let Some(idx) = label_idx {
                case.ground_truth = record
                    .get(idx)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .and_then(VerdictLabel::from_token);
            }
            cases.push(case);
        }

        if cases.is_empty() {
            return Err(DatasetError::Empty);
        }

        tracing::info!(count = cases.len(), "loaded dataset");
        Ok(Self { cases })
    }

    /// Build a case set directly (used by tests and programmatic callers).
    pub fn from_cases(cases: Vec<Case>) -> Result<Self, DatasetError> {
        if cases.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { cases })
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Case> {
        self.cases.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Case> {
        self.cases.get(index)
    }

    /// Select a subset by explicit indices, preserving the requested order.
    pub fn select(&self, indices: &[usize]) -> Result<Vec<Case>, DatasetError> {
        indices
            .iter()
            .map(|&index| {
                self.cases
                    .get(index)
                    .cloned()
                    .ok_or(DatasetError::IndexOutOfRange {
                        index,
                        len: self.cases.len(),
                    })
            })
            .collect()
    }

    /// The first `limit` cases (all of them when `limit` is `None`).
    pub fn take(&self, limit: Option<usize>) -> Vec<Case> {
        match limit {
            Some(n) => self.cases.iter().take(n).cloned().collect(),
            None => self.cases.clone(),
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_basic_dataset() {
        let file = write_csv(
            "claim,truth\n\
             The probe reached Mars in 2020,The probe reached Mars orbit in March 2020\n\
             Sales doubled, Sales increased by 40% \n",
        );
        let set = CaseSet::from_csv_path(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().id, 0);
        assert_eq!(set.get(1).unwrap().fact, "Sales increased by 40%");
    }

    #[test]
    fn test_blank_rows_skipped_and_ids_stay_dense() {
        let file = write_csv("claim,truth\nA,B\n,\nC,D\n");
        let set = CaseSet::from_csv_path(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().id, 1);
        assert_eq!(set.get(1).unwrap().claim, "C");
    }

    #[test]
    fn test_label_column_parsed() {
        let file = write_csv("claim,truth,label\nA,B,mutated\nC,D,\nE,F,FAITHFUL\n");
        let set = CaseSet::from_csv_path(file.path()).unwrap();
        assert_eq!(set.get(0).unwrap().ground_truth, Some(VerdictLabel::Mutated));
        assert_eq!(set.get(1).unwrap().ground_truth, None);
        assert_eq!(set.get(2).unwrap().ground_truth, Some(VerdictLabel::Faithful));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let file = write_csv("claim,statement\nA,B\n");
        let err = CaseSet::from_csv_path(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("truth")));
    }

    #[test]
    fn test_empty_dataset_is_fatal() {
        let file = write_csv("claim,truth\n,\n");
        let err = CaseSet::from_csv_path(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn test_select_out_of_range() {
        let file = write_csv("claim,truth\nA,B\n");
        let set = CaseSet::from_csv_path(file.path()).unwrap();
        let err = set.select(&[0, 3]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::IndexOutOfRange { index: 3, len: 1 }
        ));
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let file = write_csv("claim,truth\nA,B\nC,D\nE,F\n");
        let set = CaseSet::from_csv_path(file.path()).unwrap();
        let picked = set.select(&[2, 0]).unwrap();
        assert_eq!(picked[0].claim, "E");
        assert_eq!(picked[1].claim, "A");
    }

    #[test]
    fn test_take_limit() {
        let file = write_csv("claim,truth\nA,B\nC,D\nE,F\n");
        let set = CaseSet::from_csv_path(file.path()).unwrap();
        assert_eq!(set.take(Some(2)).len(), 2);
        assert_eq!(set.take(None).len(), 3);
    }

    #[test]
    fn test_from_cases_rejects_empty() {
        assert!(matches!(
            CaseSet::from_cases(vec![]).unwrap_err(),
            DatasetError::Empty
        ));
        let set = CaseSet::from_cases(vec![Case::new(0, "c", "f")]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_summary_line_truncates() {
        let long = "x".repeat(80);
        let case = Case::new(7, long, "fact");
        let line = case.summary_line();
        assert!(line.starts_with("case 7:"));
        assert!(line.chars().count() < 75);
    }
}
