//! Recall evaluation
//!
//! Scores inferred relation expectations against ground-truth labels.
//! A correct label counts as a true positive when its relation's
//! expectation reaches the threshold, otherwise as a false negative.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use relfeat_core::{EvaluationConfig, RelfeatError, Result};

// ============================================================================
// Labels
// ============================================================================

/// Ground-truth judgement for one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// `None` when the candidate was seen but left unjudged
    #[serde(default, alias = "isCorrect")]
    pub is_correct: Option<bool>,
}

impl Label {
    pub fn correct() -> Self {
        Self {
            is_correct: Some(true),
        }
    }

    pub fn incorrect() -> Self {
        Self {
            is_correct: Some(false),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    Wrapped { by_key: BTreeMap<String, Label> },
    Bare(BTreeMap<String, Label>),
}

/// Labels keyed by relation id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<String, Label>);

impl LabelSet {
    /// Parse `{"by_key": {...}}` or a bare `{key: label}` object
    pub fn from_json(content: &str) -> Result<Self> {
        let file: LabelFile = serde_json::from_str(content)
            .map_err(|e| RelfeatError::MalformedInput(format!("invalid label file: {e}")))?;
        Ok(match file {
            LabelFile::Wrapped { by_key } => Self(by_key),
            LabelFile::Bare(labels) => Self(labels),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&read_resource(path.as_ref())?)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Label)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Label)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (String, Label)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Expectations
// ============================================================================

/// Inferred expectation per relation id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectationTable(HashMap<String, f64>);

impl ExpectationTable {
    /// Parse a CSV table with a header row; later rows override earlier
    /// ones with the same id
    pub fn from_csv(content: &str, id_column: usize, expectation_column: usize) -> Result<Self> {
        let mut table = HashMap::new();

        for (line, fields) in split_csv_rows(content).into_iter().skip(1) {
            if matches!(fields.as_slice(), [only] if only.trim().is_empty()) {
                continue;
            }
            let column = |c: usize| {
                fields.get(c).ok_or_else(|| {
                    RelfeatError::MalformedInput(format!(
                        "row {line} has {} columns, column {c} required",
                        fields.len()
                    ))
                })
            };

            let id = column(id_column)?.clone();
            let raw = column(expectation_column)?;
            let expectation: f64 = raw.trim().parse().map_err(|_| {
                RelfeatError::MalformedInput(format!(
                    "row {line}: expectation '{raw}' is not a number"
                ))
            })?;
            table.insert(id, expectation);
        }

        Ok(Self(table))
    }

    pub fn from_file(
        path: impl AsRef<Path>,
        id_column: usize,
        expectation_column: usize,
    ) -> Result<Self> {
        Self::from_csv(&read_resource(path.as_ref())?, id_column, expectation_column)
    }

    pub fn get(&self, relation_id: &str) -> Option<f64> {
        self.0.get(relation_id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for ExpectationTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Split CSV content into rows, honouring double-quoted fields, `""`
/// escapes and line breaks inside quotes. Each row carries the line it
/// starts on.
fn split_csv_rows(content: &str) -> Vec<(usize, Vec<String>)> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut line = 1;
    let mut row_start = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field)),
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                fields.push(std::mem::take(&mut field));
                rows.push((row_start, std::mem::take(&mut fields)));
                line += 1;
                row_start = line;
            }
            _ => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
        }
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push((row_start, fields));
    }
    rows
}

fn read_resource(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| RelfeatError::Resource {
        path: path.to_path_buf(),
        source: e,
    })
}

// ============================================================================
// Evaluator
// ============================================================================

/// Recall counts for one evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallReport {
    /// Every label in the label file, judged or not
    pub total_labels: usize,
    /// Correct labels whose expectation reached the threshold
    pub true_positives: usize,
    /// Correct labels whose expectation fell short
    pub false_negatives: usize,
    /// Correct labels skipped for lack of an expectation row
    pub unmatched: usize,
    pub threshold: f64,
}

impl RecallReport {
    /// TP / (TP + FN), defined as 0.0 when there is no correct label
    pub fn recall(&self) -> f64 {
        let correct = self.true_positives + self.false_negatives;
        if correct == 0 {
            0.0
        } else {
            self.true_positives as f64 / correct as f64
        }
    }

    pub fn report(&self) -> String {
        let mut report = format!(
            "# labels: {}\n\
             # true positive: {}\n\
             # false negative: {}\n",
            self.total_labels, self.true_positives, self.false_negatives,
        );
        if self.unmatched > 0 {
            report.push_str(&format!("# unmatched: {}\n", self.unmatched));
        }
        report.push_str(&format!("RECALL: {:.3}\n", self.recall()));
        report
    }
}

/// Evaluator joining labels with expectations
#[derive(Debug, Clone)]
pub struct RecallEvaluator {
    threshold: f64,
    skip_unmatched: bool,
}

impl RecallEvaluator {
    pub fn new() -> Self {
        Self::from_config(&EvaluationConfig::default())
    }

    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self {
            threshold: config.threshold,
            skip_unmatched: config.skip_unmatched,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Skip correct labels missing from the expectation table instead of failing
    pub fn skip_unmatched(mut self, skip: bool) -> Self {
        self.skip_unmatched = skip;
        self
    }

    /// Count true positives and false negatives over the correct labels.
    ///
    /// Expectation rows without a label are unlabeled candidates and are
    /// ignored.
    pub fn evaluate(&self, labels: &LabelSet, expectations: &ExpectationTable) -> Result<RecallReport> {
        let mut report = RecallReport {
            total_labels: labels.len(),
            threshold: self.threshold,
            ..Default::default()
        };

        for (key, label) in labels.iter() {
            if label.is_correct != Some(true) {
                continue;
            }

            match expectations.get(key) {
                Some(expectation) if expectation >= self.threshold => report.true_positives += 1,
                Some(_) => report.false_negatives += 1,
                None if self.skip_unmatched => {
                    report.unmatched += 1;
                    tracing::warn!(key, "Correct label has no expectation row, skipping");
                }
                None => {
                    return Err(RelfeatError::JoinMismatch {
                        key: key.to_string(),
                    })
                }
            }
        }

        let unlabeled = expectations.ids().filter(|id| !labels.contains(id)).count();
        tracing::debug!(unlabeled, "Ignoring expectation rows without a label");

        tracing::info!(
            labels = report.total_labels,
            true_positives = report.true_positives,
            false_negatives = report.false_negatives,
            unmatched = report.unmatched,
            "Recall evaluated"
        );
        Ok(report)
    }
}

impl Default for RecallEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
