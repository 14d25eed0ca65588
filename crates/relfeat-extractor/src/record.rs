//! Relation record wire format
//!
//! One record per line, ten fields separated by the field delimiter:
//!
//! ```text
//! words  lemmas  poses  dependencies  ners  relation_id  p1_start  p1_length  p2_start  p2_length
//! ```
//!
//! The first five fields are arrays joined with the array delimiter
//! (`~^~` by default); the last four are word-index offsets.

use relfeat_core::{RecordFormat, RelationCandidate, RelfeatError, Result, SentenceBuilder};

const FIELD_COUNT: usize = 10;

/// A parsed but not yet validated relation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRecord {
    pub words: Vec<String>,
    pub lemmas: Vec<String>,
    pub poses: Vec<String>,
    pub dependencies: Vec<String>,
    pub ners: Vec<String>,
    pub relation_id: String,
    pub mention1: (i64, i64),
    pub mention2: (i64, i64),
}

impl RelationRecord {
    /// Split a line into its fields; checks field count and offset syntax only
    pub fn parse(line: &str, format: &RecordFormat) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(format.field_delimiter).collect();
        if fields.len() != FIELD_COUNT {
            return Err(RelfeatError::MalformedInput(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        }

        let array = |field: &str| -> Vec<String> {
            field
                .split(format.array_delimiter.as_str())
                .map(str::to_string)
                .collect()
        };

        Ok(Self {
            words: array(fields[0]),
            lemmas: array(fields[1]),
            poses: array(fields[2]),
            dependencies: array(fields[3]),
            ners: array(fields[4]),
            relation_id: fields[5].to_string(),
            mention1: (offset(fields[6], "p1_start")?, offset(fields[7], "p1_length")?),
            mention2: (offset(fields[8], "p2_start")?, offset(fields[9], "p2_length")?),
        })
    }

    /// Build the sentence and resolve both mentions
    pub fn into_candidate(self) -> Result<RelationCandidate> {
        let sentence = SentenceBuilder::new()
            .words(self.words)
            .lemmas(self.lemmas)
            .poses(self.poses)
            .dependencies(self.dependencies)
            .ners(self.ners)
            .build()?;

        RelationCandidate::new(self.relation_id, sentence, self.mention1, self.mention2)
    }
}

fn offset(field: &str, name: &str) -> Result<i64> {
    field.trim().parse().map_err(|_| {
        RelfeatError::MalformedInput(format!("{name} is not an integer: '{field}'"))
    })
}

// ============================================================================
// Tests
// ============================================================================
