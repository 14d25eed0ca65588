//! relfeat Extractor - Feature extraction and evaluation
//!
//! Streaming line transformers for the distant-supervision pipeline:
//! - Relation features: annotated sentence records to `relation_id\tfeature`
//! - Word candidates: title records to `[title_id, word]` pairs
//! - Recall: inferred expectations scored against ground-truth labels

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use relfeat_core::{RelfeatError, Result};

/// Turns one input line into zero or more output lines
///
/// Implementations hold no per-line state, so a line's outcome never
/// depends on the lines before it.
pub trait LineTransformer {
    fn transform(&self, line: &str) -> Result<Vec<String>>;
}

/// Counters for one streaming run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Non-blank input lines seen
    pub records: usize,
    /// Lines dropped because of a per-record error
    pub skipped: usize,
    /// Output lines written
    pub features: usize,
}

/// Drive a transformer over a line stream.
///
/// Per-record errors, including lines that are not valid UTF-8, are logged
/// and the line is skipped. Read failures and anything fatal abort the run.
pub fn run_stream<T, R, W>(transformer: &T, mut reader: R, mut writer: W) -> Result<ExtractionStats>
where
    T: LineTransformer + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut stats = ExtractionStats::default();
    let mut buf = Vec::new();

    for index in 0usize.. {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        stats.records += 1;

        let outcome = std::str::from_utf8(raw)
            .map_err(|e| RelfeatError::MalformedInput(format!("line is not valid UTF-8: {e}")))
            .and_then(|line| transformer.transform(line));
        match outcome {
            Ok(outputs) => {
                for output in &outputs {
                    writeln!(writer, "{output}")?;
                }
                stats.features += outputs.len();
            }
            Err(e) if e.is_record_error() => {
                stats.skipped += 1;
                tracing::warn!(line = index + 1, error = %e, "Skipping record");
            }
            Err(e) => return Err(e),
        }
    }

    writer.flush()?;
    tracing::info!(
        records = stats.records,
        skipped = stats.skipped,
        features = stats.features,
        "Stream finished"
    );
    Ok(stats)
}

pub mod features;
pub mod metrics;
pub mod record;
pub mod relation;
pub mod words;

pub use features::{FeatureGenerator, FeatureSet};
pub use metrics::{ExpectationTable, LabelSet, RecallEvaluator, RecallReport};
pub use record::RelationRecord;
pub use relation::RelationFeatureExtractor;
pub use words::WordExtractor;
