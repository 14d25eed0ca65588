//! Word candidate extraction
//!
//! Reads `[title_id, title, has_entities]` JSON arrays and emits one
//! `[title_id, word]` array per distinct whitespace-separated word of the
//! title. Records with a `null` title produce nothing.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use serde_json::Value;

use relfeat_core::{RelfeatError, Result};

use crate::{run_stream, ExtractionStats, LineTransformer};

/// Streaming title-to-word extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct WordExtractor;

impl WordExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Distinct words of one title record, in order of first appearance
    pub fn extract(&self, line: &str) -> Result<(i64, Vec<String>)> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| RelfeatError::MalformedInput(format!("invalid JSON: {e}")))?;

        let fields = match value.as_array() {
            Some(fields) if fields.len() == 3 => fields,
            _ => {
                return Err(RelfeatError::MalformedInput(
                    "expected [title_id, title, has_entities]".to_string(),
                ))
            }
        };

        let title_id = parse_title_id(&fields[0])?;
        let title = match &fields[1] {
            Value::Null => return Ok((title_id, Vec::new())),
            Value::String(title) => title,
            other => {
                return Err(RelfeatError::MalformedInput(format!(
                    "title must be a string or null, found {other}"
                )))
            }
        };

        let mut seen = HashSet::new();
        let words = title
            .split_whitespace()
            .filter(|word| seen.insert(*word))
            .map(str::to_string)
            .collect();
        Ok((title_id, words))
    }

    pub fn run<R: BufRead, W: Write>(&self, reader: R, writer: W) -> Result<ExtractionStats> {
        run_stream(self, reader, writer)
    }
}

impl LineTransformer for WordExtractor {
    fn transform(&self, line: &str) -> Result<Vec<String>> {
        let (title_id, words) = self.extract(line)?;
        words
            .iter()
            .map(|word| {
                serde_json::to_string(&(title_id, word)).map_err(|e| RelfeatError::Other(e.into()))
            })
            .collect()
    }
}

fn parse_title_id(value: &Value) -> Result<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| RelfeatError::MalformedInput(format!("title id is not an integer: {value}")))
}

// ============================================================================
// Tests
// ============================================================================
