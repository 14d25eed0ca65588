//! Mention spans
//!
//! A span is a contiguous run of tokens given by a word index and a length.
//! Offsets arrive as signed integers from the input record and are checked
//! here; out-of-range spans are reported, never clamped.

use serde::{Deserialize, Serialize};

use crate::{RelfeatError, Result, Sentence};

/// Contiguous token range `[begin, begin + length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub length: usize,
}

impl Span {
    pub fn new(begin: usize, length: usize) -> Self {
        Self { begin, length }
    }

    /// Exclusive end index
    pub fn end(&self) -> usize {
        self.begin + self.length
    }

    pub fn contains(&self, position: usize) -> bool {
        self.begin <= position && position < self.end()
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.begin < other.end() && other.begin < self.end()
    }
}

/// Validate one mention's offsets against a sentence length
pub fn resolve_span(begin: i64, length: i64, sentence_len: usize) -> Result<Span> {
    if length <= 0 {
        return Err(RelfeatError::SpanEmpty { length });
    }

    let out_of_range = RelfeatError::SpanOutOfRange {
        begin,
        length,
        sentence_len,
    };
    let (Ok(start), Ok(len)) = (usize::try_from(begin), usize::try_from(length)) else {
        return Err(out_of_range);
    };
    match start.checked_add(len) {
        Some(end) if end <= sentence_len => Ok(Span::new(start, len)),
        _ => Err(out_of_range),
    }
}

/// Validate both mentions of a relation candidate
pub fn resolve_spans(
    sentence: &Sentence,
    mention1: (i64, i64),
    mention2: (i64, i64),
) -> Result<(Span, Span)> {
    let span1 = resolve_span(mention1.0, mention1.1, sentence.len())?;
    let span2 = resolve_span(mention2.0, mention2.1, sentence.len())?;
    Ok((span1, span2))
}

// ============================================================================
// Tests
// ============================================================================
