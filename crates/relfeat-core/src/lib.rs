//! relfeat Core - Domain models, dictionaries, and shared types
//!
//! This crate defines the core abstractions used throughout relfeat:
//! - Sentence model (tokens with lemma, POS, dependency and NER annotations)
//! - Mention spans and their validation
//! - Dictionary store for keyword features
//! - Common error types
//! - Configuration management

pub mod config;
pub mod dictionary;
pub mod sentence;
pub mod span;

pub use config::{
    AppConfig, ConfigError, DictionarySource, EvaluationConfig, FeatureConfig, LoggingConfig,
    RecordFormat,
};
pub use dictionary::{Dictionary, DictionaryStore};
pub use sentence::{Sentence, SentenceBuilder, Token};
pub use span::{resolve_span, resolve_spans, Span};

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for relfeat operations
#[derive(Error, Debug)]
pub enum RelfeatError {
    /// Wrong field count, non-numeric offsets or misaligned annotation arrays
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Span out of range: begin {begin} + length {length} exceeds sentence length {sentence_len}")]
    SpanOutOfRange {
        begin: i64,
        length: i64,
        sentence_len: usize,
    },

    #[error("Empty span: length {length} must be positive")]
    SpanEmpty { length: i64 },

    /// Wiring defect, e.g. a feature rule referring to an unregistered dictionary
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read resource {path}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Join mismatch: label key {key} has no expectation row")]
    JoinMismatch { key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelfeatError {
    /// Errors confined to a single input record; the stream keeps going after these.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput(_) | Self::SpanOutOfRange { .. } | Self::SpanEmpty { .. }
        )
    }
}

impl From<ConfigError> for RelfeatError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelfeatError>;

// ============================================================================
// Relation Candidate
// ============================================================================

/// A pair of mentions in one sentence, hypothesized to participate in a relation
///
/// `relation_id` is opaque: it is copied from the input record to every
/// output line and never interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationCandidate {
    pub relation_id: String,
    pub sentence: Sentence,
    pub span1: Span,
    pub span2: Span,
}

impl RelationCandidate {
    /// Resolve both mention offsets against the sentence and build the candidate
    pub fn new(
        relation_id: impl Into<String>,
        sentence: Sentence,
        mention1: (i64, i64),
        mention2: (i64, i64),
    ) -> Result<Self> {
        let (span1, span2) = resolve_spans(&sentence, mention1, mention2)?;
        Ok(Self {
            relation_id: relation_id.into(),
            sentence,
            span1,
            span2,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
