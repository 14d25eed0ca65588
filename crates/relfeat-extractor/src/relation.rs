//! Relation Feature Extraction
//!
//! Per line: parse fields, build the sentence, resolve the two mention
//! spans, generate features and emit one `relation_id<TAB>feature` line
//! per feature. Features of a record are emitted in sorted order.

use std::io::{BufRead, Write};

use relfeat_core::{RecordFormat, RelationCandidate, Result};

use crate::features::{FeatureGenerator, FeatureSet};
use crate::record::RelationRecord;
use crate::{run_stream, ExtractionStats, LineTransformer};

/// Streaming relation feature extractor
pub struct RelationFeatureExtractor<'a> {
    generator: FeatureGenerator<'a>,
    format: RecordFormat,
}

impl<'a> RelationFeatureExtractor<'a> {
    pub fn new(generator: FeatureGenerator<'a>, format: RecordFormat) -> Self {
        Self { generator, format }
    }

    /// Features for an already validated candidate
    pub fn features(&self, candidate: &RelationCandidate) -> FeatureSet {
        self.generator
            .generate(&candidate.sentence, &candidate.span1, &candidate.span2)
    }

    /// Run one record through parse, build, resolve and generate
    pub fn extract_line(&self, line: &str) -> Result<(String, FeatureSet)> {
        let candidate = RelationRecord::parse(line, &self.format)?.into_candidate()?;
        let features = self.features(&candidate);

        tracing::trace!(
            relation_id = %candidate.relation_id,
            tokens = candidate.sentence.len(),
            features = features.len(),
            "Generated features"
        );
        Ok((candidate.relation_id, features))
    }

    /// Process a whole stream; malformed records are logged and skipped
    pub fn run<R: BufRead, W: Write>(&self, reader: R, writer: W) -> Result<ExtractionStats> {
        run_stream(self, reader, writer)
    }
}

impl LineTransformer for RelationFeatureExtractor<'_> {
    fn transform(&self, line: &str) -> Result<Vec<String>> {
        let (relation_id, features) = self.extract_line(line)?;
        Ok(features
            .into_iter()
            .map(|feature| format!("{relation_id}\t{feature}"))
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
