//! Sentence model
//!
//! Assembles parallel annotation columns (words, lemmas, POS tags,
//! dependencies, NER tags and character offsets) into an immutable
//! sequence of tokens. Construction is purely structural: the only
//! interpretation performed is decoding the dependency governor index.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{RelfeatError, Result};

// ============================================================================
// Token
// ============================================================================

/// One annotated word of a sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface form
    pub text: String,
    pub lemma: String,
    /// Part-of-speech tag
    pub pos: String,
    /// Dependency relation to the governor (`nsubj`, `dobj`, ...)
    pub dependency_label: String,
    /// Position of the governor, `None` for the root or when unknown
    pub dependency_head: Option<usize>,
    /// Named-entity tag, `O` outside any entity
    pub ner: String,
    /// 0-based index within the sentence
    pub position: usize,
    pub char_begin: usize,
    pub char_end: usize,
}

// ============================================================================
// Sentence
// ============================================================================

/// An ordered, immutable sequence of tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    tokens: Vec<Token>,
}

impl Sentence {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Token> {
        self.tokens.get(position)
    }

    /// Tokens in `[start, end)`, clipped to the sentence
    pub fn slice(&self, start: usize, end: usize) -> &[Token] {
        let end = end.min(self.tokens.len());
        let start = start.min(end);
        &self.tokens[start..end]
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder validating that every annotation column has the same length
#[derive(Debug, Clone, Default)]
pub struct SentenceBuilder {
    words: Option<Vec<String>>,
    lemmas: Option<Vec<String>>,
    poses: Option<Vec<String>>,
    dependencies: Option<Vec<String>>,
    ners: Option<Vec<String>>,
    begin_offsets: Option<Vec<usize>>,
    end_offsets: Option<Vec<usize>>,
}

impl SentenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn words(mut self, words: Vec<String>) -> Self {
        self.words = Some(words);
        self
    }

    pub fn lemmas(mut self, lemmas: Vec<String>) -> Self {
        self.lemmas = Some(lemmas);
        self
    }

    pub fn poses(mut self, poses: Vec<String>) -> Self {
        self.poses = Some(poses);
        self
    }

    pub fn dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn ners(mut self, ners: Vec<String>) -> Self {
        self.ners = Some(ners);
        self
    }

    /// Character offsets are carried through untouched; they default to zeros
    pub fn offsets(mut self, begin: Vec<usize>, end: Vec<usize>) -> Self {
        self.begin_offsets = Some(begin);
        self.end_offsets = Some(end);
        self
    }

    /// Assemble the sentence, failing on a missing or misaligned column
    pub fn build(self) -> Result<Sentence> {
        let words = required(self.words, "words")?;
        let lemmas = required(self.lemmas, "lemmas")?;
        let poses = required(self.poses, "poses")?;
        let dependencies = required(self.dependencies, "dependencies")?;
        let ners = required(self.ners, "ners")?;

        let len = words.len();
        let begin_offsets = self.begin_offsets.unwrap_or_else(|| vec![0; len]);
        let end_offsets = self.end_offsets.unwrap_or_else(|| vec![0; len]);

        let lengths = [
            ("lemmas", lemmas.len()),
            ("poses", poses.len()),
            ("dependencies", dependencies.len()),
            ("ners", ners.len()),
            ("begin_offsets", begin_offsets.len()),
            ("end_offsets", end_offsets.len()),
        ];
        if let Some((name, found)) = lengths.iter().find(|(_, l)| *l != len) {
            return Err(RelfeatError::MalformedInput(format!(
                "column {name} has {found} entries, expected {len} (one per word)"
            )));
        }

        let mut tokens = Vec::with_capacity(len);
        let columns = words
            .into_iter()
            .zip(lemmas)
            .zip(poses)
            .zip(dependencies)
            .zip(ners)
            .zip(begin_offsets.into_iter().zip(end_offsets));

        for (position, (((((text, lemma), pos), dependency), ner), (char_begin, char_end))) in
            columns.enumerate()
        {
            let (dependency_label, dependency_head) = parse_dependency(&dependency);
            if let Some(head) = dependency_head {
                if head >= len {
                    return Err(RelfeatError::MalformedInput(format!(
                        "dependency '{dependency}' of token {position} points past the sentence end ({len} tokens)"
                    )));
                }
            }

            tokens.push(Token {
                text,
                lemma,
                pos,
                dependency_label,
                dependency_head,
                ner,
                position,
                char_begin,
                char_end,
            });
        }

        Ok(Sentence { tokens })
    }
}

fn required<T>(column: Option<Vec<T>>, name: &str) -> Result<Vec<T>> {
    column.ok_or_else(|| RelfeatError::MalformedInput(format!("missing column: {name}")))
}

// ============================================================================
// Dependency decoding
// ============================================================================

fn stanford_dependency() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // label(governor-G, dependent-D), indices 1-based, 0 = ROOT, copies marked with '
        Regex::new(r"^([^()]+)\((.*)-(\d+)'*, (.*)-(\d+)'*\)$").expect("valid dependency regex")
    })
}

/// Split a dependency annotation into its label and governor position.
///
/// Accepts a bare label (`nsubj`) or Stanford typed-dependency notation
/// (`nsubj(married-2, John-1)`). Anything else is kept verbatim as the label.
pub fn parse_dependency(raw: &str) -> (String, Option<usize>) {
    let raw = raw.trim();
    match stanford_dependency().captures(raw) {
        Some(caps) => {
            let label = caps[1].trim().to_string();
            let head = caps[3]
                .parse::<usize>()
                .ok()
                .and_then(|g| g.checked_sub(1));
            (label, head)
        }
        None => (raw.to_string(), None),
    }
}

// ============================================================================
// Tests
// ============================================================================
