//! Relation feature generation
//!
//! Turns a sentence and two mention spans into a set of named features for
//! the downstream inference engine. Three families are produced:
//! - dictionary: keyword membership inside, between and around the mentions
//! - lexical: POS/lemma sequences, n-grams and context windows
//! - structural: gap length, intervening NER tags and the dependency path
//!   between the mention heads
//!
//! The mention starting first is the *left* one. When span2 starts before
//! span1 the pair is inverted: `IS_INVERTED` is emitted and every positional
//! feature (between, window, length) gets an `INV_` prefix. Features tied to
//! a mention's identity (`SPAN1_*`, `SPAN2_*`, `DEP_*`, `NER_PAIR_*`) are
//! never prefixed.
//!
//! Overlapping mentions emit `SPANS_OVERLAP` and have an empty between range.
//! Shared tokens count towards the per-span features of both mentions.

use std::collections::BTreeSet;
use std::ops::Range;

use relfeat_core::{Dictionary, DictionaryStore, FeatureConfig, Result, Sentence, Span, Token};

const START: &str = "<START>";
const END: &str = "<END>";
const OUTSIDE_NER: &str = "O";

// ============================================================================
// Feature Set
// ============================================================================

/// Deduplicated features, iterated in lexicographic order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet(BTreeSet<String>);

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the feature was already present
    pub fn insert(&mut self, feature: impl Into<String>) -> bool {
        self.0.insert(feature.into())
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.0.contains(feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl IntoIterator for FeatureSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// Mention layout
// ============================================================================

/// Relative placement of the two mentions
struct PairLayout {
    left: Span,
    inverted: bool,
    overlap: bool,
    between: Range<usize>,
    /// First token after both mentions
    outer_end: usize,
}

impl PairLayout {
    fn new(span1: &Span, span2: &Span) -> Self {
        let inverted = span2.begin < span1.begin;
        let (left, right) = if inverted {
            (*span2, *span1)
        } else {
            (*span1, *span2)
        };
        let overlap = span1.overlaps(span2);
        let between = if overlap {
            left.end()..left.end()
        } else {
            left.end()..right.begin
        };

        Self {
            left,
            inverted,
            overlap,
            between,
            outer_end: left.end().max(right.end()),
        }
    }

    fn prefix(&self) -> &'static str {
        if self.inverted {
            "INV_"
        } else {
            ""
        }
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Feature generator bound to a loaded dictionary store
pub struct FeatureGenerator<'a> {
    dictionaries: Vec<&'a Dictionary>,
    config: FeatureConfig,
}

impl<'a> FeatureGenerator<'a> {
    /// Resolve the configured dictionaries against the store.
    ///
    /// An empty `config.dictionaries` selects every loaded dictionary; naming
    /// one that is not loaded is a configuration error.
    pub fn new(store: &'a DictionaryStore, config: FeatureConfig) -> Result<Self> {
        let dictionaries = if config.dictionaries.is_empty() {
            store.iter().collect()
        } else {
            let ids: BTreeSet<&str> = config.dictionaries.iter().map(String::as_str).collect();
            ids.into_iter()
                .map(|id| store.get(id))
                .collect::<Result<Vec<_>>>()?
        };

        tracing::debug!(
            dictionaries = dictionaries.len(),
            window_size = config.window_size,
            ngram_max = config.ngram_max,
            "Feature generator ready"
        );

        Ok(Self {
            dictionaries,
            config,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Generate every feature for the mention pair
    pub fn generate(&self, sentence: &Sentence, span1: &Span, span2: &Span) -> FeatureSet {
        let layout = PairLayout::new(span1, span2);
        let mut features = FeatureSet::new();

        if layout.inverted {
            features.insert("IS_INVERTED");
        }
        if layout.overlap {
            features.insert("SPANS_OVERLAP");
        }

        self.dictionary_features(sentence, span1, span2, &layout, &mut features);
        self.lexical_features(sentence, span1, span2, &layout, &mut features);
        self.structural_features(sentence, span1, span2, &layout, &mut features);

        features
    }

    fn left_window<'s>(&self, sentence: &'s Sentence, layout: &PairLayout) -> &'s [Token] {
        let begin = layout.left.begin;
        sentence.slice(begin.saturating_sub(self.config.window_size), begin)
    }

    fn right_window<'s>(&self, sentence: &'s Sentence, layout: &PairLayout) -> &'s [Token] {
        let end = layout.outer_end;
        sentence.slice(end, end.saturating_add(self.config.window_size))
    }

    // ------------------------------------------------------------------------
    // (a) dictionary features
    // ------------------------------------------------------------------------

    fn dictionary_features(
        &self,
        sentence: &Sentence,
        span1: &Span,
        span2: &Span,
        layout: &PairLayout,
        features: &mut FeatureSet,
    ) {
        let prefix = layout.prefix();
        let mention1 = tokens_of(sentence, span1);
        let mention2 = tokens_of(sentence, span2);
        let between = sentence.slice(layout.between.start, layout.between.end);
        let left = self.left_window(sentence, layout);
        let right = self.right_window(sentence, layout);

        for dictionary in &self.dictionaries {
            let id = dictionary.id();
            if any_in(dictionary, mention1) {
                features.insert(format!("SPAN1_KW_[{id}]"));
            }
            if any_in(dictionary, mention2) {
                features.insert(format!("SPAN2_KW_[{id}]"));
            }
            if any_in(dictionary, between) {
                features.insert(format!("{prefix}BETW_KW_[{id}]"));
            }
            if any_in(dictionary, left) || any_in(dictionary, right) {
                features.insert(format!("{prefix}WINDOW_KW_[{id}]"));
            }
        }
    }

    // ------------------------------------------------------------------------
    // (b) lexical and contextual features
    // ------------------------------------------------------------------------

    fn lexical_features(
        &self,
        sentence: &Sentence,
        span1: &Span,
        span2: &Span,
        layout: &PairLayout,
        features: &mut FeatureSet,
    ) {
        let prefix = layout.prefix();

        for (name, span) in [("SPAN1", span1), ("SPAN2", span2)] {
            let tokens = tokens_of(sentence, span);
            features.insert(format!("{name}_POS_[{}]", join(tokens, |t| &t.pos)));

            let prev = span
                .begin
                .checked_sub(1)
                .and_then(|p| sentence.get(p))
                .map_or(START, |t| t.lemma.as_str());
            let next = sentence.get(span.end()).map_or(END, |t| t.lemma.as_str());
            features.insert(format!("{name}_PREV_[{prev}]"));
            features.insert(format!("{name}_NEXT_[{next}]"));
        }

        let between = sentence.slice(layout.between.start, layout.between.end);
        if !between.is_empty() && between.len() <= self.config.max_between {
            features.insert(format!("{prefix}WORD_SEQ_[{}]", join(between, |t| &t.text)));
            features.insert(format!("{prefix}LEMMA_SEQ_[{}]", join(between, |t| &t.lemma)));
            features.insert(format!("{prefix}POS_SEQ_[{}]", join(between, |t| &t.pos)));
        }
        for n in 1..=self.config.ngram_max {
            for gram in between.windows(n) {
                features.insert(format!("{prefix}NGRAM_{n}_[{}]", join(gram, |t| &t.lemma)));
            }
        }

        // Context windows only fire when the full width fits in the sentence
        let left = self.left_window(sentence, layout);
        let right = self.right_window(sentence, layout);
        let lefts: Vec<(usize, String)> = (1..=left.len())
            .map(|i| (i, join(&left[left.len() - i..], |t| &t.lemma)))
            .collect();
        let rights: Vec<(usize, String)> = (1..=right.len())
            .map(|j| (j, join(&right[..j], |t| &t.lemma)))
            .collect();

        for (i, words) in &lefts {
            features.insert(format!("{prefix}W_LEFT_{i}_[{words}]"));
        }
        for (j, words) in &rights {
            features.insert(format!("{prefix}W_RIGHT_{j}_[{words}]"));
        }
        for (i, left_words) in &lefts {
            for (j, right_words) in &rights {
                features.insert(format!(
                    "{prefix}W_LEFT_RIGHT_{i}_{j}_[{left_words}]_[{right_words}]"
                ));
            }
        }
    }

    // ------------------------------------------------------------------------
    // (c) structural features
    // ------------------------------------------------------------------------

    fn structural_features(
        &self,
        sentence: &Sentence,
        span1: &Span,
        span2: &Span,
        layout: &PairLayout,
        features: &mut FeatureSet,
    ) {
        let prefix = layout.prefix();
        let between = sentence.slice(layout.between.start, layout.between.end);

        features.insert(format!(
            "{prefix}LENGTH_{}",
            between.len() / self.config.length_bin_size.max(1)
        ));

        let tags: BTreeSet<&str> = between
            .iter()
            .map(|t| t.ner.as_str())
            .filter(|tag| !tag.is_empty() && *tag != OUTSIDE_NER)
            .collect();
        for tag in tags {
            features.insert(format!("{prefix}BETW_NER_[{tag}]"));
        }

        let (Some(head1), Some(head2)) = (span_head(sentence, span1), span_head(sentence, span2))
        else {
            return;
        };
        features.insert(format!("NER_PAIR_[{}]_[{}]", head1.ner, head2.ner));
        dependency_features(sentence, head1.position, head2.position, features);
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn tokens_of<'s>(sentence: &'s Sentence, span: &Span) -> &'s [Token] {
    sentence.slice(span.begin, span.end())
}

fn any_in(dictionary: &Dictionary, tokens: &[Token]) -> bool {
    tokens
        .iter()
        .any(|t| dictionary.contains(&t.text) || dictionary.contains(&t.lemma))
}

fn join<F>(tokens: &[Token], field: F) -> String
where
    F: Fn(&Token) -> &String,
{
    tokens
        .iter()
        .map(|t| field(t).as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first token whose governor lies outside the span, else the last token
fn span_head<'s>(sentence: &'s Sentence, span: &Span) -> Option<&'s Token> {
    let tokens = tokens_of(sentence, span);
    tokens
        .iter()
        .find(|t| t.dependency_head.map_or(true, |h| !span.contains(h)))
        .or_else(|| tokens.last())
}

/// `start` followed by its governors up to the root; stops at a repeated token
fn governor_chain(sentence: &Sentence, start: usize) -> Vec<usize> {
    let mut visited = vec![false; sentence.len()];
    let mut chain = Vec::new();
    let mut current = Some(start);

    while let Some(position) = current {
        match visited.get_mut(position) {
            Some(seen) if !*seen => *seen = true,
            _ => break,
        }
        chain.push(position);
        current = sentence.get(position).and_then(|t| t.dependency_head);
    }
    chain
}

fn dependency_features(sentence: &Sentence, head1: usize, head2: usize, features: &mut FeatureSet) {
    if head1 == head2 {
        features.insert("DEP_SAME_HEAD");
        return;
    }

    let up = governor_chain(sentence, head1);
    let down = governor_chain(sentence, head2);
    let common = up
        .iter()
        .enumerate()
        .find_map(|(i, node)| down.iter().position(|n| n == node).map(|j| (i, j)));
    let Some((i, j)) = common else {
        features.insert("DEP_NO_PATH");
        return;
    };

    let label = |position: usize| {
        sentence
            .get(position)
            .map_or("", |t| t.dependency_label.as_str())
    };
    let ancestor = sentence.get(up[i]).map_or("", |t| t.lemma.as_str());

    let mut path = String::new();
    for &node in &up[..i] {
        path.push_str(label(node));
        path.push_str("<-");
    }
    path.push_str(ancestor);
    for &node in down[..j].iter().rev() {
        path.push_str("->");
        path.push_str(label(node));
    }

    features.insert(format!("DEP_PATH_[{path}]"));
    features.insert(format!("DEP_PATH_LEN_{}", i + j));
    if i + j == 1 {
        let child = if i == 1 { head1 } else { head2 };
        features.insert(format!("DEP_DIRECT_[{}]", label(child)));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use relfeat_core::{RelfeatError, SentenceBuilder};

    fn col(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn john_married_mary() -> Sentence {
        SentenceBuilder::new()
            .words(col(&["John", "married", "Mary"]))
            .lemmas(col(&["John", "marry", "Mary"]))
            .poses(col(&["NNP", "VBD", "NNP"]))
            .dependencies(col(&[
                "nsubj(married-2, John-1)",
                "root(ROOT-0, married-2)",
                "dobj(married-2, Mary-3)",
            ]))
            .ners(col(&["PERSON", "O", "PERSON"]))
            .build()
            .unwrap()
    }

    /// "Yesterday , Barack Obama and his wife Michelle visited Paris ."
    fn obama_sentence() -> Sentence {
        let words = [
            "Yesterday", ",", "Barack", "Obama", "and", "his", "wife", "Michelle", "visited",
            "Paris", ".",
        ];
        SentenceBuilder::new()
            .words(col(&words))
            .lemmas(col(&[
                "yesterday", ",", "Barack", "Obama", "and", "he", "wife", "Michelle", "visit",
                "Paris", ".",
            ]))
            .poses(col(&[
                "NN", ",", "NNP", "NNP", "CC", "PRP$", "NN", "NNP", "VBD", "NNP", ".",
            ]))
            .dependencies(col(&[
                "tmod(visited-9, Yesterday-1)",
                "punct(visited-9, ,-2)",
                "nn(Obama-4, Barack-3)",
                "nsubj(visited-9, Obama-4)",
                "cc(Obama-4, and-5)",
                "poss(Michelle-8, his-6)",
                "nn(Michelle-8, wife-7)",
                "conj_and(Obama-4, Michelle-8)",
                "root(ROOT-0, visited-9)",
                "dobj(visited-9, Paris-10)",
                "punct(visited-9, .-11)",
            ]))
            .ners(col(&[
                "DATE", "O", "PERSON", "PERSON", "O", "O", "O", "PERSON", "O", "LOCATION", "O",
            ]))
            .build()
            .unwrap()
    }

    fn store() -> DictionaryStore {
        let mut store = DictionaryStore::new();
        store.insert("married", ["married", "wife", "husband"]);
        store.insert("non_married", ["brother", "sister"]);
        store
    }

    #[test]
    fn test_between_dictionary_hit() {
        let store = store();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        let features =
            generator.generate(&john_married_mary(), &Span::new(0, 1), &Span::new(2, 1));

        assert!(features.contains("BETW_KW_[married]"));
        assert!(!features.contains("BETW_KW_[non_married]"));
        assert!(!features.contains("SPAN1_KW_[married]"));
        assert!(!features.contains("IS_INVERTED"));
    }

    #[test]
    fn test_dictionary_matching_ignores_case() {
        let mut store = DictionaryStore::new();
        store.insert("married", ["MARRIED"]);
        let sentence = SentenceBuilder::new()
            .words(col(&["John", "MaRrIeD", "Mary"]))
            .lemmas(col(&["John", "MaRrIeD", "Mary"]))
            .poses(col(&["NNP", "VBD", "NNP"]))
            .dependencies(col(&["nsubj", "root", "dobj"]))
            .ners(col(&["PERSON", "O", "PERSON"]))
            .build()
            .unwrap();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();

        let features = generator.generate(&sentence, &Span::new(0, 1), &Span::new(2, 1));
        assert!(features.contains("BETW_KW_[married]"));
    }

    #[test]
    fn test_repeated_rule_output_collapses() {
        let mut store = DictionaryStore::new();
        store.insert("married", ["really", "married"]);
        let sentence = SentenceBuilder::new()
            .words(col(&["Tom", "really", "really", "married", "Ann"]))
            .lemmas(col(&["Tom", "really", "really", "marry", "Ann"]))
            .poses(col(&["NNP", "RB", "RB", "VBD", "NNP"]))
            .dependencies(col(&["nsubj", "advmod", "advmod", "root", "dobj"]))
            .ners(col(&["PERSON", "O", "O", "O", "PERSON"]))
            .build()
            .unwrap();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        let features = generator.generate(&sentence, &Span::new(0, 1), &Span::new(4, 1));

        // Three unigram windows and three dictionary hits between the spans
        let unigrams: Vec<&str> = features.iter().filter(|f| f.starts_with("NGRAM_1_")).collect();
        assert_eq!(unigrams, vec!["NGRAM_1_[marry]", "NGRAM_1_[really]"]);
        let keywords: Vec<&str> = features.iter().filter(|f| f.starts_with("BETW_KW_")).collect();
        assert_eq!(keywords, vec!["BETW_KW_[married]"]);

        let mut set = FeatureSet::default();
        assert!(set.insert("NGRAM_1_[really]"));
        assert!(!set.insert(String::from("NGRAM_1_[really]")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_lexical_features() {
        let store = DictionaryStore::new();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        let features =
            generator.generate(&john_married_mary(), &Span::new(0, 1), &Span::new(2, 1));

        assert!(features.contains("WORD_SEQ_[married]"));
        assert!(features.contains("LEMMA_SEQ_[marry]"));
        assert!(features.contains("POS_SEQ_[VBD]"));
        assert!(features.contains("NGRAM_1_[marry]"));
        assert!(features.contains("SPAN1_POS_[NNP]"));
        assert!(features.contains("SPAN1_PREV_[<START>]"));
        assert!(features.contains("SPAN1_NEXT_[marry]"));
        assert!(features.contains("SPAN2_PREV_[marry]"));
        assert!(features.contains("SPAN2_NEXT_[<END>]"));
        // Nothing outside the pair
        assert!(!features.iter().any(|f| f.starts_with("W_LEFT")));
        assert!(!features.iter().any(|f| f.starts_with("W_RIGHT")));
    }

    #[test]
    fn test_structural_features() {
        let store = DictionaryStore::new();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        let features =
            generator.generate(&john_married_mary(), &Span::new(0, 1), &Span::new(2, 1));

        assert!(features.contains("LENGTH_0"));
        assert!(features.contains("NER_PAIR_[PERSON]_[PERSON]"));
        assert!(features.contains("DEP_PATH_[nsubj<-marry->dobj]"));
        assert!(features.contains("DEP_PATH_LEN_2"));
        assert!(!features.iter().any(|f| f.starts_with("DEP_DIRECT")));
    }

    #[test]
    fn test_multi_token_spans_and_windows() {
        let store = store();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        // "Barack Obama" and "Michelle"
        let features = generator.generate(&obama_sentence(), &Span::new(2, 2), &Span::new(7, 1));

        // Head of "Barack Obama" is "Obama", which governs "Michelle" directly
        assert!(features.contains("DEP_PATH_[Obama->conj_and]"));
        assert!(features.contains("DEP_DIRECT_[conj_and]"));
        assert!(features.contains("DEP_PATH_LEN_1"));

        assert!(features.contains("SPAN1_POS_[NNP NNP]"));
        assert!(features.contains("BETW_KW_[married]"));
        assert!(features.contains("WORD_SEQ_[and his wife]"));
        assert!(features.contains("NGRAM_2_[he wife]"));
        assert!(features.contains("NGRAM_3_[and he wife]"));
        assert!(features.contains("W_LEFT_1_[,]"));
        assert!(features.contains("W_LEFT_2_[yesterday ,]"));
        assert!(!features.iter().any(|f| f.starts_with("W_LEFT_3_")));
        assert!(features.contains("W_RIGHT_3_[visit Paris .]"));
        assert!(features.contains("W_LEFT_RIGHT_1_2_[,]_[visit Paris]"));
        assert!(!features.contains("BETW_NER_[PERSON]"));
    }

    #[test]
    fn test_between_ner_tags() {
        let store = DictionaryStore::new();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        // "Yesterday" and "Paris": Obama, Michelle sit between
        let features =
            generator.generate(&obama_sentence(), &Span::new(0, 1), &Span::new(9, 1));

        assert!(features.contains("BETW_NER_[PERSON]"));
        assert!(!features.contains("BETW_NER_[O]"));
        assert!(features.contains("LENGTH_1"));
        // Gap of 8 tokens is within max_between
        assert!(features.iter().any(|f| f.starts_with("WORD_SEQ_")));
    }

    #[test]
    fn test_inverted_pair() {
        let store = store();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        let features =
            generator.generate(&john_married_mary(), &Span::new(2, 1), &Span::new(0, 1));

        assert!(features.contains("IS_INVERTED"));
        assert!(features.contains("INV_BETW_KW_[married]"));
        assert!(features.contains("INV_WORD_SEQ_[married]"));
        assert!(features.contains("INV_LENGTH_0"));
        assert!(!features.contains("BETW_KW_[married]"));
        // Identity features follow span1/span2, not position
        assert!(features.contains("SPAN1_NEXT_[<END>]"));
        assert!(features.contains("DEP_PATH_[dobj<-marry->nsubj]"));
    }

    #[test]
    fn test_overlapping_spans() {
        let store = store();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        let features =
            generator.generate(&john_married_mary(), &Span::new(0, 2), &Span::new(1, 2));

        assert!(features.contains("SPANS_OVERLAP"));
        assert!(features.contains("LENGTH_0"));
        // "married" is shared and counts for both mentions, never as between
        assert!(features.contains("SPAN1_KW_[married]"));
        assert!(features.contains("SPAN2_KW_[married]"));
        assert!(!features.iter().any(|f| f.contains("BETW_")));
        assert!(!features.iter().any(|f| f.starts_with("NGRAM_")));
    }

    #[test]
    fn test_identical_spans_share_head() {
        let store = DictionaryStore::new();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        let features =
            generator.generate(&john_married_mary(), &Span::new(1, 1), &Span::new(1, 1));

        assert!(features.contains("DEP_SAME_HEAD"));
        assert!(features.contains("SPANS_OVERLAP"));
    }

    #[test]
    fn test_no_dependency_path() {
        let sentence = SentenceBuilder::new()
            .words(col(&["John", "married", "Mary"]))
            .lemmas(col(&["John", "marry", "Mary"]))
            .poses(col(&["NNP", "VBD", "NNP"]))
            .dependencies(col(&["nsubj", "root", "dobj"]))
            .ners(col(&["PERSON", "O", "PERSON"]))
            .build()
            .unwrap();
        let store = DictionaryStore::new();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();

        let features = generator.generate(&sentence, &Span::new(0, 1), &Span::new(2, 1));
        assert!(features.contains("DEP_NO_PATH"));
    }

    #[test]
    fn test_dependency_cycle_terminates() {
        let sentence = SentenceBuilder::new()
            .words(col(&["a", "b", "c"]))
            .lemmas(col(&["a", "b", "c"]))
            .poses(col(&["X", "X", "X"]))
            .dependencies(col(&["dep(b-2, a-1)", "dep(a-1, b-2)", "dep(a-1, c-3)"]))
            .ners(col(&["O", "O", "O"]))
            .build()
            .unwrap();
        let store = DictionaryStore::new();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();

        let features = generator.generate(&sentence, &Span::new(1, 1), &Span::new(2, 1));
        assert!(features.iter().any(|f| f.starts_with("DEP_PATH_")));
    }

    #[test]
    fn test_long_gap_skips_sequences() {
        let store = DictionaryStore::new();
        let config = FeatureConfig {
            max_between: 2,
            ngram_max: 1,
            ..Default::default()
        };
        let generator = FeatureGenerator::new(&store, config).unwrap();
        let features =
            generator.generate(&obama_sentence(), &Span::new(0, 1), &Span::new(9, 1));

        assert!(!features.iter().any(|f| f.starts_with("WORD_SEQ_")));
        assert!(features.contains("NGRAM_1_[Obama]"));
        assert!(!features.iter().any(|f| f.starts_with("NGRAM_2_")));
    }

    #[test]
    fn test_configured_dictionary_subset() {
        let store = store();
        let config = FeatureConfig {
            dictionaries: vec!["non_married".to_string()],
            ..Default::default()
        };
        let generator = FeatureGenerator::new(&store, config).unwrap();
        let features =
            generator.generate(&john_married_mary(), &Span::new(0, 1), &Span::new(2, 1));

        assert!(!features.iter().any(|f| f.contains("[married]")));
    }

    #[test]
    fn test_unknown_dictionary_is_configuration_error() {
        let store = store();
        let config = FeatureConfig {
            dictionaries: vec!["spouse".to_string()],
            ..Default::default()
        };
        let err = FeatureGenerator::new(&store, config).err().unwrap();
        assert!(matches!(err, RelfeatError::Configuration(ref m) if m.contains("spouse")));
    }

    #[test]
    fn test_generation_is_repeatable() {
        let store = store();
        let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
        let sentence = obama_sentence();

        let first = generator.generate(&sentence, &Span::new(2, 2), &Span::new(7, 1));
        let _other = generator.generate(&sentence, &Span::new(0, 1), &Span::new(9, 1));
        let second = generator.generate(&sentence, &Span::new(2, 2), &Span::new(7, 1));
        assert_eq!(first, second);
    }

    #[test]
    fn test_feature_set_dedup() {
        let mut features = FeatureSet::new();
        assert!(features.insert("LENGTH_0"));
        assert!(!features.insert("LENGTH_0"));
        assert_eq!(features.len(), 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use relfeat_core::SentenceBuilder;
    use std::collections::HashSet;

    const VOCAB: &[&str] = &["john", "wife", "Mary", "of", "married", "the", "Sister", "and"];
    const TAGS: &[&str] = &["O", "PERSON", "LOCATION"];

    fn sentence_and_spans() -> impl Strategy<Value = (Sentence, Span, Span)> {
        (1usize..9)
            .prop_flat_map(|len| {
                (
                    prop::collection::vec(prop::sample::select(VOCAB), len),
                    prop::collection::vec(prop::sample::select(TAGS), len),
                    prop::collection::vec(prop::option::of(0..len), len),
                    (0..len).prop_flat_map(move |b| (Just(b), 1..=len - b)),
                    (0..len).prop_flat_map(move |b| (Just(b), 1..=len - b)),
                )
            })
            .prop_map(|(words, ners, heads, (b1, l1), (b2, l2))| {
                let len = words.len();
                let dependencies = heads
                    .iter()
                    .enumerate()
                    .map(|(i, head)| match head {
                        Some(h) => format!("dep(w-{}, w-{})", h + 1, i + 1),
                        None => format!("root(ROOT-0, w-{})", i + 1),
                    })
                    .collect();
                let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
                let sentence = SentenceBuilder::new()
                    .lemmas(words.iter().map(|w| w.to_lowercase()).collect())
                    .words(words)
                    .poses(vec!["NN".to_string(); len])
                    .dependencies(dependencies)
                    .ners(ners.iter().map(|t| t.to_string()).collect())
                    .build()
                    .unwrap();
                (sentence, Span::new(b1, l1), Span::new(b2, l2))
            })
    }

    fn store() -> DictionaryStore {
        let mut store = DictionaryStore::new();
        store.insert("married", ["married", "wife"]);
        store.insert("non_married", ["sister"]);
        store
    }

    proptest! {
        #[test]
        fn generation_is_deterministic((sentence, span1, span2) in sentence_and_spans()) {
            let store = store();
            let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
            let first = generator.generate(&sentence, &span1, &span2);

            let fresh = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
            let second = fresh.generate(&sentence.clone(), &span1, &span2);

            prop_assert_eq!(
                first.iter().collect::<Vec<_>>(),
                second.iter().collect::<Vec<_>>()
            );
        }

        #[test]
        fn generation_never_duplicates((sentence, span1, span2) in sentence_and_spans()) {
            let store = store();
            let generator = FeatureGenerator::new(&store, FeatureConfig::default()).unwrap();
            let emitted: Vec<String> = generator.generate(&sentence, &span1, &span2).into_iter().collect();
            let unique: HashSet<&String> = emitted.iter().collect();
            prop_assert_eq!(unique.len(), emitted.len());
            prop_assert!(!emitted.is_empty());
        }
    }
}
