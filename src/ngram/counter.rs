// src/ngram/counter.rs
// =============================================================================
// Counts keywords (1-grams), bigrams and trigrams over a token stream, and
// ranks the resulting tables.
//
// Stop words, short tokens and numerals are removed BEFORE windowing, so a
// bigram or trigram never contains a filtered word. The window then slides
// over the filtered stream.
//
// Ranking: descending count, then ascending term. Terms are the words of the
// n-gram joined by a single space; tokens never contain whitespace, so
// comparing the joined strings orders n-grams exactly like comparing their
// word tuples.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;

use super::stopwords::StopWords;
use super::tokenizer::{is_numeral, tokenize};

/// Mapping from an n-gram (space-joined words) to its count.
///
/// Backed by a BTreeMap so a serialized table is always in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NGramTable {
    counts: BTreeMap<String, u64>,
}

/// One row of a ranked table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTerm {
    pub term: String,
    pub count: u64,
}

impl NGramTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `by` occurrences of `term`.
    pub fn add(&mut self, term: &str, by: u64) {
        *self.counts.entry(term.to_string()).or_insert(0) += by;
    }

    /// Sums another table into this one.
    pub fn merge(&mut self, other: &NGramTable) {
        for (term, count) in &other.counts {
            self.add(term, *count);
        }
    }

    pub fn get(&self, term: &str) -> u64 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Top `limit` entries: descending count, ties by ascending term.
    /// A limit of 0 gives an empty list.
    pub fn ranked(&self, limit: usize) -> Vec<RankedTerm> {
        if limit == 0 {
            return Vec::new();
        }

        // The map already iterates in ascending term order and sort_by is
        // stable, so sorting on count alone keeps the term tie-break.
        let mut entries: Vec<(&String, &u64)> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1));

        entries
            .into_iter()
            .take(limit)
            .map(|(term, count)| RankedTerm {
                term: term.clone(),
                count: *count,
            })
            .collect()
    }
}

/// The three tables produced for one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NGramCounts {
    pub keywords: NGramTable,
    pub bigrams: NGramTable,
    pub trigrams: NGramTable,
}

impl NGramCounts {
    pub fn merge(&mut self, other: &NGramCounts) {
        self.keywords.merge(&other.keywords);
        self.bigrams.merge(&other.bigrams);
        self.trigrams.merge(&other.trigrams);
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.bigrams.is_empty() && self.trigrams.is_empty()
    }
}

/// Filters tokens and fills the 1/2/3-gram tables.
#[derive(Debug, Clone)]
pub struct NGramCounter {
    stop_words: StopWords,
    min_word_length: usize,
}

impl NGramCounter {
    pub fn new(stop_words: StopWords, min_word_length: usize) -> Self {
        Self {
            stop_words,
            min_word_length,
        }
    }

    /// Counts n-grams in plain text.
    pub fn count(&self, text: &str) -> NGramCounts {
        let tokens = tokenize(text);
        self.count_tokens(&tokens)
    }

    /// Counts n-grams in an already tokenized stream.
    pub fn count_tokens(&self, tokens: &[String]) -> NGramCounts {
        let words: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|w| self.is_countable(w))
            .collect();

        NGramCounts {
            keywords: window_table(&words, 1),
            bigrams: window_table(&words, 2),
            trigrams: window_table(&words, 3),
        }
    }

    fn is_countable(&self, word: &str) -> bool {
        word.chars().count() >= self.min_word_length
            && !is_numeral(word)
            && !self.stop_words.contains(word)
    }
}

impl Default for NGramCounter {
    fn default() -> Self {
        Self::new(StopWords::english(), 3)
    }
}

// Fewer words than the window size: windows() yields nothing and the table
// stays empty.
fn window_table(words: &[&str], size: usize) -> NGramTable {
    let mut table = NGramTable::new();
    for window in words.windows(size) {
        table.add(&window.join(" "), 1);
    }
    table
}
