// src/ngram/mod.rs
// =============================================================================
// Word-frequency statistics.
//
// Submodules:
// - tokenizer: text -> normalized word tokens
// - stopwords: the words excluded before counting
// - counter: 1/2/3-gram tables and the ranking rule
// =============================================================================

mod counter;
mod stopwords;
mod tokenizer;

pub use counter::{NGramCounter, NGramCounts, NGramTable, RankedTerm};
pub use stopwords::StopWords;
pub use tokenizer::tokenize;
