// src/ngram/tokenizer.rs
// =============================================================================
// Splits plain text into normalized word tokens.
//
// Rules:
// - A token is a run of alphanumeric characters, optionally joined by an
//   apostrophe ("don't", "site's"). Everything else is a boundary.
// - Tokens are lower-cased and typographic apostrophes become ASCII ones.
// - A trailing possessive "'s" is stripped ("google's" -> "google").
//   Plural "s" is left alone: "tools" and "tool" stay distinct.
//
// Filtering (stop words, minimum length, numerals) is the counter's job; the
// tokenizer also feeds the page word count, which includes every word.
// =============================================================================

/// Returns the normalized tokens of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || is_apostrophe(c)))
        .filter_map(normalize)
        .collect()
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

// Turns one raw piece into a token, or None if nothing word-like is left
// (e.g. a lone apostrophe between two spaces).
fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(is_apostrophe);
    if trimmed.is_empty() {
        return None;
    }

    Some(normalize_word(trimmed))
}

/// Lower-cases a word, converts typographic apostrophes and strips a trailing
/// "'s". Stop-word entries go through the same step so "let's" matches the
/// token it becomes.
pub fn normalize_word(word: &str) -> String {
    let mut word = word.to_lowercase().replace('\u{2019}', "'");
    if word.len() > 2 && word.ends_with("'s") {
        word.truncate(word.len() - 2);
    }
    word
}

/// True for tokens made only of digits ("2024", "42").
pub fn is_numeral(word: &str) -> bool {
    word.chars().all(|c| c.is_numeric())
}
