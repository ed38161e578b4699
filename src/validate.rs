use regex::Regex;
use std::sync::OnceLock;

use crate::error::{PoetryError, Result};

fn invalid_char_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Whitespace, digits, hyphens and apostrophes are not allowed inside a word.
    RE.get_or_init(|| Regex::new(r"[\s\d\-']").expect("static regex"))
}

fn input_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s,]+").expect("static regex"))
}

/// Check if the string has characters a word may not contain.
pub fn has_invalid_characters(s: &str) -> bool {
    invalid_char_re().is_match(s)
}

/// Check whether the input is usable as a single word.
pub fn validate_word(word: &str) -> Result<()> {
    if word.is_empty() {
        return Err(PoetryError::invalid_word(word, "word is empty"));
    }
    if has_invalid_characters(word) {
        return Err(PoetryError::invalid_word(
            word,
            "word may not contain digits, spaces, or special characters",
        ));
    }
    Ok(())
}

/// Validate a non-empty list of words.
pub fn validate_words<S: AsRef<str>>(words: &[S]) -> Result<()> {
    if words.is_empty() {
        return Err(PoetryError::invalid_input("must provide at least one word"));
    }
    for word in words {
        validate_word(word.as_ref())?;
    }
    Ok(())
}

/// Split a free-text prompt on whitespace and commas.
///
/// `"fish, paperclip,atom benign"` -> `["fish", "paperclip", "atom", "benign"]`
pub fn split_input_words(input: &str) -> Vec<String> {
    input_separator_re()
        .split(input)
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}
