//! The adjacency-repetition heuristic.
//!
//! Two words are "too similar" to sit next to each other in a line when one
//! looks like a naive inflection of the other. No lemmatization happens here:
//! irregular forms slip through and a few unrelated pairs get caught, which
//! is fine for the purpose.

/// Function words that read as the same word when placed side by side.
const CLOSED_SET: [&str; 3] = ["the", "thee", "them"];

/// Check whether two words are too similar to follow one another in a poem.
pub fn too_similar(word1: &str, word2: &str) -> bool {
    if word1.is_empty() || word2.is_empty() {
        return false;
    }
    if word1 == word2 {
        return true;
    }
    // Plural, probably
    if is_suffixed(word1, word2, "s") || is_suffixed(word2, word1, "s") {
        return true;
    }
    // Adverb form of an adjective
    if is_suffixed(word1, word2, "ly") || is_suffixed(word2, word1, "ly") {
        return true;
    }
    if is_past_tense_of(word1, word2) || is_past_tense_of(word2, word1) {
        return true;
    }
    if is_gerund_of(word1, word2) || is_gerund_of(word2, word1) {
        return true;
    }
    CLOSED_SET.contains(&word1) && CLOSED_SET.contains(&word2)
}

/// Check a word against every word in a list.
pub fn too_similar_to_any<S: AsRef<str>>(word: &str, others: &[S]) -> bool {
    others.iter().any(|other| too_similar(word, other.as_ref()))
}

/// `longer == shorter + suffix`
fn is_suffixed(shorter: &str, longer: &str, suffix: &str) -> bool {
    longer.len() == shorter.len() + suffix.len()
        && longer.starts_with(shorter)
        && longer.ends_with(suffix)
}

/// "riposted" is the past tense of "riposte".
fn is_past_tense_of(past: &str, base: &str) -> bool {
    past.len() > 2 && base.len() > 2 && past.ends_with("ed") && is_suffixed(base, past, "d")
}

/// "flying" is the gerund of "fly".
fn is_gerund_of(gerund: &str, base: &str) -> bool {
    let lengths_ok = (gerund.len() > 5 && base.len() > 2) || (base.len() > 5 && gerund.len() > 2);
    lengths_ok && is_suffixed(base, gerund, "ing")
}
