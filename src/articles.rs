//! Indefinite article agreement.

/// Check if a word starts with a vowel letter (used for a/an selection).
fn starts_with_vowel(word: &str) -> bool {
    matches!(
        word.chars().next().map(|c| c.to_ascii_lowercase()),
        Some('a' | 'e' | 'i' | 'o' | 'u')
    )
}

fn starts_with_consonant(word: &str) -> bool {
    word.chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
        .is_some_and(|c| c.is_ascii_lowercase() && !starts_with_vowel(word))
}

/// Rewrite "a" before a vowel to "an", and "an" before a consonant to "a".
///
/// Only the first letter is inspected, so "an hour" becomes "a hour" and
/// "a unicorn" becomes "an unicorn". Running this twice changes nothing the
/// second time.
pub fn correct_a_vs_an(words: &mut [String]) {
    for i in 1..words.len() {
        let (before, after) = words.split_at_mut(i);
        let article = &mut before[i - 1];
        let next = &after[0];
        if article.eq_ignore_ascii_case("a") && starts_with_vowel(next) {
            article.push('n');
        } else if article.eq_ignore_ascii_case("an") && starts_with_consonant(next) {
            article.truncate(1);
        }
    }
}

/// Character length of a word once article correction may have run on it.
/// A bare "a" may grow into "an".
pub fn projected_len(word: &str) -> usize {
    word.chars().count() + usize::from(word.eq_ignore_ascii_case("a"))
}
