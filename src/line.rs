use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{PoetryError, Result};
use crate::similarity::too_similar;

/// Join words from `word_list` into one line, gluing them with random
/// connectors.
///
/// The first word is always used. Each later word may end the line early
/// (more likely as the line grows), is skipped when it is too similar to the
/// previous accepted word, and ends the line when it would not fit in
/// `max_length` characters. A connector is never used twice in a row.
pub fn compose_line<R, S>(
    rng: &mut R,
    word_list: &[S],
    max_length: usize,
    connectors: &[String],
) -> Result<String>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    let (first, rest) = word_list
        .split_first()
        .ok_or_else(|| PoetryError::invalid_input("cannot compose a line from an empty word list"))?;
    if connectors.is_empty() {
        return Err(PoetryError::invalid_input("connector palette is empty"));
    }
    if let Some(connector) = connectors.iter().find(|c| c.contains('\n')) {
        return Err(PoetryError::invalid_input(format!(
            "connector {connector:?} contains a newline"
        )));
    }

    let mut output = first.as_ref().to_string();
    let mut length = output.chars().count();
    let mut last_word = first.as_ref();
    let mut last_connector: Option<&String> = None;

    for word in rest {
        let word = word.as_ref();
        // Longer lines are more likely to end here
        if rng.gen::<f64>() < 0.2 + length as f64 / 100.0 {
            break;
        }
        if too_similar(last_word, word) {
            continue;
        }
        let choices: Vec<&String> = connectors
            .iter()
            .filter(|c| Some(*c) != last_connector)
            .collect();
        let connector = match choices.choose(rng) {
            Some(c) => *c,
            // Single-connector palette: repetition is unavoidable
            None => &connectors[0],
        };
        let added = connector.chars().count() + word.chars().count();
        if length + added > max_length {
            break;
        }
        output.push_str(connector);
        output.push_str(word);
        length += added;
        last_connector = Some(connector);
        last_word = word;
    }
    Ok(output)
}
