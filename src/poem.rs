//! Poem assembly: Markov-style poems built word by word, and visual poems
//! built from composed word-list lines.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::fmt;

use crate::articles::{correct_a_vs_an, projected_len};
use crate::config::PoetryConfig;
use crate::error::{PoetryError, Result};
use crate::generator::StochasticWordGenerator;
use crate::line::compose_line;
use crate::relations::RelatedWordSource;
use crate::similarity::{too_similar, too_similar_to_any};
use crate::validate::validate_words;

/// A finished poem: its seed words, the pool its words were sampled from,
/// and its lines in order. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Poem {
    input_words: Vec<String>,
    sampling_pool: Vec<String>,
    lines: Vec<String>,
}

impl Poem {
    pub fn new(input_words: Vec<String>, sampling_pool: Vec<String>, lines: Vec<String>) -> Self {
        Self {
            input_words,
            sampling_pool,
            lines,
        }
    }

    pub fn input_words(&self) -> &[String] {
        &self.input_words
    }

    pub fn sampling_pool(&self) -> &[String] {
        &self.sampling_pool
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn title(&self) -> String {
        self.input_words.join(", ")
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Poem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

pub struct PoemAssembler<'a> {
    source: RelatedWordSource<'a>,
    config: &'a PoetryConfig,
}

impl<'a> PoemAssembler<'a> {
    pub fn new(source: RelatedWordSource<'a>, config: &'a PoetryConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> RelatedWordSource<'a> {
        self.source
    }

    pub fn config(&self) -> &'a PoetryConfig {
        self.config
    }

    fn generator(&self) -> Result<StochasticWordGenerator<'a>> {
        StochasticWordGenerator::new(self.source, &self.config.palettes, &self.config.generator)
    }

    /// Seed words plus their phonetic neighbours, with one word of every
    /// too-similar pair dropped, in random order.
    pub fn sampling_pool<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        input_words: &[String],
    ) -> Result<Vec<String>> {
        let mut candidates = input_words.to_vec();
        candidates.extend(self.source.phonetically_related_words(
            rng,
            input_words,
            None,
            Some(50),
            Some(self.config.generator.related_words_per_seed),
        )?);
        // Shuffled first, so which word of a similar pair survives is random
        candidates.shuffle(rng);
        let mut pool: Vec<String> = Vec::with_capacity(candidates.len());
        for word in candidates {
            if !too_similar_to_any(&word, &pool) {
                pool.push(word);
            }
        }
        debug!("sampling pool has {} words", pool.len());
        Ok(pool)
    }

    /// Generate a Markov-style poem.
    ///
    /// Every odd line (counting from zero) tries to rhyme with the last word
    /// of the line before it. Each line has between `min_line_words` and
    /// `max_line_words` words and, given a budget, stays within
    /// `max_line_length` plus the configured tolerance. Line enders are only
    /// attached once all lines exist so rhyme lookups see bare words.
    pub fn generate_markov_poem<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        input_words: &[String],
        num_lines: usize,
        min_line_words: usize,
        max_line_words: usize,
        max_line_length: Option<usize>,
    ) -> Result<Poem> {
        validate_words(input_words)?;
        if num_lines == 0 {
            return Err(PoetryError::invalid_input("a poem needs at least one line"));
        }
        if min_line_words < 2 || min_line_words > max_line_words {
            return Err(PoetryError::invalid_input(format!(
                "line word bounds must satisfy 2 <= min <= max, got {min_line_words}..={max_line_words}"
            )));
        }

        let sampling_pool = self.sampling_pool(rng, input_words)?;
        // Starters are popped from this copy
        let mut pool = sampling_pool.clone();
        let mut generator = self.generator()?;
        let mut lines: Vec<Vec<String>> = Vec::with_capacity(num_lines);
        let mut enders: Vec<&String> = Vec::with_capacity(num_lines);

        for i in 0..num_lines {
            let rhyme_with = if i % 2 == 1 {
                lines.last().and_then(|line| line.last()).cloned()
            } else {
                None
            };
            let previous_starter = lines.last().and_then(|line| line.first()).cloned();
            let starter = self.choose_starter(rng, &mut pool, previous_starter.as_deref());
            let num_words = rng.gen_range(min_line_words..=max_line_words);
            let words = self.markov_line_words(
                &generator,
                rng,
                starter,
                num_words,
                min_line_words,
                rhyme_with.as_deref(),
                &pool,
                max_line_length,
            )?;
            debug!("line {i}: {}", words.join(" "));
            generator.record_line(&words);
            lines.push(words);
            if let Some(ender) = self.config.palettes.markov_line_enders.choose(rng) {
                enders.push(ender);
            }
        }

        let lines: Vec<String> = lines
            .iter()
            .enumerate()
            .map(|(i, words)| {
                let ender = enders.get(i).map(|e| e.as_str()).unwrap_or("");
                format!("{}{}", words.join(" "), ender)
            })
            .collect();
        info!("generated {}-line markov poem from {:?}", lines.len(), input_words);
        Ok(Poem::new(input_words.to_vec(), sampling_pool, lines))
    }

    /// Generate one Markov-style line starting with `starter`, without a
    /// line ender. `previous_lines` are lines of the poem so far.
    #[allow(clippy::too_many_arguments)]
    pub fn poem_line_from_markov<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        starter: &str,
        num_words: usize,
        rhyme_with: Option<&str>,
        sampling_pool: &[String],
        max_line_length: Option<usize>,
        previous_lines: &[String],
    ) -> Result<String> {
        if num_words < 2 {
            return Err(PoetryError::invalid_input("a line needs at least two words"));
        }
        let generator = self.generator()?.with_previous_lines(
            previous_lines
                .iter()
                .map(|line| line.split_whitespace().map(|w| w.to_string()).collect())
                .collect(),
        );
        let words = self.markov_line_words(
            &generator,
            rng,
            starter.to_string(),
            num_words,
            2,
            rhyme_with,
            sampling_pool,
            max_line_length,
        )?;
        Ok(words.join(" "))
    }

    /// Pop a pool word or draw a common word, redrawing while it is too
    /// similar to the previous line's opener.
    fn choose_starter<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        pool: &mut Vec<String>,
        previous_starter: Option<&str>,
    ) -> String {
        let settings = &self.config.generator;
        let common = &self.config.palettes.common_words;
        let acceptable = |w: &str| previous_starter.map_or(true, |prev| !too_similar(w, prev));

        for _ in 0..=settings.starter_retries {
            let candidate = if !pool.is_empty() && rng.gen_bool(settings.starter_pool_probability) {
                pool.pop()
            } else {
                common.choose(rng).cloned()
            };
            if let Some(candidate) = candidate.filter(|w| acceptable(w)) {
                return candidate;
            }
        }
        let fallback: Vec<&String> = common.iter().filter(|w| acceptable(w)).collect();
        fallback
            .choose(rng)
            .map(|w| (*w).clone())
            .or_else(|| common.first().cloned())
            .unwrap_or_else(|| "the".to_string())
    }

    /// Build a line's words. Non-terminal words are capped so that the
    /// `min_words` mandatory words, a terminal word, and a one-character
    /// ender still fit in the tolerated length.
    #[allow(clippy::too_many_arguments)]
    fn markov_line_words<R: Rng + ?Sized>(
        &self,
        generator: &StochasticWordGenerator<'_>,
        rng: &mut R,
        starter: String,
        num_words: usize,
        min_words: usize,
        rhyme_with: Option<&str>,
        sampling_pool: &[String],
        max_line_length: Option<usize>,
    ) -> Result<Vec<String>> {
        let settings = &self.config.generator;
        let limit = max_line_length.map(|max| max + settings.line_length_tolerance);
        // terminal word, its leading space, and the ender
        let terminal_reserve = settings.terminal_word_max_length + 2;

        let mut words = vec![starter];
        while words.len() + 1 < num_words {
            let projected = projected_line_len(&words);
            if let Some(max) = max_line_length {
                let near_budget = max > settings.line_length_headroom
                    && projected >= max - settings.line_length_headroom;
                if near_budget && words.len() + 1 >= min_words {
                    break;
                }
            }
            let max_word_length = limit.map(|limit| {
                let mandatory = min_words.saturating_sub(1 + words.len()).max(1);
                let room = limit.saturating_sub(projected + terminal_reserve);
                (room / mandatory).saturating_sub(1)
            });
            let word = generator.next_word(rng, &words, sampling_pool, max_word_length)?;
            words.push(word);
        }

        let terminal_max = match limit {
            Some(limit) => settings
                .terminal_word_max_length
                .min(limit.saturating_sub(projected_line_len(&words) + 2)),
            None => settings.terminal_word_max_length,
        };
        let last = generator.last_word(rng, &words, rhyme_with, Some(terminal_max))?;
        words.push(last);
        correct_a_vs_an(&mut words);
        Ok(words)
    }

    /// Generate a visual poem: `num_lines - 1` composed lines followed by a
    /// closing line of a random seed word and the last seed word.
    ///
    /// With `limit_to_one_seed_word` each line draws only from the
    /// neighbours of one randomly chosen seed word. Otherwise all seeds and
    /// their neighbours are pooled and reshuffled per line. Without explicit
    /// connectors a fresh palette is built for the poem.
    pub fn generate_visual_poem<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        input_words: &[String],
        num_lines: usize,
        max_line_length: usize,
        limit_to_one_seed_word: bool,
        connectors: Option<&[String]>,
    ) -> Result<String> {
        validate_words(input_words)?;
        if input_words.len() < 2 {
            return Err(PoetryError::invalid_input(
                "a visual poem needs at least two seed words",
            ));
        }
        if num_lines == 0 {
            return Err(PoetryError::invalid_input("a poem needs at least one line"));
        }
        let palettes = &self.config.palettes;
        let connectors = match connectors {
            Some(connectors) => connectors.to_vec(),
            None => palettes.build_connectors(rng),
        };

        let mut pooled: Vec<String> = Vec::new();
        if !limit_to_one_seed_word {
            pooled = input_words.to_vec();
            pooled.extend(self.source.phonetically_related_words(rng, input_words, None, Some(50), None)?);
        }

        let mut output = String::new();
        let mut indent = "";
        for _ in 0..num_lines - 1 {
            let line = if limit_to_one_seed_word {
                let seed = input_words
                    .choose(rng)
                    .ok_or_else(|| PoetryError::invalid_input("no seed words"))?;
                let mut word_list =
                    self.source.phonetically_related_words(rng, &[seed], None, Some(50), None)?;
                if word_list.is_empty() {
                    word_list.push(seed.clone());
                }
                compose_line(rng, &word_list, max_line_length, &connectors)?
            } else {
                pooled.shuffle(rng);
                compose_line(rng, &pooled, max_line_length, &connectors)?
            };
            output.push_str(&line);
            if let Some(ender) = palettes.line_enders.choose(rng) {
                output.push_str(ender);
            }
            output.push('\n');
            indent = next_indent(rng, &palettes.line_indents, indent);
            output.push_str(indent);
        }

        let (last, rest) = input_words
            .split_last()
            .ok_or_else(|| PoetryError::invalid_input("no seed words"))?;
        let closer = rest
            .choose(rng)
            .ok_or_else(|| PoetryError::invalid_input("no seed words"))?;
        output.push_str(closer);
        output.push(' ');
        output.push_str(last);
        info!("generated {num_lines}-line visual poem from {input_words:?}");
        Ok(output)
    }
}

/// Any indent after an unindented line, otherwise one that differs from
/// the previous indent.
fn next_indent<'p, R: Rng + ?Sized>(rng: &mut R, indents: &'p [String], previous: &str) -> &'p str {
    let choices: Vec<&String> = if previous.is_empty() {
        indents.iter().collect()
    } else {
        indents.iter().filter(|i| i.as_str() != previous).collect()
    };
    choices.choose(rng).map(|i| i.as_str()).unwrap_or("")
}

fn projected_line_len(words: &[String]) -> usize {
    let chars: usize = words.iter().map(|w| projected_len(w)).sum();
    chars + words.len().saturating_sub(1)
}
