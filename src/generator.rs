//! Weighted-random word picker for Markov-style poem lines.
//!
//! Despite the name of the poem style, nothing here is a trained transition
//! model. Every non-terminal word comes from one of three strategies picked
//! by weight: the caller's sampling pool, the common-word palette, or a
//! relation lookup on the words already in the line.

use log::{debug, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::articles::projected_len;
use crate::config::{GeneratorConfig, Palettes};
use crate::error::{PoetryError, Result};
use crate::relations::{RelatedWordSource, Relation};
use crate::similarity::{too_similar, too_similar_to_any};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordStrategy {
    SamplingPool,
    CommonWord,
    RelatedWord,
}

impl WordStrategy {
    const ALL: [WordStrategy; 3] = [
        WordStrategy::SamplingPool,
        WordStrategy::CommonWord,
        WordStrategy::RelatedWord,
    ];
}

pub struct StochasticWordGenerator<'a> {
    source: RelatedWordSource<'a>,
    palettes: &'a Palettes,
    config: &'a GeneratorConfig,
    strategies: WeightedIndex<f64>,
    /// Words of the lines already produced in the current poem.
    previous_lines: Vec<Vec<String>>,
}

impl<'a> StochasticWordGenerator<'a> {
    pub fn new(
        source: RelatedWordSource<'a>,
        palettes: &'a Palettes,
        config: &'a GeneratorConfig,
    ) -> Result<Self> {
        let strategies = WeightedIndex::new([
            config.sampling_pool_weight,
            config.common_word_weight,
            config.related_word_weight,
        ])
        .map_err(|e| PoetryError::config(format!("invalid strategy weights: {e}")))?;
        Ok(Self {
            source,
            palettes,
            config,
            strategies,
            previous_lines: Vec::new(),
        })
    }

    pub fn with_previous_lines(mut self, lines: Vec<Vec<String>>) -> Self {
        self.previous_lines = lines;
        self
    }

    /// Remember a finished line so its opener is not reused.
    pub fn record_line(&mut self, words: &[String]) {
        self.previous_lines.push(words.to_vec());
    }

    pub fn previous_lines(&self) -> &[Vec<String>] {
        &self.previous_lines
    }

    fn is_common(&self, word: &str) -> bool {
        self.palettes.is_common_word(word)
    }

    fn is_previous_opener(&self, word: &str) -> bool {
        self.previous_lines
            .iter()
            .filter_map(|line| line.first())
            .any(|opener| opener == word)
    }

    fn draw_strategy<R: Rng + ?Sized>(&self, rng: &mut R) -> WordStrategy {
        WordStrategy::ALL[self.strategies.sample(rng)]
    }

    /// Look up a word related to the line so far by one of the non-rhyme
    /// relations, chosen at random.
    ///
    /// Frequently-follows is queried with the immediately preceding word, the
    /// other relations with the most recent non-common word. While `depth` is
    /// positive the lookup may be repeated on its own result.
    pub fn random_nonrhyme<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        output_so_far: &[String],
        depth: usize,
    ) -> Result<Option<String>> {
        let Some(relation) = Relation::NONRHYME.choose(rng).copied() else {
            return Ok(None);
        };
        let base = match relation {
            Relation::FrequentlyFollows => output_so_far.last(),
            _ => output_so_far
                .iter()
                .rev()
                .find(|w| !self.is_common(w))
                .or_else(|| output_so_far.last()),
        };
        let Some(base) = base else {
            return Ok(None);
        };

        let found = self.source.related_word(rng, base, relation)?;
        debug!("{relation} of {base:?} -> {found:?}");
        match found {
            Some(word) if depth > 0 && rng.gen_bool(self.config.recursion_probability) => {
                let deeper = self.random_nonrhyme(rng, std::slice::from_ref(&word), depth - 1)?;
                Ok(deeper.or(Some(word)))
            }
            other => Ok(other),
        }
    }

    /// Pick a non-terminal word for the line.
    ///
    /// Candidates too similar to a word already in the line, or longer than
    /// `max_word_length` once article correction is accounted for, are
    /// redrawn a bounded number of times before falling back to a common word.
    pub fn next_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        output_so_far: &[String],
        sampling_pool: &[String],
        max_word_length: Option<usize>,
    ) -> Result<String> {
        let fits = |w: &str| max_word_length.map_or(true, |max| projected_len(w) <= max);

        for _ in 0..self.config.max_retries {
            let candidate = match self.draw_strategy(rng) {
                WordStrategy::SamplingPool => {
                    let available: Vec<&String> = sampling_pool
                        .iter()
                        .filter(|w| !self.is_previous_opener(w))
                        .collect();
                    available.choose(rng).map(|w| (*w).clone())
                }
                WordStrategy::CommonWord => self.palettes.common_words.choose(rng).cloned(),
                WordStrategy::RelatedWord => {
                    self.random_nonrhyme(rng, output_so_far, self.config.recursion_depth)?
                }
            };
            let Some(candidate) = candidate else {
                continue;
            };
            if !fits(&candidate) {
                continue;
            }
            let repeats = if self.is_common(&candidate) {
                output_so_far.last().is_some_and(|prev| too_similar(prev, &candidate))
            } else {
                too_similar_to_any(&candidate, output_so_far)
            };
            if !repeats {
                return Ok(candidate);
            }
        }

        debug!("no candidate accepted after {} draws", self.config.max_retries);
        Ok(self.fallback_common_word(rng, output_so_far, max_word_length))
    }

    /// Pick the word that ends the line.
    ///
    /// Tries a rhyme for `rhyme_with` first (unless it is a common word),
    /// then related words. Common words are only used when nothing else fits
    /// in `max_length`.
    pub fn last_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        output_so_far: &[String],
        rhyme_with: Option<&str>,
        max_length: Option<usize>,
    ) -> Result<String> {
        let fits = |w: &str| max_length.map_or(true, |max| w.chars().count() <= max);
        let acceptable =
            |w: &str| fits(w) && !self.is_common(w) && !too_similar_to_any(w, output_so_far);

        if let Some(target) = rhyme_with.filter(|r| !r.is_empty() && !self.is_common(r)) {
            let rhymes = self.source.rhymes(rng, &[target], None)?;
            if let Some(rhyme) = rhymes
                .into_iter()
                .find(|w| acceptable(w) && !too_similar(w, target))
            {
                return Ok(rhyme);
            }
            debug!("no usable rhyme for {target:?}");
        }

        for _ in 0..self.config.max_retries {
            if let Some(word) =
                self.random_nonrhyme(rng, output_so_far, self.config.recursion_depth)?
            {
                if acceptable(&word) {
                    return Ok(word);
                }
            }
        }

        warn!("ending line on a common word");
        Ok(self.fallback_common_word(rng, output_so_far, max_length))
    }

    /// A common word that fits and does not repeat the previous word, else
    /// the shortest common word.
    fn fallback_common_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        output_so_far: &[String],
        max_length: Option<usize>,
    ) -> String {
        let common = &self.palettes.common_words;
        let fitting: Vec<&String> = common
            .iter()
            .filter(|w| max_length.map_or(true, |max| projected_len(w) <= max))
            .filter(|w| !output_so_far.last().is_some_and(|prev| too_similar(prev, w)))
            .collect();
        if let Some(word) = fitting.choose(rng) {
            return (*word).clone();
        }
        let min_len = common.iter().map(|w| w.chars().count()).min().unwrap_or(0);
        let shortest: Vec<&String> = common
            .iter()
            .filter(|w| w.chars().count() == min_len)
            .collect();
        // The palette is validated non-empty when the configuration is loaded.
        shortest
            .choose(rng)
            .map(|w| (*w).clone())
            .unwrap_or_else(|| "the".to_string())
    }
}
