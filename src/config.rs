use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PoetryError, Result};
use crate::validate::validate_word;

/// Top-level configuration. Every field has a default, so an empty YAML
/// document is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoetryConfig {
    pub palettes: Palettes,
    pub filter: FilterConfig,
    pub generator: GeneratorConfig,
    pub datamuse: DatamuseConfig,
}

/// Fixed string palettes chosen from at random while composing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Palettes {
    /// Glue strings placed between words of a visual poem line.
    pub connectors: Vec<String>,
    /// One of these joins the connector palette each time it is built.
    pub conjunction_connectors: Vec<String>,
    /// Added to the connector palette with `extra_connector_probability`.
    pub extra_connector: String,
    pub extra_connector_probability: f64,
    pub futurist_connectors: Vec<String>,
    /// Enders for visual poem lines.
    pub line_enders: Vec<String>,
    /// Enders for Markov poem lines. Repeated entries weight the draw.
    pub markov_line_enders: Vec<String>,
    pub line_indents: Vec<String>,
    pub common_words: Vec<String>,
}

impl Default for Palettes {
    fn default() -> Self {
        Self {
            connectors: strings(&[" ", "   ", "...   ", "  or  ", " or "]),
            conjunction_connectors: strings(&[" & ", " and "]),
            extra_connector: " -> ".to_string(),
            extra_connector_probability: 0.3,
            futurist_connectors: strings(&[" + ", " - ", " * ", " % ", " = ", " != ", " :: "]),
            line_enders: strings(&[".", ", ", "!", "?", "", " or", "..."]),
            markov_line_enders: strings(&["", "", ",", ",", "!", ".", "?"]),
            line_indents: strings(&["", "    ", "         "]),
            common_words: strings(&[
                "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "with", "for", "as",
                "at", "by", "from", "into", "like", "through", "under", "over", "i", "you", "he",
                "she", "it", "we", "they", "this", "that", "my", "your", "our", "their", "his",
                "her", "its", "if", "when", "while", "so", "not", "all", "some", "is", "was",
            ]),
        }
    }
}

impl Palettes {
    /// Build a fresh connector palette for one poem.
    pub fn build_connectors<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut connectors = self.connectors.clone();
        if let Some(conjunction) = self.conjunction_connectors.choose(rng) {
            connectors.push(conjunction.clone());
        }
        if !self.extra_connector.is_empty() && rng.gen_bool(self.extra_connector_probability) {
            connectors.push(self.extra_connector.clone());
        }
        connectors
    }

    pub fn is_common_word(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.common_words.iter().any(|w| *w == lower)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Words rarer than this (per the frequency table) are dropped.
    pub frequency_threshold: f64,
    pub min_word_length: usize,
    /// Words the association service tends to return that break the flow.
    pub excluded_words: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            frequency_threshold: 4e-8,
            min_word_length: 3,
            excluded_words: strings(&["thew", "etc", "aka", "abbr", "esp", "approx"]),
        }
    }
}

/// Knobs for the weighted-random word generator and the poem assembler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sampling_pool_weight: f64,
    pub common_word_weight: f64,
    pub related_word_weight: f64,
    /// Candidate draws per word before falling back to a common word.
    pub max_retries: usize,
    /// How many times a relation lookup may be applied to its own result.
    pub recursion_depth: usize,
    pub recursion_probability: f64,
    /// Chance a line opens on a pool word instead of a common word.
    pub starter_pool_probability: f64,
    pub starter_retries: usize,
    pub terminal_word_max_length: usize,
    /// Non-terminal words stop once the line is this close to its budget.
    pub line_length_headroom: usize,
    /// How far past `max_line_length` a finished line may run.
    pub line_length_tolerance: usize,
    /// Cap on phonetically related words gathered per seed word.
    pub related_words_per_seed: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sampling_pool_weight: 0.45,
            common_word_weight: 0.2,
            related_word_weight: 0.35,
            max_retries: 6,
            recursion_depth: 1,
            recursion_probability: 0.35,
            starter_pool_probability: 0.6,
            starter_retries: 10,
            terminal_word_max_length: 12,
            line_length_headroom: 14,
            line_length_tolerance: 5,
            related_words_per_seed: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatamuseConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for DatamuseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.datamuse.com/words".to_string(),
            timeout_secs: 10,
        }
    }
}

impl PoetryConfig {
    /// Load configuration from a YAML or JSON file, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: PoetryConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.palettes;
        if p.connectors.is_empty() && p.conjunction_connectors.is_empty() {
            return Err(PoetryError::config("connector palette is empty"));
        }
        let all_connectors = p
            .connectors
            .iter()
            .chain(&p.conjunction_connectors)
            .chain(&p.futurist_connectors)
            .chain(std::iter::once(&p.extra_connector));
        for connector in all_connectors {
            if connector.contains('\n') {
                return Err(PoetryError::config(format!(
                    "connector {connector:?} contains a newline"
                )));
            }
        }
        if p.line_enders.is_empty() || p.markov_line_enders.is_empty() {
            return Err(PoetryError::config("line ender palette is empty"));
        }
        if p.markov_line_enders.iter().any(|e| e.chars().count() > 1) {
            return Err(PoetryError::config("markov line enders must be at most one character"));
        }
        if p.line_indents.is_empty() {
            return Err(PoetryError::config("indent palette is empty"));
        }
        let layout_strings = p.line_enders.iter().chain(&p.markov_line_enders).chain(&p.line_indents);
        if layout_strings.into_iter().any(|s| s.contains('\n')) {
            return Err(PoetryError::config("line enders and indents must not contain newlines"));
        }
        if p.common_words.is_empty() {
            return Err(PoetryError::config("common word list is empty"));
        }
        // Common words are fed back into relation lookups, which validate them
        for word in &p.common_words {
            if let Err(e) = validate_word(word) {
                return Err(PoetryError::config(format!("common word list: {e}")));
            }
        }
        if !(0.0..=1.0).contains(&p.extra_connector_probability) {
            return Err(PoetryError::config("extra_connector_probability must be within [0, 1]"));
        }

        let g = &self.generator;
        let weights = [g.sampling_pool_weight, g.common_word_weight, g.related_word_weight];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(PoetryError::config(
                "strategy weights must be non-negative with a positive sum",
            ));
        }
        for (name, prob) in [
            ("recursion_probability", g.recursion_probability),
            ("starter_pool_probability", g.starter_pool_probability),
        ] {
            if !(0.0..=1.0).contains(&prob) {
                return Err(PoetryError::config(format!("{name} must be within [0, 1]")));
            }
        }
        if g.terminal_word_max_length == 0 {
            return Err(PoetryError::config("terminal_word_max_length must be positive"));
        }
        if g.max_retries == 0 {
            return Err(PoetryError::config("max_retries must be at least 1"));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
