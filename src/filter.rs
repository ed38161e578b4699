//! Word filtering by spelling, length, character set and corpus frequency.
//!
//! The spellchecker and the frequency corpus are injected capabilities. The
//! file-backed implementations here load a hunspell `.dic` (or a plain word
//! list) and a frequency table produced by the `build_frequencies` tool.

use flate2::read::GzDecoder;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::FilterConfig;
use crate::error::Result;
use crate::validate::has_invalid_characters;

/// Answers "is this word validly spelled".
pub trait Spellchecker {
    fn is_correct(&self, word: &str) -> bool;
}

/// Relative frequency of a word in some reference corpus (0.0 when unseen).
pub trait WordFrequency {
    fn frequency(&self, word: &str) -> f64;
}

/// A spelling dictionary held in memory.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashSet<String>,
}

impl Dictionary {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    /// Load a hunspell `.dic` file or a plain one-word-per-line list.
    ///
    /// The leading entry count of a `.dic` file and any `/FLAGS` suffixes are
    /// ignored.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = open_maybe_gz(path.as_ref())?;
        let mut words = HashSet::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let entry = line.trim();
            if entry.is_empty() || (i == 0 && entry.chars().all(|c| c.is_ascii_digit())) {
                continue;
            }
            let word = entry.split('/').next().unwrap_or(entry).trim();
            if !word.is_empty() {
                words.insert(word.to_lowercase());
            }
        }
        info!("Loaded {} dictionary words from {:?}", words.len(), path.as_ref());
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Spellchecker for Dictionary {
    fn is_correct(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }
}

/// Word frequencies normalised to sum to 1.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    freqs: HashMap<String, f64>,
}

impl FrequencyTable {
    /// Build from raw counts; counts are normalised by their total.
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut freqs: HashMap<String, f64> = HashMap::new();
        for (word, count) in counts {
            *freqs.entry(word.as_ref().to_lowercase()).or_insert(0.0) += count;
        }
        let total: f64 = freqs.values().sum();
        if total > 0.0 {
            for value in freqs.values_mut() {
                *value /= total;
            }
        }
        Self { freqs }
    }

    /// Load a `word,count` CSV (header row optional), or a tab separated
    /// file. Gzip input is detected by the `.gz` extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = open_maybe_gz(path)?;
        let is_tsv = path
            .to_str()
            .map(|p| p.trim_end_matches(".gz").ends_with(".tsv"))
            .unwrap_or(false);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(if is_tsv { b'\t' } else { b',' })
            .from_reader(reader);

        let mut counts: Vec<(String, f64)> = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let (Some(word), Some(count)) = (record.get(0), record.get(1)) else {
                continue;
            };
            // Header rows and malformed counts are skipped.
            if let Ok(count) = count.trim().parse::<f64>() {
                counts.push((word.trim().to_string(), count));
            }
        }
        info!("Loaded {} frequency entries from {:?}", counts.len(), path);
        Ok(Self::from_counts(counts))
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }
}

impl WordFrequency for FrequencyTable {
    fn frequency(&self, word: &str) -> f64 {
        self.freqs.get(&word.to_lowercase()).copied().unwrap_or(0.0)
    }
}

fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Filters candidate words coming back from the association service.
///
/// Either capability may be absent; the corresponding check is then skipped.
pub struct WordFilter {
    spellchecker: Option<Box<dyn Spellchecker>>,
    frequencies: Option<Box<dyn WordFrequency>>,
    frequency_threshold: f64,
    min_word_length: usize,
    excluded: HashSet<String>,
}

impl WordFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            spellchecker: None,
            frequencies: None,
            frequency_threshold: config.frequency_threshold,
            min_word_length: config.min_word_length,
            excluded: config.excluded_words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn with_spellchecker(mut self, spellchecker: Box<dyn Spellchecker>) -> Self {
        self.spellchecker = Some(spellchecker);
        self
    }

    pub fn with_frequencies(mut self, frequencies: Box<dyn WordFrequency>) -> Self {
        self.frequencies = Some(frequencies);
        self
    }

    /// Filter out a word if it is too short, has invalid characters, is too
    /// rare, is excluded, or (optionally) fails the spelling dictionary.
    pub fn filter_word(&self, word: &str, spellcheck: bool) -> bool {
        if word.chars().count() < self.min_word_length {
            return false;
        }
        if has_invalid_characters(word) {
            return false;
        }
        if let Some(freqs) = &self.frequencies {
            if freqs.frequency(word) < self.frequency_threshold {
                return false;
            }
        }
        if spellcheck {
            if let Some(checker) = &self.spellchecker {
                if !checker.is_correct(word) {
                    return false;
                }
            }
        }
        !self.excluded.contains(&word.to_lowercase())
    }

    /// Keep the words that pass [`filter_word`](Self::filter_word) and are not
    /// in `exclude`, preserving order.
    pub fn filter_word_list<S: AsRef<str>>(
        &self,
        words: &[S],
        spellcheck: bool,
        exclude: &[String],
    ) -> Vec<String> {
        let kept: Vec<String> = words
            .iter()
            .map(|w| w.as_ref())
            .filter(|w| !exclude.iter().any(|e| e.as_str() == *w))
            .filter(|w| self.filter_word(w, spellcheck))
            .map(|w| w.to_string())
            .collect();
        debug!("filter kept {}/{} words", kept.len(), words.len());
        kept
    }

    /// Sort words from rarest to most common. Ties keep their input order.
    pub fn sort_by_rarity<S: AsRef<str>>(&self, words: &[S]) -> Vec<String> {
        let mut sorted: Vec<String> = words.iter().map(|w| w.as_ref().to_string()).collect();
        if let Some(freqs) = &self.frequencies {
            sorted.sort_by(|a, b| {
                freqs
                    .frequency(a)
                    .partial_cmp(&freqs.frequency(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        sorted
    }
}
