//! Related-word lookups.
//!
//! [`WordAssociation`] is the raw capability (one query per word and
//! relation). [`RelatedWordSource`] wraps it with validation, filtering and
//! random sampling, which is what the composition code consumes.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{PoetryError, Result};
use crate::filter::WordFilter;
use crate::similarity::too_similar;
use crate::validate::validate_word;

/// A named way two words can be related.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Rhyme,
    SimilarSound,
    SimilarMeaning,
    /// Words that tend to appear in the same documents.
    CoOccurring,
    /// Words that tend to directly follow the query word.
    FrequentlyFollows,
}

impl Relation {
    /// Relations the word generator draws from when it is not rhyming.
    pub const NONRHYME: [Relation; 4] = [
        Relation::SimilarSound,
        Relation::SimilarMeaning,
        Relation::CoOccurring,
        Relation::FrequentlyFollows,
    ];

    /// Datamuse query parameter for this relation.
    pub fn datamuse_param(&self) -> &'static str {
        match self {
            Relation::Rhyme => "rel_rhy",
            Relation::SimilarSound => "sl",
            Relation::SimilarMeaning => "ml",
            Relation::CoOccurring => "rel_trg",
            Relation::FrequentlyFollows => "lc",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Relation::Rhyme => "rhyme",
            Relation::SimilarSound => "similar_sound",
            Relation::SimilarMeaning => "similar_meaning",
            Relation::CoOccurring => "co_occurring",
            Relation::FrequentlyFollows => "frequently_follows",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Relation {
    type Err = PoetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "rhyme" => Ok(Relation::Rhyme),
            "similar_sound" | "sound" => Ok(Relation::SimilarSound),
            "similar_meaning" | "meaning" => Ok(Relation::SimilarMeaning),
            "co_occurring" | "contextual" => Ok(Relation::CoOccurring),
            "frequently_follows" | "follows" => Ok(Relation::FrequentlyFollows),
            other => Err(PoetryError::invalid_input(format!("unknown relation: {other}"))),
        }
    }
}

/// Source of related words, ordered from most to least relevant.
pub trait WordAssociation {
    fn related(&self, word: &str, relation: Relation, max: Option<usize>) -> Result<Vec<String>>;
}

/// Return a random sample of distinct words, or a shuffled copy of the
/// distinct words when no (or a too large) sample size is given.
pub fn extract_sample<R, S>(rng: &mut R, words: &[S], sample_size: Option<usize>) -> Vec<String>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    let mut unique = dedupe(words.iter().map(|w| w.as_ref().to_string()));
    match sample_size {
        Some(n) if n > 0 && n < unique.len() => unique.choose_multiple(rng, n).cloned().collect(),
        _ => {
            unique.shuffle(rng);
            unique
        }
    }
}

fn dedupe<I: IntoIterator<Item = String>>(words: I) -> Vec<String> {
    let mut seen = HashSet::new();
    words.into_iter().filter(|w| seen.insert(w.clone())).collect()
}

/// Filtered, sampled views over a [`WordAssociation`].
#[derive(Clone, Copy)]
pub struct RelatedWordSource<'a> {
    association: &'a dyn WordAssociation,
    filter: &'a WordFilter,
}

impl<'a> RelatedWordSource<'a> {
    pub fn new(association: &'a dyn WordAssociation, filter: &'a WordFilter) -> Self {
        Self {
            association,
            filter,
        }
    }

    pub fn filter(&self) -> &WordFilter {
        self.filter
    }

    fn lookup(&self, word: &str, relation: Relation, max: Option<usize>) -> Result<Vec<String>> {
        let results = self.association.related(word, relation, max)?;
        debug!("{relation} lookup for {word:?} returned {} words", results.len());
        Ok(results)
    }

    /// Rhymes for each word, filtered with spellcheck, in random order.
    pub fn rhymes<R, S>(&self, rng: &mut R, words: &[S], sample_size: Option<usize>) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let mut rhymes: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref();
            validate_word(word)?;
            let found = dedupe(self.lookup(word, Relation::Rhyme, None)?);
            rhymes.extend(self.filter.filter_word_list(&found, true, &rhymes));
        }
        Ok(extract_sample(rng, &rhymes, sample_size))
    }

    /// A random rhyme for the word, if one can be found.
    pub fn rhyme<R: Rng + ?Sized>(&self, rng: &mut R, word: &str) -> Result<Option<String>> {
        Ok(self.rhymes(rng, &[word], None)?.into_iter().next())
    }

    /// Similar sounding words. The input words themselves are excluded.
    pub fn similar_sounding_words<R, S>(
        &self,
        rng: &mut R,
        words: &[S],
        sample_size: Option<usize>,
        api_max: Option<usize>,
    ) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let inputs: Vec<String> = words.iter().map(|w| w.as_ref().to_string()).collect();
        let mut found: Vec<String> = Vec::new();
        for word in &inputs {
            validate_word(word)?;
            let response = self.lookup(word, Relation::SimilarSound, api_max)?;
            let exclude: Vec<String> = inputs.iter().chain(&found).cloned().collect();
            found.extend(self.filter.filter_word_list(&response, true, &exclude));
        }
        Ok(extract_sample(rng, &found, sample_size))
    }

    pub fn similar_sounding_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        word: &str,
        api_max: Option<usize>,
    ) -> Result<Option<String>> {
        Ok(self
            .similar_sounding_words(rng, &[word], Some(1), api_max)?
            .into_iter()
            .next())
    }

    /// Similar meaning words. Not spellchecked.
    pub fn similar_meaning_words<R, S>(
        &self,
        rng: &mut R,
        words: &[S],
        sample_size: Option<usize>,
        api_max: Option<usize>,
    ) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        self.unchecked_relation_words(rng, words, Relation::SimilarMeaning, sample_size, api_max)
    }

    pub fn similar_meaning_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        word: &str,
        api_max: Option<usize>,
    ) -> Result<Option<String>> {
        Ok(self
            .similar_meaning_words(rng, &[word], Some(1), api_max)?
            .into_iter()
            .next())
    }

    /// Words that frequently appear in the same document as the given words.
    ///
    /// Not spellchecked: the dictionary would drop proper nouns.
    pub fn contextually_linked_words<R, S>(
        &self,
        rng: &mut R,
        words: &[S],
        sample_size: Option<usize>,
        api_max: Option<usize>,
    ) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        self.unchecked_relation_words(rng, words, Relation::CoOccurring, sample_size, api_max)
    }

    pub fn contextually_linked_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        word: &str,
        api_max: Option<usize>,
    ) -> Result<Option<String>> {
        Ok(self
            .contextually_linked_words(rng, &[word], Some(1), api_max)?
            .into_iter()
            .next())
    }

    fn unchecked_relation_words<R, S>(
        &self,
        rng: &mut R,
        words: &[S],
        relation: Relation,
        sample_size: Option<usize>,
        api_max: Option<usize>,
    ) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let mut found: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref();
            validate_word(word)?;
            let response = self.lookup(word, relation, api_max)?;
            found.extend(self.filter.filter_word_list(&response, false, &found));
        }
        Ok(extract_sample(rng, &found, sample_size))
    }

    /// Words that frequently follow the given words.
    ///
    /// For sample sizes above 4, three of the sampled words come from the
    /// rarest results and the rest from the whole result list, which keeps
    /// the output from collapsing onto the most common continuations.
    pub fn frequently_following_words<R, S>(
        &self,
        rng: &mut R,
        words: &[S],
        sample_size: Option<usize>,
        api_max: Option<usize>,
    ) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let mut found: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref();
            validate_word(word)?;
            let response = self.lookup(word, Relation::FrequentlyFollows, api_max)?;
            // No spellcheck: it removes words like "of" that matter here.
            found.extend(self.filter.filter_word_list(&response, false, &found));
            found.shuffle(rng);
        }

        match sample_size {
            Some(n) if n > 4 => {
                let ending = match api_max {
                    None => 20,
                    Some(m) if m % 2 == 1 => m + 1,
                    Some(m) => m,
                };
                let head: Vec<String> = found.iter().take(ending).cloned().collect();
                let mut sample = extract_sample(rng, &head, Some(n - 3));
                let rare: Vec<String> = self
                    .filter
                    .sort_by_rarity(&found)
                    .into_iter()
                    .filter(|w| !sample.contains(w))
                    .take(ending)
                    .collect();
                sample.extend(extract_sample(rng, &rare, Some(3)));
                Ok(sample)
            }
            _ => Ok(extract_sample(rng, &found, sample_size)),
        }
    }

    pub fn frequently_following_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        word: &str,
        api_max: Option<usize>,
    ) -> Result<Option<String>> {
        Ok(self
            .frequently_following_words(rng, &[word], Some(1), api_max)?
            .into_iter()
            .next())
    }

    /// Rhymes plus similar sounding words for each input word.
    ///
    /// `max_per_word` caps how many rhymes and how many similar sounding
    /// words each input word contributes, which keeps a list of seeds
    /// balanced.
    pub fn phonetically_related_words<R, S>(
        &self,
        rng: &mut R,
        words: &[S],
        sample_size: Option<usize>,
        api_max: Option<usize>,
        max_per_word: Option<usize>,
    ) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let mut results: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref();
            results.extend(self.rhymes(rng, &[word], max_per_word)?);
            let nonrhymes: Vec<String> = self
                .similar_sounding_words(rng, &[word], sample_size, api_max)?
                .into_iter()
                .filter(|w| !results.contains(w))
                .take(max_per_word.unwrap_or(usize::MAX))
                .collect();
            results.extend(nonrhymes);
        }
        Ok(extract_sample(rng, &results, sample_size))
    }

    /// A random sample of rare words related to the inputs phonetically,
    /// contextually, or by meaning.
    ///
    /// `population_max` keeps only that many of the rarest related words per
    /// input word before sampling.
    pub fn related_rare_words<R, S>(
        &self,
        rng: &mut R,
        words: &[S],
        sample_size: Option<usize>,
        population_max: Option<usize>,
    ) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let mut results: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref();
            let mut related = self.phonetically_related_words(rng, &[word], None, Some(50), None)?;
            let linked = self.contextually_linked_words(rng, &[word], None, Some(100))?;
            related.extend(linked.into_iter().filter(|w| !related.contains(w)).collect::<Vec<_>>());
            let meaning = self.similar_meaning_words(rng, &[word], None, Some(100))?;
            related.extend(meaning.into_iter().filter(|w| !related.contains(w)).collect::<Vec<_>>());
            related.retain(|w| !too_similar(word, w));
            results.extend(
                self.filter
                    .sort_by_rarity(&related)
                    .into_iter()
                    .take(population_max.unwrap_or(usize::MAX)),
            );
        }
        Ok(extract_sample(rng, &results, sample_size))
    }

    pub fn related_rare_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        word: &str,
        population_max: Option<usize>,
    ) -> Result<Option<String>> {
        Ok(self
            .related_rare_words(rng, &[word], Some(1), population_max)?
            .into_iter()
            .next())
    }

    /// One random word by a single relation, with the lookup sizes used by
    /// the word generator.
    pub fn related_word<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        word: &str,
        relation: Relation,
    ) -> Result<Option<String>> {
        match relation {
            Relation::Rhyme => self.rhyme(rng, word),
            Relation::SimilarSound => self.similar_sounding_word(rng, word, Some(20)),
            Relation::SimilarMeaning => self.similar_meaning_word(rng, word, Some(10)),
            Relation::CoOccurring => self.contextually_linked_word(rng, word, Some(10)),
            Relation::FrequentlyFollows => self.frequently_following_word(rng, word, Some(10)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::filter::{Dictionary, FrequencyTable};
    use crate::lexicon::StaticLexicon;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TEST_SEED: u64 = 42;

    fn test_lexicon() -> StaticLexicon {
        StaticLexicon::new()
            .with_words("crime", Relation::Rhyme, &["time", "rhyme", "slime", "grime", "chime", "sublime"])
            .with_words("crime", Relation::SimilarSound, &["crimes", "cream", "grim", "crane", "time", "rime"])
            .with_words("crime", Relation::SimilarMeaning, &["felony", "offense", "misdeed", "sin"])
            .with_words("crime", Relation::CoOccurring, &["police", "punishment", "scene"])
            .with_words("crime", Relation::FrequentlyFollows, &["scene", "rate", "wave", "spree", "of", "boss", "lab"])
            .with_words("sleep", Relation::Rhyme, &["deep", "keep", "steep", "weep", "sweep"])
            .with_words("sleep", Relation::SimilarSound, &["slip", "sleet", "sheep"])
    }

    fn test_filter() -> WordFilter {
        let frequencies = FrequencyTable::from_counts([
            ("time", 500.0),
            ("rhyme", 20.0),
            ("slime", 5.0),
            ("grime", 4.0),
            ("chime", 3.0),
            ("sublime", 6.0),
            ("felony", 2.0),
            ("police", 100.0),
            ("scene", 80.0),
            ("punishment", 10.0),
        ]);
        // A threshold of zero keeps every word the table has never seen.
        let config = FilterConfig {
            frequency_threshold: 0.0,
            ..FilterConfig::default()
        };
        WordFilter::new(&config)
            .with_spellchecker(Box::new(Dictionary::from_words([
                "time", "rhyme", "slime", "grime", "chime", "cream", "grim", "crane", "deep", "keep",
                "steep", "weep", "sweep", "slip", "sleet", "sheep", "crimes",
            ])))
            .with_frequencies(Box::new(frequencies))
    }

    #[test]
    fn test_relation_from_str() {
        assert_eq!("rhyme".parse::<Relation>().unwrap(), Relation::Rhyme);
        assert_eq!("similar-sound".parse::<Relation>().unwrap(), Relation::SimilarSound);
        assert_eq!("follows".parse::<Relation>().unwrap(), Relation::FrequentlyFollows);
        assert!("antonym".parse::<Relation>().is_err());
    }

    #[test]
    fn test_extract_sample() {
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let words = ["a", "b", "c", "d", "b"];
        let all = extract_sample(&mut rng, &words, None);
        assert_eq!(all.len(), 4);
        let sample = extract_sample(&mut rng, &words, Some(2));
        assert_eq!(sample.len(), 2);
        assert_ne!(sample[0], sample[1]);
        assert_eq!(extract_sample(&mut rng, &words, Some(10)).len(), 4);
        assert!(extract_sample::<_, &str>(&mut rng, &[], Some(3)).is_empty());
    }

    #[test]
    fn test_rhymes_are_spellchecked() {
        let lexicon = test_lexicon();
        let filter = test_filter();
        let source = RelatedWordSource::new(&lexicon, &filter);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let mut rhymes = source.rhymes(&mut rng, &["crime"], None).unwrap();
        rhymes.sort();
        // "sublime" is not in the dictionary
        assert_eq!(rhymes, ["chime", "grime", "rhyme", "slime", "time"]);
        assert_eq!(source.rhymes(&mut rng, &["crime", "sleep"], Some(3)).unwrap().len(), 3);
    }

    #[test]
    fn test_rhyme_for_unknown_word_is_none() {
        let lexicon = test_lexicon();
        let filter = test_filter();
        let source = RelatedWordSource::new(&lexicon, &filter);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        assert_eq!(source.rhyme(&mut rng, "unrhymable").unwrap(), None);
    }

    #[test]
    fn test_invalid_word_is_rejected() {
        let lexicon = test_lexicon();
        let filter = test_filter();
        let source = RelatedWordSource::new(&lexicon, &filter);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        assert!(source.similar_meaning_words(&mut rng, &["gh0st"], None, None).is_err());
    }

    #[test]
    fn test_similar_sounding_words_exclude_inputs() {
        let lexicon = test_lexicon();
        let filter = test_filter();
        let source = RelatedWordSource::new(&lexicon, &filter);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let words = source.similar_sounding_words(&mut rng, &["crime"], None, Some(50)).unwrap();
        assert!(!words.contains(&"crime".to_string()));
        // "rime" is not in the dictionary
        assert!(!words.contains(&"rime".to_string()));
        assert_eq!(words.len(), 5);
    }

    #[test]
    fn test_meaning_words_skip_spellcheck() {
        let lexicon = test_lexicon();
        let filter = test_filter();
        let source = RelatedWordSource::new(&lexicon, &filter);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let mut words = source.similar_meaning_words(&mut rng, &["crime"], None, None).unwrap();
        words.sort();
        assert_eq!(words, ["felony", "misdeed", "offense", "sin"]);
    }

    #[test]
    fn test_frequently_following_words_mixes_rare_words() {
        let lexicon = test_lexicon();
        let filter = test_filter();
        let source = RelatedWordSource::new(&lexicon, &filter);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        // "of" is too short for the filter
        let words = source
            .frequently_following_words(&mut rng, &["crime"], Some(5), None)
            .unwrap();
        assert_eq!(words.len(), 5);
        let unique: HashSet<&String> = words.iter().collect();
        assert_eq!(unique.len(), 5);
        assert!(!words.contains(&"of".to_string()));
    }

    #[test]
    fn test_phonetically_related_words_caps_per_word() {
        let lexicon = test_lexicon();
        let filter = test_filter();
        let source = RelatedWordSource::new(&lexicon, &filter);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let words = source
            .phonetically_related_words(&mut rng, &["crime", "sleep"], None, Some(50), Some(2))
            .unwrap();
        assert!(words.len() <= 8);
        assert!(words.len() >= 6);
        let unique: HashSet<&String> = words.iter().collect();
        assert_eq!(unique.len(), words.len());
    }

    #[test]
    fn test_related_rare_words_prefers_rare() {
        let lexicon = test_lexicon();
        let filter = test_filter();
        let source = RelatedWordSource::new(&lexicon, &filter);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let words = source.related_rare_words(&mut rng, &["crime"], None, Some(3)).unwrap();
        assert_eq!(words.len(), 3);
        assert!(!words.contains(&"time".to_string()));
        assert!(!words.contains(&"crimes".to_string()));
    }
}
