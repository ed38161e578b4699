use generative_poetry::articles::correct_a_vs_an;
use generative_poetry::decomposer::cutup;
use generative_poetry::{
    compose_line, too_similar, FrequencyTable, PlainTextRenderer, PoemAssembler, PoemRenderer,
    PoetryConfig, PoetryError, RelatedWordSource, Relation, StaticLexicon, WordAssociation,
    WordFilter,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

fn words(s: &str) -> Vec<String> {
    s.split_whitespace().map(|w| w.to_string()).collect()
}

/// Offline associations for the seed words used below
fn lexicon() -> StaticLexicon {
    StaticLexicon::new()
        .with_words("chalice", Relation::Rhyme, &["palace", "malice", "alice", "callous"])
        .with_words("chalice", Relation::SimilarSound, &["challis", "chance", "chapel"])
        .with_words("chalice", Relation::SimilarMeaning, &["goblet", "cup", "grail"])
        .with_words("crime", Relation::Rhyme, &["time", "rhyme", "climb", "grime", "slime", "prime"])
        .with_words("crime", Relation::SimilarSound, &["crimp", "cream", "chime"])
        .with_words("crime", Relation::CoOccurring, &["punishment", "scene", "wave"])
        .with_words("coins", Relation::Rhyme, &["joins", "loins", "purloins"])
        .with_words("coins", Relation::SimilarSound, &["coin", "coils", "cones"])
        .with_words("coins", Relation::SimilarMeaning, &["currency", "change", "pennies"])
        .with_words("spectacular", Relation::Rhyme, &["vernacular", "tentacular"])
        .with_words("spectacular", Relation::SimilarSound, &["spectacle", "speculate"])
        .with_words("spectacular", Relation::SimilarMeaning, &["dramatic", "stunning", "glorious"])
        .with_words("dazzle", Relation::Rhyme, &["razzle", "frazzle"])
        .with_words("dazzle", Relation::SimilarSound, &["dazed", "tassel", "dizzy"])
        .with_words("dazzle", Relation::FrequentlyFollows, &["of", "the", "light", "and"])
        .with_words("enigma", Relation::Rhyme, &["stigma", "sigma"])
        .with_words("enigma", Relation::SimilarSound, &["enema", "enamel"])
        .with_words("enigma", Relation::SimilarMeaning, &["mystery", "puzzle", "riddle"])
        .with_words("crypt", Relation::Rhyme, &["script", "stripped", "tipped", "clipped"])
        .with_words("crypt", Relation::SimilarSound, &["crept", "crib", "cryptic"])
        .with_words("sleep", Relation::Rhyme, &["deep", "keep", "steep", "weep"])
        .with_words("sleep", Relation::SimilarSound, &["slip", "sleet", "slope"])
        .with_words("ghost", Relation::Rhyme, &["host", "most", "toast", "coast"])
        .with_words("ghost", Relation::SimilarSound, &["guest", "gust", "goat"])
        .with_words("time", Relation::Rhyme, &["dime", "lime", "mime", "chime"])
        .with_words("time", Relation::SimilarSound, &["team", "tame", "tome"])
}

/// An association service that is always down
struct Unreachable;

impl WordAssociation for Unreachable {
    fn related(
        &self,
        _word: &str,
        _relation: Relation,
        _max: Option<usize>,
    ) -> generative_poetry::Result<Vec<String>> {
        Err(PoetryError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "association service unreachable",
        )))
    }
}

#[test]
fn test_markov_poem_stays_within_bounds() {
    let lexicon = lexicon();
    let filter = WordFilter::new(&Default::default());
    let config = PoetryConfig::default();
    let assembler = PoemAssembler::new(RelatedWordSource::new(&lexicon, &filter), &config);
    let seeds = words("chalice crime coins spectacular dazzle enigma");

    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let poem = assembler
            .generate_markov_poem(&mut rng, &seeds, 8, 7, 10, Some(66))
            .unwrap();
        assert_eq!(poem.len(), 8);
        assert_eq!(poem.title(), "chalice, crime, coins, spectacular, dazzle, enigma");
        for line in poem.lines() {
            let count = line.split_whitespace().count();
            assert!((7..=10).contains(&count), "seed {seed}: {line:?}");
            assert!(line.chars().count() <= 71, "seed {seed}: {line:?}");
        }
    }
}

#[test]
fn test_markov_poem_is_reproducible_from_seed() {
    let lexicon = lexicon();
    let filter = WordFilter::new(&Default::default());
    let config = PoetryConfig::default();
    let assembler = PoemAssembler::new(RelatedWordSource::new(&lexicon, &filter), &config);
    let seeds = words("crime dazzle enigma");

    let first = assembler
        .generate_markov_poem(&mut StdRng::seed_from_u64(7), &seeds, 6, 4, 7, Some(40))
        .unwrap();
    let second = assembler
        .generate_markov_poem(&mut StdRng::seed_from_u64(7), &seeds, 6, 4, 7, Some(40))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_markov_poem_articles_agree() {
    let lexicon = lexicon();
    let filter = WordFilter::new(&Default::default());
    let config = PoetryConfig::default();
    let assembler = PoemAssembler::new(RelatedWordSource::new(&lexicon, &filter), &config);
    let seeds = words("enigma coins");

    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let poem = assembler
            .generate_markov_poem(&mut rng, &seeds, 4, 3, 6, None)
            .unwrap();
        for line in poem.lines() {
            let mut corrected = words(line);
            correct_a_vs_an(&mut corrected);
            assert_eq!(corrected, words(line));
        }
    }
}

#[test]
fn test_visual_poem_shape() {
    let lexicon = lexicon();
    let filter = WordFilter::new(&Default::default());
    let config = PoetryConfig::default();
    let assembler = PoemAssembler::new(RelatedWordSource::new(&lexicon, &filter), &config);
    let seeds = words("crypt sleep ghost time");

    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let poem = assembler
            .generate_visual_poem(&mut rng, &seeds, 6, 35, false, None)
            .unwrap();
        assert_eq!(poem.matches('\n').count(), 5, "{poem:?}");
        let last_line: Vec<&str> = poem.lines().last().unwrap().split_whitespace().collect();
        assert_eq!(last_line.len(), 2);
        assert_eq!(last_line[1], "time");
        assert!(["crypt", "sleep", "ghost"].contains(&last_line[0]));
    }
}

#[test]
fn test_compose_line_skips_near_duplicates() {
    let connectors = words("+ - *");
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let line = compose_line(&mut rng, &["crypt", "crypts", "sleep"], 35, &connectors).unwrap();
        assert!(line.starts_with("crypt"));
        assert!(!line.contains("crypts"), "{line:?}");
        assert!(line.chars().count() <= 35);
    }
}

#[test]
fn test_rhymes_exclude_filtered_words() {
    let lexicon = lexicon();
    let mut filter_config = generative_poetry::config::FilterConfig::default();
    filter_config.excluded_words.push("slime".to_string());
    let filter = WordFilter::new(&filter_config);
    let source = RelatedWordSource::new(&lexicon, &filter);
    let mut rng = StdRng::seed_from_u64(42);

    let rhymes = source.rhymes(&mut rng, &["crime"], None).unwrap();
    assert!(!rhymes.is_empty());
    assert!(!rhymes.contains(&"slime".to_string()));
    assert!(rhymes.iter().all(|w| !too_similar(w, "crime")));
}

#[test]
fn test_related_rare_words_prefer_rare() {
    let lexicon = lexicon();
    let filter = WordFilter::new(&Default::default()).with_frequencies(Box::new(
        FrequencyTable::from_counts([("time", 9000.0), ("rhyme", 300.0), ("grime", 2.0), ("crimp", 1.0)]),
    ));
    let source = RelatedWordSource::new(&lexicon, &filter);
    let mut rng = StdRng::seed_from_u64(42);

    // Words missing from the table count as too rare and are filtered out
    let mut rare = source.related_rare_words(&mut rng, &["crime"], None, Some(2)).unwrap();
    rare.sort();
    assert_eq!(rare, ["crimp", "grime"]);
}

#[test]
fn test_lexicon_from_json_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{"crime": {{"rhyme": ["time", "grime"], "similar_sound": ["crimp"]}}}}"#
    )
    .unwrap();
    let lexicon = StaticLexicon::from_path(file.path()).unwrap();
    assert_eq!(lexicon.len(), 1);

    let filter = WordFilter::new(&Default::default());
    let source = RelatedWordSource::new(&lexicon, &filter);
    let mut rng = StdRng::seed_from_u64(42);
    let mut rhymes = source.rhymes(&mut rng, &["crime"], None).unwrap();
    rhymes.sort();
    assert_eq!(rhymes, ["grime", "time"]);
}

#[test]
fn test_cutup_renders_as_text() {
    let text = "The chalice glittered on the altar. Nobody spoke of the crime. \
                Coins fell through the grate one by one, and the enigma remained.";
    let mut rng = StdRng::seed_from_u64(42);
    let cutouts = cutup(&mut rng, &[text], 2, 4).unwrap();
    assert!(!cutouts.is_empty());
    for cutout in &cutouts {
        let count = cutout.split_whitespace().count();
        assert!((1..=4).contains(&count), "{cutout:?}");
    }

    let mut out: Vec<u8> = Vec::new();
    PlainTextRenderer.render(&cutouts, &mut out).unwrap();
    let rendered = String::from_utf8(out).unwrap();
    assert_eq!(rendered.lines().count(), cutouts.len() + 2);
}

#[test]
fn test_association_failure_aborts_generation() {
    let filter = WordFilter::new(&Default::default());
    let config = PoetryConfig::default();
    let assembler = PoemAssembler::new(RelatedWordSource::new(&Unreachable, &filter), &config);
    let seeds = words("crypt sleep ghost time");
    let mut rng = StdRng::seed_from_u64(42);

    assert!(matches!(
        assembler.generate_markov_poem(&mut rng, &seeds, 6, 3, 6, Some(40)),
        Err(PoetryError::Io(_))
    ));
    assert!(matches!(
        assembler.generate_visual_poem(&mut rng, &seeds, 6, 35, false, None),
        Err(PoetryError::Io(_))
    ));
    assert!(matches!(
        assembler.generate_visual_poem(&mut rng, &seeds, 6, 35, true, None),
        Err(PoetryError::Io(_))
    ));
}

#[test]
fn test_poems_finish_without_any_related_words() {
    let lexicon = StaticLexicon::new();
    let filter = WordFilter::new(&Default::default());
    let config = PoetryConfig::default();
    let assembler = PoemAssembler::new(RelatedWordSource::new(&lexicon, &filter), &config);
    let seeds = words("crypt sleep ghost time");

    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let poem = assembler
            .generate_markov_poem(&mut rng, &seeds, 6, 3, 6, Some(40))
            .unwrap();
        assert_eq!(poem.len(), 6);
        for line in poem.lines() {
            let count = line.split_whitespace().count();
            assert!((3..=6).contains(&count), "seed {seed}: {line:?}");
            assert!(line.chars().count() <= 45, "seed {seed}: {line:?}");
        }

        let visual = assembler
            .generate_visual_poem(&mut rng, &seeds, 6, 35, false, None)
            .unwrap();
        assert_eq!(visual.matches('\n').count(), 5, "{visual:?}");
    }
}
