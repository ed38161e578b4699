use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use generative_poetry::decomposer::{cutup, DocumentFetcher};
use generative_poetry::render::layout::{self, Orientation, PageGenerator};
use generative_poetry::render::text_lines;
use generative_poetry::validate::split_input_words;
use generative_poetry::{
    DatamuseClient, Dictionary, FrequencyTable, PlainTextRenderer, PoemAssembler, PoemRenderer,
    PoetryConfig, RelatedWordSource, Relation, StaticLexicon, WordAssociation, WordFilter,
};

#[derive(Debug, Parser)]
#[command(name = "poemgen")]
#[command(about = "Generate poems from rhymes, sound-alikes and word associations")]
struct Cli {
    /// YAML or JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the random number generator (for reproducible poems)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Offline word association table (JSON) used instead of Datamuse
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,

    /// Spelling dictionary (hunspell .dic or one word per line)
    #[arg(long, global = true)]
    dictionary: Option<PathBuf>,

    /// Word frequency table (word,count CSV or word<TAB>frequency, optionally .gz)
    #[arg(long, global = true)]
    frequencies: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Markov-style poem with alternating rhymes
    Markov {
        /// Seed words, separated by spaces or commas (prompted when omitted)
        words: Vec<String>,
        #[arg(long, default_value_t = 10)]
        lines: usize,
        #[arg(long, default_value_t = 5)]
        min_words: usize,
        #[arg(long, default_value_t = 9)]
        max_words: usize,
        /// Character budget per line
        #[arg(long, default_value_t = 35)]
        max_length: usize,
    },
    /// Visual poem of composed word-list lines
    Visual {
        words: Vec<String>,
        #[arg(long, default_value_t = 6)]
        lines: usize,
        #[arg(long, default_value_t = 35)]
        max_length: usize,
        /// Build each line from the neighbours of a single seed word
        #[arg(long)]
        one_seed_per_line: bool,
    },
    /// Page layout for a visual poem, written as JSON
    Layout {
        #[arg(value_enum)]
        kind: LayoutKind,
        words: Vec<String>,
        #[arg(long, default_value = "landscape")]
        orientation: Orientation,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Word limit for the chaotic concrete layout
        #[arg(long, default_value_t = 200)]
        max_words: usize,
    },
    /// List related words for a seed word
    Related {
        word: String,
        /// Only this relation (rhyme, similar-sound, similar-meaning, co-occurring, frequently-follows)
        #[arg(long)]
        relation: Option<Relation>,
        #[arg(long)]
        sample: Option<usize>,
    },
    /// Cut a text into shuffled fragments
    Cutup {
        /// Project Gutenberg book url
        #[arg(long)]
        gutenberg: Option<String>,
        /// Internet Archive item url
        #[arg(long)]
        archive: Option<String>,
        /// Local text file
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        min_words: usize,
        #[arg(long, default_value_t = 7)]
        max_words: usize,
        /// Number of fragments to print
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutKind {
    Markov,
    Futurist,
    Chaotic,
    CharacterSoup,
}

/// Seed words from the command line, or from stdin until some are given.
fn get_input_words(args: &[String]) -> Result<Vec<String>> {
    let words = split_input_words(&args.join(" "));
    if !words.is_empty() {
        return Ok(words);
    }
    let stdin = io::stdin();
    loop {
        println!("To generate a poem, type some words separated by commas or spaces, and then press enter.\n");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("no input words given");
        }
        let words = split_input_words(&line);
        if !words.is_empty() {
            return Ok(words);
        }
    }
}

fn build_filter(cli: &Cli, config: &PoetryConfig) -> Result<WordFilter> {
    let mut filter = WordFilter::new(&config.filter);
    if let Some(path) = &cli.dictionary {
        let dictionary = Dictionary::from_path(path)
            .with_context(|| format!("loading dictionary {}", path.display()))?;
        filter = filter.with_spellchecker(Box::new(dictionary));
    }
    if let Some(path) = &cli.frequencies {
        let table = FrequencyTable::from_path(path)
            .with_context(|| format!("loading frequency table {}", path.display()))?;
        filter = filter.with_frequencies(Box::new(table));
    }
    Ok(filter)
}

fn build_association(cli: &Cli, config: &PoetryConfig) -> Result<Box<dyn WordAssociation>> {
    match &cli.lexicon {
        Some(path) => {
            let lexicon = StaticLexicon::from_path(path)
                .with_context(|| format!("loading lexicon {}", path.display()))?;
            Ok(Box::new(lexicon))
        }
        None => Ok(Box::new(DatamuseClient::new(&config.datamuse)?)),
    }
}

fn print_related(
    rng: &mut StdRng,
    source: &RelatedWordSource<'_>,
    word: &str,
    relation: Option<Relation>,
    sample: Option<usize>,
) -> Result<()> {
    let words = [word];
    let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
    let wanted = |r: Relation| relation.map_or(true, |only| only == r);
    if wanted(Relation::Rhyme) {
        groups.push(("rhymes", source.rhymes(rng, &words, sample)?));
    }
    if wanted(Relation::SimilarSound) {
        groups.push((
            "similar sounding",
            source.similar_sounding_words(rng, &words, sample.or(Some(6)), Some(50))?,
        ));
    }
    if wanted(Relation::SimilarMeaning) {
        groups.push((
            "similar meaning",
            source.similar_meaning_words(rng, &words, sample.or(Some(6)), Some(20))?,
        ));
    }
    if wanted(Relation::CoOccurring) {
        groups.push((
            "contextually linked",
            source.contextually_linked_words(rng, &words, sample.or(Some(6)), Some(20))?,
        ));
    }
    if wanted(Relation::FrequentlyFollows) {
        groups.push((
            "frequently following",
            source.frequently_following_words(rng, &words, sample.or(Some(8)), None)?,
        ));
    }
    if relation.is_none() {
        groups.push((
            "related rare",
            source.related_rare_words(rng, &words, sample.or(Some(8)), Some(20))?,
        ));
    }
    for (name, found) in groups {
        println!("{name}: {}", found.join(", "));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    let config = match &cli.config {
        Some(path) => PoetryConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PoetryConfig::default(),
    };
    let seed = cli.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!("random seed: {seed}");
    let mut rng = StdRng::seed_from_u64(seed);

    let filter = build_filter(&cli, &config)?;
    let association = build_association(&cli, &config)?;
    let source = RelatedWordSource::new(association.as_ref(), &filter);
    let assembler = PoemAssembler::new(source, &config);
    let renderer = PlainTextRenderer;
    let mut stdout = io::stdout();

    match &cli.command {
        Command::Markov {
            words,
            lines,
            min_words,
            max_words,
            max_length,
        } => {
            let words = get_input_words(words)?;
            let poem = assembler.generate_markov_poem(
                &mut rng,
                &words,
                *lines,
                *min_words,
                *max_words,
                Some(*max_length),
            )?;
            renderer.render(poem.lines(), &mut stdout)?;
        }
        Command::Visual {
            words,
            lines,
            max_length,
            one_seed_per_line,
        } => {
            let words = get_input_words(words)?;
            let poem = assembler.generate_visual_poem(
                &mut rng,
                &words,
                *lines,
                *max_length,
                *one_seed_per_line,
                None,
            )?;
            renderer.render(&text_lines(&poem), &mut stdout)?;
        }
        Command::Layout {
            kind,
            words,
            orientation,
            output_dir,
            max_words,
        } => {
            let pages = PageGenerator::new(output_dir.clone());
            let (page, name_words) = match kind {
                LayoutKind::CharacterSoup => (
                    layout::character_soup_layout(&mut rng),
                    vec!["character_soup".to_string()],
                ),
                LayoutKind::Markov => {
                    let words = get_input_words(words)?;
                    (layout::markov_layout(&mut rng, &assembler, &words, *orientation)?, words)
                }
                LayoutKind::Futurist => {
                    let words = get_input_words(words)?;
                    (layout::futurist_layout(&mut rng, &assembler, &words)?, words)
                }
                LayoutKind::Chaotic => {
                    let words = get_input_words(words)?;
                    (
                        layout::chaotic_concrete_layout(&mut rng, &assembler, &words, *max_words)?,
                        words,
                    )
                }
            };
            let path = pages.set_filename(&name_words, "json");
            page.write_json(&path)?;
            println!("{}", path.display());
        }
        Command::Related {
            word,
            relation,
            sample,
        } => {
            print_related(&mut rng, &source, word, *relation, *sample)?;
        }
        Command::Cutup {
            gutenberg,
            archive,
            file,
            min_words,
            max_words,
            count,
        } => {
            let text = match (gutenberg, archive, file) {
                (Some(url), _, _) => {
                    DocumentFetcher::new(config.datamuse.timeout_secs)?.get_gutenberg_document(url)?
                }
                (_, Some(url), _) => DocumentFetcher::new(config.datamuse.timeout_secs)?
                    .get_internet_archive_document(url)?,
                (_, _, Some(path)) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                _ => bail!("must specify one of: --gutenberg, --archive, or --file"),
            };
            let mut cutouts = cutup(&mut rng, &[text], *min_words, *max_words)?;
            cutouts.truncate(*count);
            renderer.render(&cutouts, &mut stdout)?;
        }
    }
    Ok(())
}
