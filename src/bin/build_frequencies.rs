//! Build the `word,count` frequency table read by `poemgen --frequencies`.
//!
//! Supported inputs:
//! 1. Google Books Ngram 1-gram files (`word[_POS]\tyear\tmatch_count...`,
//!    plain or .gz); counts are summed across years
//! 2. wordfrequency.info lists (`rank|word|pos|freq...`, tab, pipe or comma
//!    separated), optionally downloaded and cached
//! 3. CSV files (`word,count` with a header row)
//!
//! Data source for the COCA sample: https://www.wordfrequency.info/samples.asp

use anyhow::{bail, Context};
use clap::Parser;
use flate2::read::GzDecoder;
use log::{info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const COCA_SAMPLE_URL: &str = "https://www.wordfrequency.info/samples/lemmas_60k.txt";
const CACHE_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Parser)]
#[command(
    name = "build_frequencies",
    about = "Convert word frequency data into the CSV table used for word filtering",
    long_about = None
)]
struct Args {
    /// Keep only the N most frequent words (default: all)
    #[arg(short = 'n', long = "top-n")]
    top_n: Option<usize>,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Path(s) to Google Books Ngram 1-gram file(s) (.gz or plain text)
    #[arg(long = "ngram")]
    ngram: Option<Vec<PathBuf>>,

    /// Path to CSV frequency file (format: word,count)
    #[arg(long = "csv")]
    csv: Option<PathBuf>,

    /// Path to wordfrequency.info format file (lemmas_60k.txt format)
    #[arg(long = "wordfreq")]
    wordfreq: Option<PathBuf>,

    /// Download free COCA word frequency data from wordfrequency.info
    #[arg(long = "download-coca")]
    download_coca: bool,

    /// Force re-download even if cached file exists
    #[arg(long = "force-download")]
    force_download: bool,

    /// Minimum word length
    #[arg(long = "min-length", default_value_t = 1)]
    min_length: usize,

    /// Maximum word length
    #[arg(long = "max-length", default_value_t = 30)]
    max_length: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Strip a `_POS` suffix, as in "dazzle_VERB".
fn strip_pos_suffix(word: &str) -> &str {
    word.split('_').next().unwrap_or(word)
}

fn parse_ngram_line(line: &str) -> Option<(String, f64)> {
    let parts: Vec<&str> = line.trim().split('\t').collect();
    if parts.len() < 3 {
        return None;
    }
    let word = strip_pos_suffix(&parts[0].to_lowercase()).to_string();
    let count = parts[2].parse::<i64>().ok()?;
    Some((word, count as f64))
}

fn parse_wordfrequency_line(line: &str) -> Option<(String, f64)> {
    for sep in ['\t', '|', ','] {
        if !line.contains(sep) {
            continue;
        }
        let parts: Vec<&str> = line.trim().split(sep).collect();
        if parts.len() < 4 || parts[0].trim().parse::<i32>().is_err() {
            continue;
        }
        let word = strip_pos_suffix(&parts[1].trim().to_lowercase()).to_string();
        let freq = parts
            .iter()
            .skip(3)
            .find_map(|part| part.trim().parse::<f64>().ok())?;
        return Some((word, freq));
    }
    None
}

fn open_input(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader: Box<dyn BufRead> = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

fn process_ngram_file(path: &Path, counts: &mut HashMap<String, f64>) -> anyhow::Result<()> {
    info!("Processing {}...", path.display());
    let mut line_count = 0usize;
    for line in open_input(path)?.lines() {
        if let Some((word, count)) = parse_ngram_line(&line?) {
            *counts.entry(word).or_insert(0.0) += count;
        }
        line_count += 1;
        if line_count % 1_000_000 == 0 {
            info!("  Processed {line_count} lines...");
        }
    }
    Ok(())
}

fn process_wordfrequency_file(path: &Path, counts: &mut HashMap<String, f64>) -> anyhow::Result<()> {
    info!("Reading wordfrequency.info file: {}", path.display());
    for (line_num, line) in open_input(path)?.lines().enumerate() {
        let line = line?;
        let lower = line.to_lowercase();
        if line_num < 2 && (lower.contains("rank") || lower.contains("lemma")) {
            continue;
        }
        if let Some((word, freq)) = parse_wordfrequency_line(&line) {
            // Lemma lists repeat a word once per part of speech
            let entry = counts.entry(word).or_insert(0.0);
            *entry = entry.max(freq);
        }
    }
    Ok(())
}

fn process_csv_file(path: &Path, counts: &mut HashMap<String, f64>) -> anyhow::Result<()> {
    info!("Reading CSV file: {}", path.display());
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(open_input(path)?);
    for record in reader.records() {
        let record = record?;
        let (Some(word), Some(count)) = (record.get(0), record.get(1)) else {
            continue;
        };
        if let Ok(count) = count.trim().parse::<f64>() {
            let entry = counts.entry(word.trim().to_lowercase()).or_insert(0.0);
            *entry = entry.max(count);
        }
    }
    Ok(())
}

fn download_wordfrequency_data(force_download: bool) -> anyhow::Result<PathBuf> {
    let cache_file = std::env::current_dir()
        .ok()
        .map(|dir| dir.join("lemmas_60k.txt"))
        .filter(|cache| cache.exists())
        .unwrap_or_else(|| std::env::temp_dir().join("lemmas_60k.txt"));

    if !force_download {
        let age = std::fs::metadata(&cache_file)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok());
        if let Some(age) = age.filter(|age| age.as_secs() < CACHE_MAX_AGE_SECS) {
            info!(
                "Using cached file {} ({} days old)",
                cache_file.display(),
                age.as_secs() / (24 * 60 * 60)
            );
            return Ok(cache_file);
        }
    }

    info!("Downloading word frequency data from {COCA_SAMPLE_URL}");
    let content = reqwest::blocking::get(COCA_SAMPLE_URL)?
        .error_for_status()?
        .text()?;
    std::fs::write(&cache_file, content)
        .with_context(|| format!("writing cache file {}", cache_file.display()))?;
    info!("Downloaded and cached to {}", cache_file.display());
    Ok(cache_file)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    let mut counts: HashMap<String, f64> = HashMap::new();
    if let Some(ngram_files) = &args.ngram {
        for ngram_file in ngram_files {
            if !ngram_file.exists() {
                warn!("File not found: {}", ngram_file.display());
                continue;
            }
            process_ngram_file(ngram_file, &mut counts)?;
        }
    } else if args.download_coca {
        let cache_file = download_wordfrequency_data(args.force_download)?;
        process_wordfrequency_file(&cache_file, &mut counts)?;
    } else if let Some(wordfreq_file) = &args.wordfreq {
        process_wordfrequency_file(wordfreq_file, &mut counts)?;
    } else if let Some(csv_file) = &args.csv {
        process_csv_file(csv_file, &mut counts)?;
    } else {
        bail!("must specify one of: --download-coca, --wordfreq, --csv, or --ngram");
    }

    let mut sorted: Vec<(String, f64)> = counts
        .into_iter()
        .filter(|(w, _)| {
            let len = w.chars().count();
            len >= args.min_length && len <= args.max_length && w.chars().all(|c| c.is_alphabetic())
        })
        .collect();
    if sorted.is_empty() {
        bail!("no words found, check your input files");
    }
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(top_n) = args.top_n {
        sorted.truncate(top_n);
    }

    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).with_context(|| format!("creating {}", path.display()))?),
        None => Box::new(io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["word", "count"])?;
    for (word, count) in &sorted {
        writer.write_record([word.as_str(), count.to_string().as_str()])?;
    }
    writer.flush()?;

    if let (Some((_, first)), Some((_, last))) = (sorted.first(), sorted.last()) {
        info!("Wrote {} words, frequency range {last:.0} to {first:.0}", sorted.len());
    }
    Ok(())
}
