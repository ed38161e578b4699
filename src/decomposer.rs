//! Source texts for found poetry: fetching public-domain documents and
//! cutting them apart.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{PoetryError, Result};

fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Terminal punctuation, optional closing quotes or brackets, then space
    RE.get_or_init(|| Regex::new(r#"[.!?]+["'\)\]]*\s+"#).expect("static regex"))
}

fn paragraph_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n\s*").expect("static regex"))
}

fn gutenberg_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:files|ebooks|epub)/(\d+)").expect("static regex"))
}

/// Split text into sentences on terminal punctuation followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in sentence_end_re().find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// A document split into sentences and paragraphs for random sampling.
#[derive(Debug, Clone)]
pub struct ParsedText {
    pub raw_text: String,
    pub sentences: Vec<String>,
    pub paragraphs: Vec<String>,
}

impl ParsedText {
    pub fn new(text: &str) -> Self {
        Self {
            raw_text: text.to_string(),
            sentences: split_sentences(text),
            paragraphs: text
                .split("\n\n")
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// A random sentence of at least `minimum_tokens` whitespace separated
    /// tokens, if the text has one.
    pub fn random_sentence<R: Rng + ?Sized>(&self, rng: &mut R, minimum_tokens: usize) -> Option<&str> {
        let eligible: Vec<&String> = self
            .sentences
            .iter()
            .filter(|s| s.split_whitespace().count() >= minimum_tokens)
            .collect();
        eligible.choose(rng).map(|s| s.as_str())
    }

    /// Up to `num` distinct random sentences.
    pub fn random_sentences<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        num: usize,
        minimum_tokens: usize,
    ) -> Vec<&str> {
        let mut eligible: Vec<&str> = self
            .sentences
            .iter()
            .filter(|s| s.split_whitespace().count() >= minimum_tokens)
            .map(|s| s.as_str())
            .collect();
        eligible.sort_unstable();
        eligible.dedup();
        eligible.choose_multiple(rng, num).copied().collect()
    }

    /// A random paragraph of at least `minimum_sentences` sentences.
    pub fn random_paragraph<R: Rng + ?Sized>(&self, rng: &mut R, minimum_sentences: usize) -> Option<&str> {
        let eligible: Vec<&String> = self
            .paragraphs
            .iter()
            .filter(|p| split_sentences(p).len() >= minimum_sentences)
            .collect();
        eligible.choose(rng).map(|p| p.as_str())
    }
}

/// Cut texts into runs of `min_words..=max_words` space separated words and
/// shuffle the pieces, like cutting up printed pages with scissors.
/// Punctuation stays attached to its word.
pub fn cutup<R, S>(rng: &mut R, texts: &[S], min_words: usize, max_words: usize) -> Result<Vec<String>>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    if min_words == 0 || min_words > max_words {
        return Err(PoetryError::invalid_input(format!(
            "cutout word bounds must satisfy 1 <= min <= max, got {min_words}..={max_words}"
        )));
    }
    let mut cutouts = Vec::new();
    for text in texts {
        let words: Vec<&str> = text.as_ref().split(' ').collect();
        let mut position = 0;
        while position < words.len() {
            let count = rng.gen_range(min_words..=max_words);
            let end = (position + count).min(words.len());
            let cutout = words[position..end].join(" ");
            if !cutout.trim().is_empty() {
                cutouts.push(cutout);
            }
            position = end;
        }
    }
    cutouts.shuffle(rng);
    Ok(cutouts)
}

/// Check that `url` is absolute and, when given, that its host contains
/// `expected_host` (e.g. "gutenberg.org").
pub fn validate_url(url: &str, expected_host: Option<&str>) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| PoetryError::invalid_url(url, e.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| PoetryError::invalid_url(url, "missing host"))?;
    if let Some(expected) = expected_host {
        if !host.contains(expected) {
            return Err(PoetryError::invalid_url(url, format!("not a valid {expected} document url")));
        }
    }
    Ok(parsed)
}

/// The numeric document id in a Project Gutenberg url.
pub fn gutenberg_document_id(url: &str) -> Result<u64> {
    let parsed = validate_url(url, Some("gutenberg.org"))?;
    let captures = gutenberg_id_re()
        .captures(parsed.path())
        .ok_or_else(|| PoetryError::invalid_url(url, "no document id in path"))?;
    captures[1]
        .parse()
        .map_err(|_| PoetryError::invalid_url(url, "document id out of range"))
}

/// Internet Archive item identifier: the second path segment, as in
/// `https://archive.org/details/<id>`.
pub fn internet_archive_id(url: &str) -> Result<String> {
    let parsed = validate_url(url, Some("archive.org"))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.nth(1))
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .ok_or_else(|| PoetryError::invalid_url(url, "no item id in path"))
}

/// Drop the Project Gutenberg license header and footer, keeping the text
/// between the `*** START OF` and `*** END OF` markers.
pub fn strip_gutenberg_headers(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let is_marker = |line: &str, marker: &str| {
        let line = line.trim_start_matches('*').trim().to_uppercase();
        line.starts_with(marker)
    };
    let start = lines
        .iter()
        .position(|l| l.starts_with("***") && is_marker(l, "START OF"))
        .map_or(0, |i| i + 1);
    let end = lines
        .iter()
        .rposition(|l| l.starts_with("***") && is_marker(l, "END OF"))
        .filter(|&i| i >= start)
        .unwrap_or(lines.len());
    lines[start..end].join("\n").trim().to_string()
}

/// Join hard-wrapped lines with spaces. Blank lines still separate
/// paragraphs.
pub fn unwrap_lines(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    paragraph_break_re()
        .split(normalized.trim())
        .map(|paragraph| {
            paragraph
                .lines()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Deserialize)]
struct ArchiveMetadata {
    #[serde(default)]
    files: Vec<ArchiveFile>,
}

#[derive(Debug, Deserialize)]
struct ArchiveFile {
    name: String,
}

/// Downloads documents over blocking HTTP.
pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {url}");
        Ok(self.client.get(url).send()?.error_for_status()?.text()?)
    }

    /// Download a Project Gutenberg book as plain text, without the license
    /// header and footer.
    pub fn get_gutenberg_document(&self, url: &str) -> Result<String> {
        let id = gutenberg_document_id(url)?;
        let text = self.get_text(&format!("https://www.gutenberg.org/cache/epub/{id}/pg{id}.txt"))?;
        info!("downloaded gutenberg document {id} ({} bytes)", text.len());
        Ok(strip_gutenberg_headers(&text))
    }

    /// Download the first text file of an Internet Archive item with hard
    /// line wrapping removed. Items without a text version are an error.
    pub fn get_internet_archive_document(&self, url: &str) -> Result<String> {
        let id = internet_archive_id(url)?;
        let metadata: ArchiveMetadata =
            serde_json::from_str(&self.get_text(&format!("https://archive.org/metadata/{id}"))?)?;
        let file = metadata
            .files
            .iter()
            .find(|f| f.name.ends_with(".txt"))
            .ok_or_else(|| PoetryError::invalid_input(format!("archive.org item {id} has no text file")))?;
        let text = self.get_text(&format!("https://archive.org/download/{id}/{}", file.name))?;
        info!("downloaded archive.org document {id}/{} ({} bytes)", file.name, text.len());
        Ok(unwrap_lines(&text))
    }
}
