//! Page layouts for visual poems.
//!
//! A layout is a list of strings, each with a position, font, size and
//! optional colour, on a US letter page. Coordinates are PDF points with the
//! origin at the bottom left.

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PoetryError, Result};
use crate::line::compose_line;
use crate::poem::PoemAssembler;

pub const LETTER_WIDTH: u32 = 612;
pub const LETTER_HEIGHT: u32 = 792;

pub const DEFAULT_FONT_SIZES: [u32; 6] = [12, 14, 16, 18, 24, 32];
/// Sizes for full-line layouts, where every string is a whole poem line.
pub const LINE_FONT_SIZES: [u32; 5] = [15, 18, 21, 24, 28];

/// Courier appears twice in each style so the widest face is drawn more often.
pub const FONT_CHOICES: [&str; 20] = [
    "arial",
    "arial-bold",
    "arial-italic",
    "arial-bolditalic",
    "Courier-Bold",
    "Courier-Bold",
    "Courier-BoldOblique",
    "Courier-BoldOblique",
    "Helvetica",
    "Helvetica-BoldOblique",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Times-Bold",
    "Times-BoldItalic",
    "Times-Italic",
    "Times-Roman",
    "Vera",
    "VeraBd",
    "VeraBI",
    "VeraIt",
];

const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn page_size(&self) -> (u32, u32) {
        match self {
            Orientation::Portrait => (LETTER_WIDTH, LETTER_HEIGHT),
            Orientation::Landscape => (LETTER_HEIGHT, LETTER_WIDTH),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

impl FromStr for Orientation {
    type Err = PoetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(PoetryError::invalid_input(format!(
                "must choose from the following orientations: portrait, landscape (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Text drawn at one coordinate: a line, a word, or a single character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualPoemString {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub font: String,
    pub font_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
    pub strings: Vec<VisualPoemString>,
}

impl PageLayout {
    pub fn new(orientation: Orientation) -> Self {
        let (width, height) = orientation.page_size();
        Self {
            orientation,
            width,
            height,
            strings: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        info!(
            "wrote {} strings to {}",
            self.strings.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// Thresholds at or above this would count every channel as bright.
const MAX_COLOR_THRESHOLD: f64 = 0.99;

/// A random colour where at most one channel is close to full intensity,
/// so text stays readable on a white page. A channel counts as close when
/// `1 - channel <= threshold`; the threshold is clamped to `[0, 0.99]`.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R, threshold: f64) -> Rgb {
    let threshold = if threshold.is_nan() {
        0.0
    } else {
        threshold.clamp(0.0, MAX_COLOR_THRESHOLD)
    };
    loop {
        let rgb = Rgb {
            r: rng.gen(),
            g: rng.gen(),
            b: rng.gen(),
        };
        let bright = [rgb.r, rgb.g, rgb.b]
            .iter()
            .filter(|c| 1.0 - **c <= threshold)
            .count();
        if bright <= 1 {
            return rgb;
        }
    }
}

/// Uppercase the text one time in four.
fn maybe_upper<R: Rng + ?Sized>(rng: &mut R, text: &str) -> String {
    if rng.gen_ratio(1, 4) {
        text.to_uppercase()
    } else {
        text.to_string()
    }
}

fn random_font<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FONT_CHOICES.choose(rng).copied().unwrap_or("Helvetica")
}

/// Placement heuristics shared by the page layouts.
#[derive(Debug, Clone)]
pub struct PageGenerator {
    pub orientation: Orientation,
    pub font_sizes: Vec<u32>,
    pub output_dir: PathBuf,
}

impl PageGenerator {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            orientation: Orientation::Landscape,
            font_sizes: DEFAULT_FONT_SIZES.to_vec(),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_font_sizes(mut self, sizes: &[u32]) -> Self {
        self.font_sizes = sizes.to_vec();
        self
    }

    /// Long lines get smaller type.
    pub fn get_font_size<R: Rng + ?Sized>(&self, rng: &mut R, line: &str) -> u32 {
        let len = line.chars().count();
        if len > 30 {
            16
        } else if len >= 24 {
            *[16, 18, 20].choose(rng).unwrap_or(&16)
        } else {
            self.font_sizes.choose(rng).copied().unwrap_or(16)
        }
    }

    /// Rightmost x at which a line can start without running off the page.
    pub fn get_max_x_coordinate(&self, line: &str, font: &str, font_size: u32) -> u32 {
        let len = line.chars().count();
        let portrait = self.orientation == Orientation::Portrait;
        // Courier is the widest face
        if (font_size >= 23 && len >= 17) || (font_size >= 20 && len > 30) || font.starts_with("Courier") {
            if portrait {
                30
            } else {
                60
            }
        } else if (font_size == 23 && len > 14) || (font_size >= 20 && len > 16) || len > 20 {
            if portrait {
                100
            } else {
                130
            }
        } else if portrait {
            250
        } else {
            280
        }
    }

    /// `<word>,<word>.<ext>` in the output directory, with a `(n)` suffix
    /// when that file already exists.
    pub fn set_filename<S: AsRef<str>>(&self, input_words: &[S], extension: &str) -> PathBuf {
        let stem = input_words
            .iter()
            .map(|w| w.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        let mut path = self.output_dir.join(format!("{stem}.{extension}"));
        let mut sequence = 0;
        while path.exists() {
            sequence += 1;
            path = self.output_dir.join(format!("{stem}({sequence}).{extension}"));
        }
        path
    }

    fn place_line<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        line: &str,
        font: &str,
        min_x: u32,
        y: u32,
    ) -> VisualPoemString {
        let text = maybe_upper(rng, line);
        let font_size = self.get_font_size(rng, line);
        let max_x = self.get_max_x_coordinate(line, font, font_size).max(min_x);
        VisualPoemString {
            text,
            x: rng.gen_range(min_x..=max_x),
            y,
            font: font.to_string(),
            font_size,
            rgb: None,
        }
    }
}

/// Lines of a Markov poem, one per row, at random indents. Consecutive
/// lines never share a font.
pub fn markov_layout<R: Rng + ?Sized>(
    rng: &mut R,
    assembler: &PoemAssembler<'_>,
    input_words: &[String],
    orientation: Orientation,
) -> Result<PageLayout> {
    let (num_lines, min_words, max_words, max_length, start_y, min_x) = match orientation {
        Orientation::Landscape => (14, 7, 10, 66, 550, 60),
        Orientation::Portrait => (24, 4, 7, 40, 740, 15),
    };
    let poem = assembler.generate_markov_poem(
        rng,
        input_words,
        num_lines,
        min_words,
        max_words,
        Some(max_length),
    )?;
    let pages = PageGenerator::new(".")
        .with_orientation(orientation)
        .with_font_sizes(&LINE_FONT_SIZES);

    let mut layout = PageLayout::new(orientation);
    let mut y: u32 = start_y;
    let mut last_font: Option<&str> = None;
    for line in poem.lines() {
        let font = loop {
            let font = random_font(rng);
            if last_font != Some(font) {
                break font;
            }
        };
        last_font = Some(font);
        layout.strings.push(pages.place_line(rng, line, font, min_x, y));
        y = y.saturating_sub(32);
    }
    Ok(layout)
}

/// Twenty-five composed lines joined with arithmetic connectors, stacked
/// from the bottom of a portrait page.
pub fn futurist_layout<R: Rng + ?Sized>(
    rng: &mut R,
    assembler: &PoemAssembler<'_>,
    input_words: &[String],
) -> Result<PageLayout> {
    crate::validate::validate_words(input_words)?;
    let connectors = &assembler.config().palettes.futurist_connectors;
    let mut word_list = input_words.to_vec();
    word_list.extend(
        assembler
            .source()
            .phonetically_related_words(rng, input_words, None, Some(50), None)?,
    );
    let pages = PageGenerator::new(".")
        .with_orientation(Orientation::Portrait)
        .with_font_sizes(&LINE_FONT_SIZES);

    let mut layout = PageLayout::new(Orientation::Portrait);
    let mut y: u32 = 60;
    for _ in 0..25 {
        word_list.shuffle(rng);
        let line = compose_line(rng, &word_list, 40, connectors)?;
        let font = random_font(rng);
        layout.strings.push(pages.place_line(rng, &line, font, 15, y));
        y += 31;
    }
    Ok(layout)
}

/// Seed words and their neighbours scattered across the page in random
/// fonts, sizes and colours.
pub fn chaotic_concrete_layout<R: Rng + ?Sized>(
    rng: &mut R,
    assembler: &PoemAssembler<'_>,
    input_words: &[String],
    max_words: usize,
) -> Result<PageLayout> {
    crate::validate::validate_words(input_words)?;
    let mut words = input_words.to_vec();
    words.extend(
        assembler
            .source()
            .phonetically_related_words(rng, input_words, None, Some(50), None)?,
    );
    words.shuffle(rng);

    let mut layout = PageLayout::new(Orientation::Portrait);
    for word in words.iter().take(max_words) {
        layout.strings.push(VisualPoemString {
            text: maybe_upper(rng, word),
            x: rng.gen_range(15..=440),
            y: rng.gen_range(15..=800),
            font: random_font(rng).to_string(),
            font_size: DEFAULT_FONT_SIZES.choose(rng).copied().unwrap_or(16),
            rgb: Some(random_color(rng, 0.85)),
        });
    }
    Ok(layout)
}

/// Twenty runs of letters, digits or punctuation, one character per string.
pub fn character_soup_layout<R: Rng + ?Sized>(rng: &mut R) -> PageLayout {
    let lowercase: String = ('a'..='z').collect();
    let digits: String = ('0'..='9').collect();
    let sequences = [lowercase.as_str(), digits.as_str(), PUNCTUATION];

    let mut layout = PageLayout::new(Orientation::Portrait);
    for _ in 0..20 {
        let sequence = sequences.choose(rng).copied().unwrap_or(PUNCTUATION);
        let letters = sequence == lowercase;
        for c in sequence.chars() {
            let text = if letters && rng.gen_bool(0.5) {
                c.to_ascii_uppercase().to_string()
            } else {
                c.to_string()
            };
            layout.strings.push(VisualPoemString {
                text,
                x: rng.gen_range(10..=560),
                y: rng.gen_range(10..=790),
                font: random_font(rng).to_string(),
                font_size: rng.gen_range(6..=72),
                rgb: Some(random_color(rng, 0.85)),
            });
        }
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoetryConfig;
    use crate::filter::WordFilter;
    use crate::lexicon::StaticLexicon;
    use crate::relations::{RelatedWordSource, Relation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TEST_SEED: u64 = 42;

    fn seeds(s: &str) -> Vec<String> {
        s.split(' ').map(|w| w.to_string()).collect()
    }

    fn test_lexicon() -> StaticLexicon {
        StaticLexicon::new()
            .with_words("crypt", Relation::Rhyme, &["script", "tipped", "gripped"])
            .with_words("crypt", Relation::SimilarSound, &["crept", "crib"])
            .with_words("ghost", Relation::Rhyme, &["host", "most", "toast"])
            .with_words("ghost", Relation::SimilarMeaning, &["spirit", "phantom"])
            .with_words("time", Relation::Rhyme, &["rhyme", "chime", "slime"])
    }

    #[test]
    fn test_font_size_by_line_length() {
        let pages = PageGenerator::new(".");
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        assert_eq!(pages.get_font_size(&mut rng, &"x".repeat(31)), 16);
        for _ in 0..20 {
            assert!([16, 18, 20].contains(&pages.get_font_size(&mut rng, &"x".repeat(24))));
            assert!(DEFAULT_FONT_SIZES.contains(&pages.get_font_size(&mut rng, "short")));
        }
    }

    #[test]
    fn test_max_x_coordinate() {
        let landscape = PageGenerator::new(".");
        let portrait = PageGenerator::new(".").with_orientation(Orientation::Portrait);
        assert_eq!(landscape.get_max_x_coordinate("short", "Courier-Bold", 12), 60);
        assert_eq!(portrait.get_max_x_coordinate("short", "Courier-Bold", 12), 30);
        assert_eq!(landscape.get_max_x_coordinate(&"x".repeat(17), "Vera", 24), 60);
        assert_eq!(landscape.get_max_x_coordinate(&"x".repeat(21), "Vera", 12), 130);
        assert_eq!(portrait.get_max_x_coordinate(&"x".repeat(17), "Vera", 20), 100);
        assert_eq!(portrait.get_max_x_coordinate("short", "Vera", 12), 250);
        assert_eq!(landscape.get_max_x_coordinate("short", "Vera", 12), 280);
    }

    #[test]
    fn test_set_filename_avoids_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let pages = PageGenerator::new(dir.path());
        let first = pages.set_filename(&["crypt", "ghost"], "json");
        assert_eq!(first, dir.path().join("crypt,ghost.json"));
        std::fs::write(&first, "{}").unwrap();
        let second = pages.set_filename(&["crypt", "ghost"], "json");
        assert_eq!(second, dir.path().join("crypt,ghost(1).json"));
        std::fs::write(&second, "{}").unwrap();
        let third = pages.set_filename(&["crypt", "ghost"], "json");
        assert_eq!(third, dir.path().join("crypt,ghost(2).json"));
    }

    #[test]
    fn test_random_color_keeps_one_bright_channel_at_most() {
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        for threshold in [0.85, 0.5, 0.25] {
            for _ in 0..50 {
                let rgb = random_color(&mut rng, threshold);
                let floor = 1.0 - threshold;
                let bright = [rgb.r, rgb.g, rgb.b].iter().filter(|c| **c >= floor).count();
                assert!(bright <= 1, "{rgb:?}");
            }
        }
    }

    #[test]
    fn test_random_color_terminates_for_full_threshold() {
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        for threshold in [1.0, 5.0] {
            let rgb = random_color(&mut rng, threshold);
            let bright = [rgb.r, rgb.g, rgb.b]
                .iter()
                .filter(|c| 1.0 - **c <= MAX_COLOR_THRESHOLD)
                .count();
            assert!(bright <= 1, "{rgb:?}");
        }
    }

    #[test]
    fn test_orientation_from_str() {
        assert_eq!("Landscape".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert!("square".parse::<Orientation>().is_err());
        assert_eq!(Orientation::Landscape.page_size(), (792, 612));
    }

    #[test]
    fn test_markov_layout_rows() {
        let lexicon = test_lexicon();
        let filter = WordFilter::new(&Default::default());
        let config = PoetryConfig::default();
        let assembler = PoemAssembler::new(RelatedWordSource::new(&lexicon, &filter), &config);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let layout =
            markov_layout(&mut rng, &assembler, &seeds("crypt ghost time"), Orientation::Portrait).unwrap();
        assert_eq!(layout.strings.len(), 24);
        assert_eq!(layout.strings[0].y, 740);
        assert_eq!(layout.strings[1].y, 708);
        for pair in layout.strings.windows(2) {
            assert_ne!(pair[0].font, pair[1].font);
        }
        for s in &layout.strings {
            assert!(s.x >= 15);
        }
    }

    #[test]
    fn test_futurist_layout_uses_math_connectors() {
        let lexicon = test_lexicon();
        let filter = WordFilter::new(&Default::default());
        let config = PoetryConfig::default();
        let assembler = PoemAssembler::new(RelatedWordSource::new(&lexicon, &filter), &config);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let layout = futurist_layout(&mut rng, &assembler, &seeds("crypt ghost")).unwrap();
        assert_eq!(layout.strings.len(), 25);
        assert_eq!(layout.strings[0].y, 60);
        assert_eq!(layout.strings[24].y, 60 + 24 * 31);
        for s in &layout.strings {
            assert!(!s.text.contains("  or  "));
            assert!(s.text.chars().count() <= 40);
        }
    }

    #[test]
    fn test_chaotic_concrete_layout_bounds() {
        let lexicon = test_lexicon();
        let filter = WordFilter::new(&Default::default());
        let config = PoetryConfig::default();
        let assembler = PoemAssembler::new(RelatedWordSource::new(&lexicon, &filter), &config);
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let layout = chaotic_concrete_layout(&mut rng, &assembler, &seeds("crypt ghost"), 5).unwrap();
        assert_eq!(layout.strings.len(), 5);
        for s in &layout.strings {
            assert!((15..=440).contains(&s.x));
            assert!((15..=800).contains(&s.y));
            assert!(s.rgb.is_some());
        }
    }

    #[test]
    fn test_character_soup_and_json() {
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let layout = character_soup_layout(&mut rng);
        assert!(layout.strings.len() >= 20 * 10);
        assert!(layout.strings.iter().all(|s| s.text.chars().count() == 1));
        assert!(layout.strings.iter().all(|s| (6..=72).contains(&s.font_size)));
        let json = layout.to_json().unwrap();
        let parsed: PageLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.strings.len(), layout.strings.len());
        assert_eq!(parsed.strings[0].text, layout.strings[0].text);
        assert_eq!(parsed.orientation, Orientation::Portrait);
    }
}
