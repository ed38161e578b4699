//! Output backends for finished poems.
//!
//! The composition code only hands over ordered lines. Plain text goes
//! straight to a writer; page layouts (see [`layout`]) place each line or
//! word at a position, font, and colour and serialize the result as JSON for
//! a drawing backend.

use std::io::Write;

use crate::error::Result;

pub mod layout;

pub trait PoemRenderer {
    fn render(&self, lines: &[String], out: &mut dyn Write) -> Result<()>;
}

/// Prints the poem with a blank line before and after it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl PoemRenderer for PlainTextRenderer {
    fn render(&self, lines: &[String], out: &mut dyn Write) -> Result<()> {
        writeln!(out)?;
        for line in lines {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

/// Split poem text (such as a visual poem) into the lines a renderer takes.
pub fn text_lines(text: &str) -> Vec<String> {
    text.lines().map(|l| l.to_string()).collect()
}
