//! # Text Wrapping
//!
//! Greedy word wrap against measured widths. Explicit newlines start a new
//! paragraph and blank lines are kept, which is how the signature blocks get
//! their spacing.

use crate::error::Result;
use crate::font::{FontSpec, TextMeasure};

/// Break `text` into lines no wider than `max_width`.
///
/// Whole words are appended while the line still fits. A word wider than
/// `max_width` on its own gets a line to itself and overflows; text is never
/// truncated or split mid-word. Always returns at least one line.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    font: &FontSpec,
    max_width: f64,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut line = String::new();

        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
            } else {
                let candidate = format!("{} {}", line, word);
                if measure.measure(&candidate, font)? <= max_width {
                    line = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            }

            // Hard break after a word that cannot fit on any line.
            if measure.measure(&line, font)? > max_width {
                lines.push(std::mem::take(&mut line));
            }
        }

        if !line.is_empty() {
            lines.push(line);
        } else if paragraph.trim().is_empty() {
            lines.push(String::new());
        }
    }

    Ok(lines)
}
