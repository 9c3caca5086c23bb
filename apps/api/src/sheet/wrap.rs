//! Greedy word wrap against the static font-metric tables.
//!
//! Explicit newlines start a new paragraph (blank paragraphs are kept as
//! empty lines). A word wider than the column is broken by character.

use crate::sheet::font_metrics::{FontMetricTable, FontWeight};

/// Wraps `text` into lines no wider than `max_width_pt` at `size_pt`.
///
/// Whitespace-only input yields no lines.
pub fn wrap_text(
    text: &str,
    metrics: &FontMetricTable,
    weight: FontWeight,
    size_pt: f32,
    max_width_pt: f32,
) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let space_w = metrics.space_pt(weight, size_pt);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_w = 0.0_f32;

        for word in words {
            let word_w = metrics.measure_pt(word, weight, size_pt);

            if word_w > max_width_pt {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut chunks = break_word(word, metrics, weight, size_pt, max_width_pt);
                // The tail of a broken word may share its line with what follows.
                let tail = chunks.pop().unwrap_or_default();
                lines.extend(chunks);
                current_w = metrics.measure_pt(&tail, weight, size_pt);
                current = tail;
                continue;
            }

            if !current.is_empty() && current_w + space_w + word_w > max_width_pt {
                lines.push(std::mem::take(&mut current));
                current_w = 0.0;
            }

            if current.is_empty() {
                current.push_str(word);
                current_w = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + word_w;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Splits a single over-wide word into chunks that each fit the column.
/// Every chunk holds at least one character, even if that character alone overflows.
fn break_word(
    word: &str,
    metrics: &FontMetricTable,
    weight: FontWeight,
    size_pt: f32,
    max_width_pt: f32,
) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut chunk_w = 0.0_f32;

    for c in word.chars() {
        let w = metrics.char_width(c, weight) * size_pt;
        if !chunk.is_empty() && chunk_w + w > max_width_pt {
            chunks.push(std::mem::take(&mut chunk));
            chunk_w = 0.0;
        }
        chunk.push(c);
        chunk_w += w;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::font_metrics::{get_metrics, FontFamily};

    fn helvetica() -> &'static FontMetricTable {
        get_metrics(&FontFamily::Helvetica)
    }

    #[test]
    fn test_empty_text_yields_no_lines() {
        assert!(wrap_text("   ", helvetica(), FontWeight::Regular, 10.0, 100.0).is_empty());
    }

    #[test]
    fn test_short_text_is_one_line() {
        let lines = wrap_text("Darkvision", helvetica(), FontWeight::Regular, 10.0, 200.0);
        assert_eq!(lines, vec!["Darkvision".to_string()]);
    }

    #[test]
    fn test_long_text_wraps_and_preserves_words() {
        let text = "You can see in dim light within 60 feet of you as if it were bright light";
        let lines = wrap_text(text, helvetica(), FontWeight::Regular, 10.0, 120.0);
        assert!(lines.len() >= 2, "expected wrapping, got {lines:?}");
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_every_line_fits_the_column() {
        let metrics = helvetica();
        let text = "word ".repeat(60);
        for line in wrap_text(&text, metrics, FontWeight::Regular, 9.0, 150.0) {
            assert!(metrics.measure_pt(&line, FontWeight::Regular, 9.0) <= 150.0 + 1e-3);
        }
    }

    #[test]
    fn test_newlines_start_paragraphs() {
        let lines = wrap_text("First\n\nThird", helvetica(), FontWeight::Regular, 10.0, 300.0);
        assert_eq!(lines, vec!["First".to_string(), String::new(), "Third".to_string()]);
    }

    #[test]
    fn test_over_wide_word_is_broken() {
        let word = "Supercalifragilisticexpialidocious";
        let lines = wrap_text(word, helvetica(), FontWeight::Regular, 10.0, 40.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_broken_word_tail_shares_line() {
        let lines = wrap_text("Aaaaaaaaaaaaaaaa b", helvetica(), FontWeight::Regular, 10.0, 60.0);
        assert_eq!(lines.last().map(|l| l.ends_with(" b")), Some(true));
    }
}
