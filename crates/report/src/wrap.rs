use crate::metrics::{text_width, Font};

/// Greedy word wrap to `max_width` points.
///
/// Explicit newlines start new lines. A word wider than the column is split
/// between characters, so no text is ever dropped. Always returns at least
/// one line.
pub fn wrap_text(text: &str, max_width: f32, font: Font, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph.trim_end_matches('\r'), max_width, font, size, &mut lines);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_paragraph(paragraph: &str, max_width: f32, font: Font, size: f32, out: &mut Vec<String>) {
    let mut current = String::new();
    for word in paragraph.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if text_width(word, font, size) <= max_width {
            current = word.to_string();
        } else {
            let mut pieces = split_long_word(word, max_width, font, size);
            current = pieces.pop().unwrap_or_default();
            out.extend(pieces);
        }
    }
    out.push(current);
}

fn split_long_word(word: &str, max_width: f32, font: Font, size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if piece.chars().count() > 1 && text_width(&piece, font, size) > max_width {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(
            wrap_text("HPLC, SEC", 200.0, Font::Regular, 10.0),
            vec!["HPLC, SEC"]
        );
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        assert_eq!(wrap_text("", 50.0, Font::Regular, 10.0), vec![""]);
    }

    #[test]
    fn words_wrap_without_loss() {
        let text = "Bioassay, Cell-based Assay, Peptide Mapping, UPLC-MS";
        let lines = wrap_text(text, 60.0, Font::Regular, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Font::Regular, 10.0) <= 60.0, "{line:?}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn long_words_are_split_between_characters() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, 40.0, Font::Bold, 12.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(line, Font::Bold, 12.0) <= 40.0);
        }
    }

    #[test]
    fn newlines_are_kept() {
        assert_eq!(
            wrap_text("a\n\nb", 100.0, Font::Regular, 10.0),
            vec!["a", "", "b"]
        );
    }
}
