//! Shared page plumbing for the builtin-font renderers.

use printpdf::{Mm, PdfDocumentReference, PdfLayerReference};

/// Left margin for section headers.
pub(crate) const MARGIN_X: Mm = Mm(20.0);
/// Left margin for body text.
pub(crate) const BODY_X: Mm = Mm(25.0);

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP_Y: Mm = Mm(280.0);
const BOTTOM_Y: Mm = Mm(18.0);

/// Top-down text cursor that starts a new page when the current one is full.
pub(crate) struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
}

impl<'a> PageCursor<'a> {
    pub(crate) fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y: TOP_Y,
        }
    }

    /// Reserves one line of text and returns its baseline and layer.
    pub(crate) fn line(&mut self, leading: Mm) -> (Mm, &PdfLayerReference) {
        if self.y.0 < BOTTOM_Y.0 {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP_Y;
        }
        let baseline = self.y;
        self.y -= leading;
        (baseline, &self.layer)
    }

    /// Inserts vertical whitespace.
    pub(crate) fn gap(&mut self, amount: Mm) {
        self.y -= amount;
    }
}

/// Greedy word wrap by character count.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars + word_chars + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Substitutes glyphs the builtin fonts cannot encode.
///
/// The arrow in comparison lines has no WinAnsi code point; the em dash does.
pub(crate) fn encodable(text: &str) -> String {
    text.replace('→', "->")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_lines_respect_the_limit() {
        let text = "Finding 1: Nodule in Right upper lobe; margins regular; density solid; \
                    size 12 x 8 mm; additional: calcified, subpleural.";
        let lines = wrap_text(text, 40);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.chars().count() <= 40, "line too long: {line}");
        }
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(wrap_text("Indication: —", 80), vec!["Indication: —".to_owned()]);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        assert_eq!(wrap_text("", 80), vec![String::new()]);
    }

    #[test]
    fn arrow_is_substituted_for_the_builtin_fonts() {
        assert_eq!(encodable("2023-11-02 → stable"), "2023-11-02 -> stable");
        assert_eq!(encodable("size — mm"), "size — mm");
    }
}
