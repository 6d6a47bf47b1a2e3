//! Narrative text-flow rendition, the fallback strategy.
//!
//! Prints exactly what the on-screen preview shows, so a report exported
//! through the fallback reads the same as the editor did, just without the
//! structured layout.

use std::io::BufWriter;

use printpdf::{BuiltinFont, Mm, PdfDocument};

use laudo_core::narrative::narrative_lines;
use laudo_core::ReportRecord;

use crate::layout::{encodable, wrap_text, PageCursor, MARGIN_X};
use crate::{PdfRenderer, RenderError};

const NAME: &str = "preview";
const BODY_WIDTH: usize = 95;

pub struct PreviewRenderer;

impl PdfRenderer for PreviewRenderer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn render(&self, record: &ReportRecord) -> Result<Vec<u8>, RenderError> {
        let title = if record.study_area.trim().is_empty() {
            "Report".to_owned()
        } else {
            format!("{} Report", record.study_area)
        };
        let (doc, page1, layer1) = PdfDocument::new(&title, Mm(210.0), Mm(297.0), "Layer 1");
        let first_layer = doc.get_page(page1).get_layer(layer1);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::new(NAME, format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::new(NAME, format!("font error: {e}")))?;

        let mut cursor = PageCursor::new(&doc, first_layer);

        let (y, layer) = cursor.line(Mm(10.0));
        layer.use_text(&title, 14.0, MARGIN_X, y, &bold);

        for paragraph in narrative_lines(record) {
            for line in wrap_text(&encodable(&paragraph), BODY_WIDTH) {
                let (y, layer) = cursor.line(Mm(5.0));
                layer.use_text(&line, 10.0, MARGIN_X, y, &font);
            }
            cursor.gap(Mm(1.5));
        }

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| RenderError::new(NAME, format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| RenderError::new(NAME, format!("buffer error: {e}")))
    }
}
