//! Field-by-field PDF layout, the primary export strategy.

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

use laudo_core::narrative::{join_present, or_fallback, size_token};
use laudo_core::ReportRecord;

use crate::layout::{encodable, wrap_text, PageCursor, BODY_X, MARGIN_X};
use crate::{PdfRenderer, RenderError};

const NAME: &str = "structured";
const BODY_WIDTH: usize = 90;

/// Lays the record out as labelled sections, one per report field group.
pub struct StructuredRenderer;

impl PdfRenderer for StructuredRenderer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn render(&self, record: &ReportRecord) -> Result<Vec<u8>, RenderError> {
        let title = document_title(record);
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

        let (y, layer) = cursor.line(Mm(4.5));
        layer.use_text(
            format!("Patient ID: {}", or_fallback(&record.patient.id)),
            9.0,
            MARGIN_X,
            y,
            &font,
        );
        let (y, layer) = cursor.line(Mm(4.5));
        layer.use_text(
            format!(
                "Age: {}   Sex: {}",
                or_fallback(&record.patient.age),
                or_fallback(&record.patient.sex)
            ),
            9.0,
            MARGIN_X,
            y,
            &font,
        );
        cursor.gap(Mm(4.0));

        header(&mut cursor, &bold, "INDICATION:");
        body(&mut cursor, &font, or_fallback(&record.indication));
        cursor.gap(Mm(4.0));

        header(&mut cursor, &bold, "TECHNIQUE:");
        let technique = join_present(&record.technique, ", ");
        body(&mut cursor, &font, or_fallback(&technique));
        cursor.gap(Mm(4.0));

        if !record.findings.is_empty() {
            header(&mut cursor, &bold, "FINDINGS:");
            for (index, finding) in record.findings.iter().enumerate() {
                body(
                    &mut cursor,
                    &font,
                    &format!(
                        "{}. {} in {}",
                        index + 1,
                        or_fallback(&finding.kind),
                        or_fallback(&finding.site)
                    ),
                );
                body(
                    &mut cursor,
                    &font,
                    &format!(
                        "   margins {} · density {} · size {} mm",
                        or_fallback(&finding.margins),
                        or_fallback(&finding.density),
                        size_token(&finding.size_mm)
                    ),
                );
                let additional = join_present(&finding.additional, ", ");
                if !additional.is_empty() {
                    body(&mut cursor, &font, &format!("   additional: {additional}"));
                }
                cursor.gap(Mm(2.0));
            }
            cursor.gap(Mm(2.0));
        }

        let ancillary = join_present(&record.ancillary, ", ");
        if !ancillary.is_empty() {
            header(&mut cursor, &bold, "ANCILLARY FINDINGS:");
            body(&mut cursor, &font, &ancillary);
            cursor.gap(Mm(4.0));
        }

        if !record.comparison.prior_date.trim().is_empty() {
            header(&mut cursor, &bold, "COMPARISON:");
            body(
                &mut cursor,
                &font,
                &format!(
                    "{} -> {}",
                    record.comparison.prior_date,
                    or_fallback(&record.comparison.change)
                ),
            );
            cursor.gap(Mm(4.0));
        }

        bullet_section(&mut cursor, &bold, &font, "IMPRESSION:", &record.impression);
        bullet_section(
            &mut cursor,
            &bold,
            &font,
            "RECOMMENDATIONS:",
            &record.recommendations,
        );

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| RenderError::new(NAME, format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| RenderError::new(NAME, format!("buffer error: {e}")))
    }
}

fn document_title(record: &ReportRecord) -> String {
    if record.study_area.trim().is_empty() {
        "Report".to_owned()
    } else {
        format!("{} Report", record.study_area)
    }
}

fn header(cursor: &mut PageCursor<'_>, bold: &IndirectFontRef, text: &str) {
    let (y, layer) = cursor.line(Mm(6.0));
    layer.use_text(text, 11.0, MARGIN_X, y, bold);
}

fn body(cursor: &mut PageCursor<'_>, font: &IndirectFontRef, text: &str) {
    for line in wrap_text(&encodable(text), BODY_WIDTH) {
        let (y, layer) = cursor.line(Mm(4.5));
        layer.use_text(&line, 9.0, BODY_X, y, font);
    }
}

fn bullet_section(
    cursor: &mut PageCursor<'_>,
    bold: &IndirectFontRef,
    font: &IndirectFontRef,
    title: &str,
    entries: &[String],
) {
    let present: Vec<&str> = entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .collect();
    if present.is_empty() {
        return;
    }
    header(cursor, bold, title);
    for entry in present {
        body(cursor, font, &format!("· {entry}"));
    }
    cursor.gap(Mm(4.0));
}
