//! PDF export for structured reports.
//!
//! Export runs two strategies behind one adapter. The primary renderer lays
//! the record out field by field; when it fails, the adapter falls back to a
//! renderer that prints the narrative text flow. The caller sees a single
//! export call that either returns PDF bytes or one error carrying both
//! failures. The two renditions hold the same content; pagination and layout
//! may differ.

mod layout;
mod preview;
mod structured;

pub use preview::PreviewRenderer;
pub use structured::StructuredRenderer;

use laudo_core::ReportRecord;

/// Failure of a single rendering strategy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{strategy} renderer: {message}")]
pub struct RenderError {
    pub strategy: &'static str,
    pub message: String,
}

impl RenderError {
    pub fn new(strategy: &'static str, message: impl Into<String>) -> Self {
        Self {
            strategy,
            message: message.into(),
        }
    }
}

/// One way of turning a record into PDF bytes.
pub trait PdfRenderer: Send + Sync {
    /// Strategy name used in logs and error reports.
    fn name(&self) -> &'static str;
    fn render(&self, record: &ReportRecord) -> Result<Vec<u8>, RenderError>;
}

/// Raised only when every strategy failed.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export failed; {primary}; {fallback}")]
    AllRenderersFailed {
        primary: RenderError,
        fallback: RenderError,
    },
}

/// Two-strategy PDF export.
pub struct ExportAdapter {
    primary: Box<dyn PdfRenderer>,
    fallback: Box<dyn PdfRenderer>,
}

impl ExportAdapter {
    pub fn new(primary: Box<dyn PdfRenderer>, fallback: Box<dyn PdfRenderer>) -> Self {
        Self { primary, fallback }
    }

    /// Renders `record`, trying the primary strategy first.
    ///
    /// A primary failure is logged and the fallback runs; the caller only
    /// learns about it through the log unless the fallback fails too.
    pub fn export(&self, record: &ReportRecord) -> Result<Vec<u8>, ExportError> {
        let primary_err = match self.primary.render(record) {
            Ok(bytes) => return Ok(bytes),
            Err(err) => err,
        };
        tracing::warn!(
            "{} renderer failed, falling back to {}: {primary_err}",
            self.primary.name(),
            self.fallback.name(),
        );
        match self.fallback.render(record) {
            Ok(bytes) => Ok(bytes),
            Err(fallback_err) => Err(ExportError::AllRenderersFailed {
                primary: primary_err,
                fallback: fallback_err,
            }),
        }
    }
}

impl Default for ExportAdapter {
    fn default() -> Self {
        Self::new(Box::new(StructuredRenderer), Box::new(PreviewRenderer))
    }
}

/// Suggested download name for an exported record.
///
/// The patient identifier is embedded when present, with characters that are
/// awkward in filenames replaced by dashes. Records without an identifier get
/// the fixed `report-no-id.pdf` name.
pub fn export_filename(record: &ReportRecord) -> String {
    let id = record.patient.id.trim();
    if id.is_empty() {
        return "report-no-id.pdf".to_owned();
    }
    let safe: String = id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    format!("report-{safe}.pdf")
}
