//! # Laudo Core
//!
//! Core logic for structured radiology reports.
//!
//! This crate contains the pure editing pipeline, independent of any surface:
//! - Report data model with template-driven defaults
//! - Schema pass producing a complete record or a full issue set
//! - Draft persistence that never takes the editor down
//! - Narrative derivation for preview and print
//! - Editing sessions binding paths, validation, drafts and narrative
//!
//! **No surface concerns**: HTTP handlers, authentication and PDF layout
//! belong in `laudo-api` and `laudo-export`.

pub mod cases;
pub mod config;
pub mod dictation;
pub mod draft;
pub mod narrative;
pub mod paths;
pub mod record;
pub mod session;
pub mod template;
pub mod validate;

pub use cases::{CaseLibrary, CasePreset};
pub use config::{ConfigError, CoreConfig};
pub use draft::{DraftMedium, DraftStore, FileMedium, MemoryMedium};
pub use paths::{FieldPath, FieldPathError};
pub use record::{
    Comparison, Finding, PatientInfo, ReportDraft, ReportRecord, SizeMm, DEFAULT_CHANGE,
};
pub use session::{BackendError, EditorSession, ReportBackend, SubmitError};
pub use template::{FindingDefaults, StudyTemplate, TemplateRegistry, UnknownTemplateError};
pub use validate::{
    apply_defaults, check_complete, validate, ValidationErrorSet, ValidationIssue,
};
