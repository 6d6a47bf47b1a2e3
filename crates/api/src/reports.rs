//! Report intake: validate a submitted draft and persist the accepted record.
//!
//! Submissions go through the full schema pass before anything touches disk,
//! so the reports directory only ever holds complete records.

use std::fs;
use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use laudo_core::{
    validate, CoreConfig, ReportDraft, ReportRecord, TemplateRegistry, UnknownTemplateError,
    ValidationErrorSet,
};
use laudo_types::TemplateKey;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Report submission request body.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReportReq {
    /// Key of the study template the draft was authored under.
    pub template: String,
    /// Structured report draft; fields the author never touched may be absent.
    #[schema(value_type = Object)]
    pub record: ReportDraft,
}

/// Report submission response body.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReportRes {
    pub id: String,
}

/// Template listing response body.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListTemplatesRes {
    pub templates: Vec<String>,
}

/// One field-level problem in a rejected submission.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueRes {
    /// Path into the record, e.g. `patient.age` or `findings[0].site`.
    pub path: String,
    pub message: String,
}

/// Error response body shared by every endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<IssueRes>,
}

impl ErrorRes {
    /// Plain error with no field detail.
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            issues: vec![],
        }
    }

    /// Error carrying the full issue set of a rejected submission.
    pub fn rejection(errors: &ValidationErrorSet) -> Self {
        Self {
            error: "Report is incomplete".to_owned(),
            issues: errors
                .issues()
                .iter()
                .map(|issue| IssueRes {
                    path: issue.path.to_string(),
                    message: issue.message.clone(),
                })
                .collect(),
        }
    }
}

/// Why a submission was not stored.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    UnknownTemplate(#[from] UnknownTemplateError),
    #[error(transparent)]
    Invalid(#[from] ValidationErrorSet),
    #[error("Could not store report: {0}")]
    Storage(#[from] io::Error),
}

/// A stored report as written to the reports directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: String,
    pub template: String,
    #[serde(rename = "receivedAt")]
    pub received_at: DateTime<Utc>,
    #[serde(rename = "submittedBy")]
    pub submitted_by: String,
    pub record: ReportRecord,
}

/// Accepts report submissions for the templates a deployment offers.
#[derive(Clone)]
pub struct ReportIntake {
    cfg: Arc<CoreConfig>,
    registry: Arc<TemplateRegistry>,
}

impl ReportIntake {
    pub fn new(cfg: Arc<CoreConfig>, registry: Arc<TemplateRegistry>) -> Self {
        Self { cfg, registry }
    }

    /// Lists the template keys a client may author against.
    pub fn templates(&self) -> Vec<String> {
        self.registry
            .list_templates()
            .iter()
            .map(|key| key.as_str().to_owned())
            .collect()
    }

    /// Validates one submission and writes it to the reports directory.
    ///
    /// The stored file is named after the generated report id, one JSON
    /// document per report.
    pub fn submit(
        &self,
        template: &str,
        draft: ReportDraft,
        submitted_by: &str,
    ) -> Result<StoredReport, IntakeError> {
        let key = TemplateKey::new(template);
        let template = self.registry.get(&key)?;
        let record = validate(draft, template)?;

        let stored = StoredReport {
            id: Uuid::new_v4().to_string(),
            template: key.as_str().to_owned(),
            received_at: Utc::now(),
            submitted_by: submitted_by.to_owned(),
            record,
        };

        let dir = self.cfg.reports_dir();
        fs::create_dir_all(&dir)?;
        let body = serde_json::to_string_pretty(&stored).map_err(io::Error::from)?;
        fs::write(dir.join(format!("{}.json", stored.id)), body)?;
        tracing::debug!("Stored report {} for template {}", stored.id, stored.template);

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laudo_core::record::PatientDraft;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn intake(dir: &TempDir) -> ReportIntake {
        let cfg = CoreConfig::new(
            dir.path().to_path_buf(),
            dir.path().join("drafts"),
        )
        .expect("tempdir paths are valid");
        ReportIntake::new(Arc::new(cfg), Arc::new(TemplateRegistry::builtin()))
    }

    fn complete_chest_draft() -> ReportDraft {
        ReportDraft {
            patient: Some(PatientDraft {
                age: Some("65".to_owned()),
                sex: Some("M".to_owned()),
                id: Some("PAC-1".to_owned()),
            }),
            indication: Some("Chronic cough".to_owned()),
            ..ReportDraft::default()
        }
    }

    #[test]
    fn valid_submission_is_stored_as_json() {
        let dir = TempDir::new().expect("create temp dir");
        let intake = intake(&dir);

        let stored = intake
            .submit("Chest CT", complete_chest_draft(), "dr.santos")
            .expect("complete draft is accepted");

        let path = dir.path().join("reports").join(format!("{}.json", stored.id));
        let body = std::fs::read_to_string(&path).expect("report file exists");
        let read: StoredReport = serde_json::from_str(&body).expect("stored report parses");
        assert_eq!(read.id, stored.id);
        assert_eq!(read.template, "Chest CT");
        assert_eq!(read.submitted_by, "dr.santos");
        assert_eq!(read.record.study_area, "Chest CT");
        assert_eq!(read.record.patient.age, "65");
    }

    #[test]
    fn stored_file_uses_wire_field_names() {
        let dir = TempDir::new().expect("create temp dir");
        let intake = intake(&dir);

        let stored = intake
            .submit("Chest CT", complete_chest_draft(), "dr.santos")
            .expect("complete draft is accepted");

        let path = dir.path().join("reports").join(format!("{}.json", stored.id));
        let body = std::fs::read_to_string(&path).expect("report file exists");
        assert!(body.contains("\"receivedAt\""));
        assert!(body.contains("\"submittedBy\""));
        assert!(body.contains("\"studyArea\""));
    }

    #[test]
    fn unknown_template_is_rejected_before_any_write() {
        let dir = TempDir::new().expect("create temp dir");
        let intake = intake(&dir);

        let err = intake
            .submit("Knee MRI", complete_chest_draft(), "dr.santos")
            .expect_err("template is not registered");
        assert!(matches!(err, IntakeError::UnknownTemplate(_)));
        assert!(!PathBuf::from(dir.path()).join("reports").exists());
    }

    #[test]
    fn incomplete_draft_is_rejected_with_field_paths() {
        let dir = TempDir::new().expect("create temp dir");
        let intake = intake(&dir);

        let err = intake
            .submit("Chest CT", ReportDraft::default(), "dr.santos")
            .expect_err("pristine draft is incomplete");
        let IntakeError::Invalid(errors) = err else {
            panic!("expected a validation rejection");
        };
        let paths: Vec<String> = errors
            .issues()
            .iter()
            .map(|issue| issue.path.to_string())
            .collect();
        assert_eq!(paths, vec!["patient.age", "patient.sex", "indication"]);
        assert!(!PathBuf::from(dir.path()).join("reports").exists());
    }

    #[test]
    fn rejection_body_carries_every_issue() {
        let errors = laudo_core::validate(
            ReportDraft::default(),
            TemplateRegistry::builtin()
                .get(&TemplateKey::new("Chest CT"))
                .expect("builtin template"),
        )
        .expect_err("pristine draft is incomplete");

        let body = ErrorRes::rejection(&errors);
        assert_eq!(body.error, "Report is incomplete");
        assert_eq!(body.issues.len(), 3);
        assert_eq!(body.issues[0].path, "patient.age");
        assert_eq!(body.issues[0].message, "Age is required");
    }

    #[test]
    fn plain_error_body_serializes_without_issue_list() {
        let body = serde_json::to_string(&ErrorRes::message("Unknown study template: Knee MRI"))
            .expect("serializes");
        assert_eq!(body, "{\"error\":\"Unknown study template: Knee MRI\"}");
    }

    #[test]
    fn templates_lists_builtin_keys_in_order() {
        let dir = TempDir::new().expect("create temp dir");
        assert_eq!(
            intake(&dir).templates(),
            vec!["Chest CT", "Abdomen CT", "Head CT"]
        );
    }
}
