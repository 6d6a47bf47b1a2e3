//! Editing session over one report.
//!
//! An [`EditorSession`] is the single writer for its record. It applies field
//! edits through typed paths, re-runs validation after every change, keeps
//! the draft slot current, and derives the narrative preview on demand. Hosts
//! own the widgets and the event loop; the session owns the state.
//!
//! Persistence of a finished report goes through [`ReportBackend`], injected
//! at the submit call so the session never knows transport details.

use std::sync::Arc;
use std::time::{Duration, Instant};

use laudo_types::{DraftKey, ReportId, TemplateKey};

use crate::cases::CasePreset;
use crate::draft::DraftStore;
use crate::narrative;
use crate::paths::{FieldPath, FieldPathError};
use crate::record::{ReportDraft, ReportRecord};
use crate::template::{StudyTemplate, TemplateRegistry, UnknownTemplateError};
use crate::validate::{apply_defaults, check_complete, ValidationErrorSet};

/// Failures while handing a finished report to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No authenticated identity was attached to the request
    #[error("Request carries no authenticated identity")]
    Unauthenticated,
    /// The backend refused the report
    #[error("Report rejected by the backend: {0}")]
    Rejected(String),
    /// The backend could not be reached or failed internally
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for finished reports.
///
/// Implementations receive a validated record and the identity of the
/// submitting author, and answer with the stored report's identifier.
pub trait ReportBackend {
    fn create_report(&self, record: &ReportRecord, user_id: &str)
        -> Result<ReportId, BackendError>;
}

/// Why a submit attempt did not produce a stored report.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The record is incomplete; the set lists every open issue
    #[error("Report failed validation: {0}")]
    Rejected(ValidationErrorSet),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Form state for one report under edit.
pub struct EditorSession {
    registry: Arc<TemplateRegistry>,
    drafts: DraftStore,
    template: StudyTemplate,
    record: ReportRecord,
    issues: Option<ValidationErrorSet>,
    autosave_interval: Duration,
    last_saved_at: Option<Instant>,
    dirty: bool,
}

impl EditorSession {
    /// Opens a session on the given template.
    ///
    /// The record starts from the template default, overlaid with the
    /// template's persisted draft when one exists and parses. A present
    /// draft wins wholesale; there is no field-level merging.
    pub fn open(
        registry: Arc<TemplateRegistry>,
        drafts: DraftStore,
        key: &TemplateKey,
    ) -> Result<Self, UnknownTemplateError> {
        let template = registry.get(key)?.clone();
        let (record, issues) = loaded_state(&drafts, &template);
        Ok(Self {
            registry,
            drafts,
            template,
            record,
            issues,
            autosave_interval: Duration::ZERO,
            last_saved_at: None,
            dirty: false,
        })
    }

    /// Sets the minimum interval between automatic draft writes.
    ///
    /// The default is zero: every change is persisted immediately. With a
    /// longer interval, changes inside the window stay in memory until the
    /// next change outside it or an explicit [`flush_draft`].
    ///
    /// [`flush_draft`]: Self::flush_draft
    pub fn set_autosave_interval(&mut self, interval: Duration) {
        self.autosave_interval = interval;
    }

    pub fn template_key(&self) -> &TemplateKey {
        self.template.key()
    }

    /// The record as currently edited. Always structurally complete.
    pub fn record(&self) -> &ReportRecord {
        &self.record
    }

    /// Validation outcome of the last change, `None` when the record is
    /// complete.
    pub fn issues(&self) -> Option<&ValidationErrorSet> {
        self.issues.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_none()
    }

    /// Narrative preview of the current record.
    pub fn narrative(&self) -> String {
        narrative::render(&self.record)
    }

    /// Writes one field, then revalidates and schedules a draft write.
    pub fn set(&mut self, path: FieldPath, value: &str) -> Result<(), FieldPathError> {
        path.apply(&mut self.record, value)?;
        self.after_change();
        Ok(())
    }

    /// Appends a finding entry seeded from the template defaults.
    pub fn push_finding(&mut self) {
        self.record
            .findings
            .push(self.template.finding_defaults().seed());
        self.after_change();
    }

    /// Removes the finding at `index`.
    pub fn remove_finding(&mut self, index: usize) -> Result<(), FieldPathError> {
        let len = self.record.findings.len();
        if index >= len {
            return Err(FieldPathError::OutOfRange {
                collection: "findings",
                index,
                len,
            });
        }
        self.record.findings.remove(index);
        self.after_change();
        Ok(())
    }

    /// Replaces the record with a preset case, completed against the current
    /// template.
    pub fn apply_case(&mut self, case: &CasePreset) {
        self.record = apply_defaults(case.draft().clone(), &self.template);
        self.record.study_area = self.template.key().as_str().to_owned();
        self.after_change();
    }

    /// Switches to another template.
    ///
    /// Pending edits are flushed to the old template's draft slot first, then
    /// the new template loads from its own default and draft. Values never
    /// carry over between templates.
    pub fn switch_template(&mut self, key: &TemplateKey) -> Result<(), UnknownTemplateError> {
        let template = self.registry.get(key)?.clone();
        self.flush_draft();
        self.template = template;
        self.load_record();
        Ok(())
    }

    /// Discards the draft and returns the template to its pristine default.
    pub fn reset(&mut self) {
        self.drafts.clear(&self.draft_key());
        self.record = self.template.default_record();
        self.issues = check_complete(&self.record, &self.template).err();
        self.last_saved_at = None;
        self.dirty = false;
    }

    /// Writes any pending draft state immediately.
    pub fn flush_draft(&mut self) {
        if self.dirty {
            self.write_draft();
        }
    }

    /// Hands the record to the backend on behalf of `user_id`.
    ///
    /// An incomplete record is rejected locally without touching the
    /// backend. A backend failure leaves the record and its draft untouched,
    /// so nothing is lost and the author can retry.
    pub fn submit(
        &mut self,
        backend: &dyn ReportBackend,
        user_id: &str,
    ) -> Result<ReportId, SubmitError> {
        self.flush_draft();
        if let Some(issues) = &self.issues {
            return Err(SubmitError::Rejected(issues.clone()));
        }
        let id = backend.create_report(&self.record, user_id)?;
        Ok(id)
    }

    fn draft_key(&self) -> DraftKey {
        DraftKey::for_template(self.template.key())
    }

    fn load_record(&mut self) {
        let (record, issues) = loaded_state(&self.drafts, &self.template);
        self.record = record;
        self.issues = issues;
        self.last_saved_at = None;
        self.dirty = false;
    }

    fn after_change(&mut self) {
        self.issues = check_complete(&self.record, &self.template).err();
        self.dirty = true;
        let due = match self.last_saved_at {
            Some(at) => at.elapsed() >= self.autosave_interval,
            None => true,
        };
        if due {
            self.write_draft();
        }
    }

    fn write_draft(&mut self) {
        self.drafts.save(&self.draft_key(), &self.record);
        self.last_saved_at = Some(Instant::now());
        self.dirty = false;
    }
}

fn loaded_state(
    drafts: &DraftStore,
    template: &StudyTemplate,
) -> (ReportRecord, Option<ValidationErrorSet>) {
    let fallback = ReportDraft::from(template.default_record());
    let draft = drafts.load(&DraftKey::for_template(template.key()), fallback);
    let mut record = apply_defaults(draft, template);
    // Draft slots are per template; the key always wins over stored text.
    record.study_area = template.key().as_str().to_owned();
    let issues = check_complete(&record, template).err();
    (record, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PatientDraft;
    use std::sync::Mutex;

    fn registry() -> Arc<TemplateRegistry> {
        Arc::new(TemplateRegistry::builtin())
    }

    fn chest_key() -> TemplateKey {
        TemplateKey::new("Chest CT")
    }

    fn open_chest(drafts: &DraftStore) -> EditorSession {
        EditorSession::open(registry(), drafts.clone(), &chest_key()).expect("built in")
    }

    fn fill_mandatory(session: &mut EditorSession) {
        session.set(FieldPath::PatientAge, "58").expect("path ok");
        session.set(FieldPath::PatientSex, "F").expect("path ok");
        session
            .set(FieldPath::Indication, "Nodule follow-up")
            .expect("path ok");
    }

    struct CapturingBackend {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl CapturingBackend {
        fn new() -> Self {
            Self {
                calls: Mutex::new(vec![]),
            }
        }
    }

    impl ReportBackend for CapturingBackend {
        fn create_report(
            &self,
            record: &ReportRecord,
            user_id: &str,
        ) -> Result<ReportId, BackendError> {
            self.calls
                .lock()
                .expect("lock")
                .push((record.study_area.clone(), user_id.to_owned()));
            ReportId::new("rep-1").map_err(|e| BackendError::Rejected(e.to_string()))
        }
    }

    struct UnavailableBackend;

    impl ReportBackend for UnavailableBackend {
        fn create_report(&self, _: &ReportRecord, _: &str) -> Result<ReportId, BackendError> {
            Err(BackendError::Unavailable("connection refused".to_owned()))
        }
    }

    #[test]
    fn open_rejects_unknown_template() {
        let err = EditorSession::open(registry(), DraftStore::in_memory(), &TemplateKey::new("Knee MRI"))
            .err()
            .expect("not registered");
        assert_eq!(err, UnknownTemplateError("Knee MRI".to_owned()));
    }

    #[test]
    fn pristine_session_starts_from_template_default() {
        let session = open_chest(&DraftStore::in_memory());
        assert_eq!(session.record().study_area, "Chest CT");
        assert!(!session.is_valid());
        assert_eq!(session.narrative(), "Indication: —\nTechnique: —");
    }

    #[test]
    fn issues_clear_as_fields_are_filled() {
        let drafts = DraftStore::in_memory();
        let mut session = open_chest(&drafts);
        session.set(FieldPath::PatientSex, "M").expect("path ok");
        session
            .set(FieldPath::Indication, "Chronic cough")
            .expect("path ok");

        let issues = session.issues().expect("age still missing");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.issues()[0].path, FieldPath::PatientAge);

        session.set(FieldPath::PatientAge, "45").expect("path ok");
        assert!(session.is_valid());
    }

    #[test]
    fn every_change_lands_in_the_draft_slot() {
        let drafts = DraftStore::in_memory();
        let mut session = open_chest(&drafts);
        session
            .set(FieldPath::Indication, "Screening")
            .expect("path ok");

        let stored: ReportDraft = drafts.load(
            &DraftKey::for_template(&chest_key()),
            ReportDraft::default(),
        );
        assert_eq!(stored.indication.as_deref(), Some("Screening"));
    }

    #[test]
    fn draft_survives_reopening_from_files() {
        let dir = tempfile::TempDir::new().expect("temp dir");

        let mut session = open_chest(&DraftStore::in_dir(dir.path()));
        session
            .set(FieldPath::Indication, "Persistent cough")
            .expect("path ok");
        drop(session);

        let reopened = open_chest(&DraftStore::in_dir(dir.path()));
        assert_eq!(reopened.record().indication, "Persistent cough");
    }

    #[test]
    fn switching_templates_never_merges_values() {
        let drafts = DraftStore::in_memory();
        let mut session = open_chest(&drafts);
        session
            .set(FieldPath::Indication, "Chest indication")
            .expect("path ok");

        session
            .switch_template(&TemplateKey::new("Abdomen CT"))
            .expect("built in");
        let abdomen_default = registry()
            .get_default(&TemplateKey::new("Abdomen CT"))
            .expect("built in");
        assert_eq!(session.record(), &abdomen_default);

        // The chest draft is still in its own slot and comes back intact.
        session.switch_template(&chest_key()).expect("built in");
        assert_eq!(session.record().indication, "Chest indication");
    }

    #[test]
    fn reset_discards_draft_and_restores_default() {
        let drafts = DraftStore::in_memory();
        let mut session = open_chest(&drafts);
        session
            .set(FieldPath::Indication, "Will be discarded")
            .expect("path ok");

        session.reset();
        assert_eq!(session.record().indication, "");
        assert!(!drafts.contains(&DraftKey::for_template(&chest_key())));
    }

    #[test]
    fn autosave_interval_coalesces_writes() {
        let drafts = DraftStore::in_memory();
        let mut session = open_chest(&drafts);
        session.set_autosave_interval(Duration::from_secs(3600));

        session.set(FieldPath::Indication, "first").expect("path ok");
        session.set(FieldPath::Indication, "second").expect("path ok");

        let key = DraftKey::for_template(&chest_key());
        let stored: ReportDraft = drafts.load(&key, ReportDraft::default());
        assert_eq!(stored.indication.as_deref(), Some("first"));

        session.flush_draft();
        let stored: ReportDraft = drafts.load(&key, ReportDraft::default());
        assert_eq!(stored.indication.as_deref(), Some("second"));
    }

    #[test]
    fn findings_are_seeded_and_removed_in_order() {
        let mut session = open_chest(&DraftStore::in_memory());
        session.push_finding();
        session.push_finding();
        assert_eq!(session.record().findings.len(), 2);
        assert_eq!(session.record().findings[0].kind, "Nodule");

        session
            .set(FieldPath::FindingSite(1), "Left lower lobe")
            .expect("in range");
        session.remove_finding(0).expect("in range");
        assert_eq!(session.record().findings[0].site, "Left lower lobe");

        let err = session.remove_finding(5).expect_err("past end");
        assert!(matches!(err, FieldPathError::OutOfRange { .. }));
    }

    #[test]
    fn seeded_finding_without_site_blocks_validation() {
        let mut session = open_chest(&DraftStore::in_memory());
        fill_mandatory(&mut session);
        assert!(session.is_valid());

        session.push_finding();
        let issues = session.issues().expect("site missing");
        assert_eq!(issues.issues()[0].path, FieldPath::FindingSite(0));
    }

    #[test]
    fn submit_rejects_incomplete_record_locally() {
        let mut session = open_chest(&DraftStore::in_memory());
        let backend = CapturingBackend::new();
        let err = session.submit(&backend, "dr.santos").expect_err("incomplete");
        assert!(matches!(err, SubmitError::Rejected(_)));
        assert!(backend.calls.lock().expect("lock").is_empty());
    }

    #[test]
    fn submit_forwards_validated_record_with_author() {
        let mut session = open_chest(&DraftStore::in_memory());
        fill_mandatory(&mut session);

        let backend = CapturingBackend::new();
        let id = session.submit(&backend, "dr.santos").expect("valid record");
        assert_eq!(id.as_str(), "rep-1");
        assert_eq!(
            backend.calls.lock().expect("lock").as_slice(),
            &[("Chest CT".to_owned(), "dr.santos".to_owned())]
        );
    }

    #[test]
    fn backend_failure_keeps_record_and_draft() {
        let drafts = DraftStore::in_memory();
        let mut session = open_chest(&drafts);
        fill_mandatory(&mut session);

        let err = session
            .submit(&UnavailableBackend, "dr.santos")
            .expect_err("backend down");
        assert!(matches!(err, SubmitError::Backend(BackendError::Unavailable(_))));
        assert_eq!(session.record().patient.age, "58");
        assert!(drafts.contains(&DraftKey::for_template(&chest_key())));
    }

    #[test]
    fn applied_case_is_completed_against_the_template() {
        let mut session = open_chest(&DraftStore::in_memory());
        let case = CasePreset::new(
            "Solitary nodule",
            ReportDraft {
                patient: Some(PatientDraft {
                    age: Some("70".to_owned()),
                    sex: Some("M".to_owned()),
                    id: None,
                }),
                indication: Some("Incidental nodule".to_owned()),
                ..ReportDraft::default()
            },
        );

        session.apply_case(&case);
        assert_eq!(session.record().patient.age, "70");
        assert_eq!(session.record().study_area, "Chest CT");
        assert_eq!(session.record().comparison.change, "stable");
        assert!(session.is_valid());
    }
}
