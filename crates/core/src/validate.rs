//! Schema pass over candidate reports.
//!
//! The pass is split into two independently callable halves:
//!
//! - [`apply_defaults`] completes a candidate's shape, filling every absent
//!   field from the template so the result is always a full [`ReportRecord`].
//! - [`check_complete`] checks the mandatory content rules on a complete
//!   record and reports every violation at once.
//!
//! [`validate`] chains the two. Defaulting is idempotent: values that are
//! present, including empty strings, pass through untouched, so running a
//! record through the pass again changes nothing.

use std::fmt;

use crate::paths::FieldPath;
use crate::record::{
    Comparison, Finding, FindingDraft, PatientInfo, ReportDraft, ReportRecord, SizeMm,
    DEFAULT_CHANGE,
};
use crate::template::{FindingDefaults, StudyTemplate};

/// One mandatory-content violation, addressed by the field at fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: FieldPath,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The full set of violations found in one pass.
///
/// Never constructed empty; a clean record yields `Ok(())` instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationErrorSet {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrorSet {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns the issues raised against the given field, if any.
    pub fn for_path(&self, path: FieldPath) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.path == path).collect()
    }
}

impl fmt::Display for ValidationErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrorSet {}

/// Completes a candidate report against its template.
///
/// Absent fields take the template's defaults; present values pass through
/// verbatim, empty strings included. A finding entry inherits the template's
/// finding defaults for whatever it does not specify. The result always has
/// every field present.
pub fn apply_defaults(draft: ReportDraft, template: &StudyTemplate) -> ReportRecord {
    let defaults = template.finding_defaults();
    ReportRecord {
        study_area: draft
            .study_area
            .unwrap_or_else(|| template.key().as_str().to_owned()),
        patient: draft
            .patient
            .map(|p| PatientInfo {
                age: p.age.unwrap_or_default(),
                sex: p.sex.unwrap_or_default(),
                id: p.id.unwrap_or_default(),
            })
            .unwrap_or_default(),
        indication: draft.indication.unwrap_or_default(),
        technique: draft.technique.unwrap_or_default(),
        findings: draft
            .findings
            .unwrap_or_default()
            .into_iter()
            .map(|f| complete_finding(f, defaults))
            .collect(),
        ancillary: draft.ancillary.unwrap_or_default(),
        comparison: draft
            .comparison
            .map(|c| Comparison {
                prior_date: c.prior_date.unwrap_or_default(),
                change: c.change.unwrap_or_else(|| DEFAULT_CHANGE.to_owned()),
            })
            .unwrap_or_default(),
        impression: draft.impression.unwrap_or_default(),
        recommendations: draft.recommendations.unwrap_or_default(),
    }
}

fn complete_finding(draft: FindingDraft, defaults: &FindingDefaults) -> Finding {
    Finding {
        site: draft.site.unwrap_or_default(),
        kind: draft.kind.unwrap_or_else(|| defaults.kind.clone()),
        size_mm: draft
            .size_mm
            .map(|s| SizeMm {
                long: s.long.unwrap_or_default(),
                short: s.short.unwrap_or_default(),
            })
            .unwrap_or_default(),
        margins: draft.margins.unwrap_or_else(|| defaults.margins.clone()),
        density: draft.density.unwrap_or_else(|| defaults.density.clone()),
        additional: draft.additional.unwrap_or_default(),
    }
}

/// Checks the mandatory-content rules on a complete record.
///
/// All rules are evaluated; the error set carries every violation, not just
/// the first. Whitespace-only values count as missing.
pub fn check_complete(
    record: &ReportRecord,
    template: &StudyTemplate,
) -> Result<(), ValidationErrorSet> {
    let mut issues = Vec::new();

    if record.patient.age.trim().is_empty() {
        issues.push(ValidationIssue::new(FieldPath::PatientAge, "Age is required"));
    }
    if record.patient.sex.trim().is_empty() {
        issues.push(ValidationIssue::new(FieldPath::PatientSex, "Sex is required"));
    }
    if record.indication.trim().is_empty() {
        issues.push(ValidationIssue::new(
            FieldPath::Indication,
            "Indication is required",
        ));
    }
    for (index, finding) in record.findings.iter().enumerate() {
        if finding.site.trim().is_empty() {
            issues.push(ValidationIssue::new(
                FieldPath::FindingSite(index),
                "Site is required",
            ));
        }
    }
    if template.requires_finding() && record.findings.is_empty() {
        issues.push(ValidationIssue::new(
            FieldPath::Findings,
            "At least one finding is required",
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrorSet { issues })
    }
}

/// Runs the full schema pass: complete the shape, then check the content.
pub fn validate(
    draft: ReportDraft,
    template: &StudyTemplate,
) -> Result<ReportRecord, ValidationErrorSet> {
    let record = apply_defaults(draft, template);
    check_complete(&record, template)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PatientDraft, SizeDraft};
    use crate::template::{FindingDefaults, StudyTemplate, TemplateRegistry};
    use laudo_types::TemplateKey;

    fn chest() -> StudyTemplate {
        TemplateRegistry::builtin()
            .get(&TemplateKey::new("Chest CT"))
            .expect("built in")
            .clone()
    }

    fn filled_draft() -> ReportDraft {
        ReportDraft {
            patient: Some(PatientDraft {
                age: Some("45".to_owned()),
                sex: Some("F".to_owned()),
                id: Some("PAC-001".to_owned()),
            }),
            indication: Some("Screening".to_owned()),
            ..ReportDraft::default()
        }
    }

    #[test]
    fn empty_draft_completes_to_template_shape() {
        let record = apply_defaults(ReportDraft::default(), &chest());
        assert_eq!(record.study_area, "Chest CT");
        assert_eq!(record.comparison.change, "stable");
        assert!(record.findings.is_empty());
        assert!(record.impression.is_empty());
    }

    #[test]
    fn present_values_pass_through_untouched() {
        let draft = ReportDraft {
            comparison: Some(crate::record::ComparisonDraft {
                prior_date: Some("2024-01-01".to_owned()),
                change: Some(String::new()),
            }),
            ..ReportDraft::default()
        };
        let record = apply_defaults(draft, &chest());
        // An explicitly empty change is kept, only absence defaults.
        assert_eq!(record.comparison.change, "");
        assert_eq!(record.comparison.prior_date, "2024-01-01");
    }

    #[test]
    fn finding_inherits_template_defaults() {
        let draft = ReportDraft {
            findings: Some(vec![FindingDraft {
                site: Some("Right upper lobe".to_owned()),
                size_mm: Some(SizeDraft {
                    long: Some("12".to_owned()),
                    short: None,
                }),
                ..FindingDraft::default()
            }]),
            ..ReportDraft::default()
        };
        let record = apply_defaults(draft, &chest());
        let finding = &record.findings[0];
        assert_eq!(finding.kind, "Nodule");
        assert_eq!(finding.margins, "regular");
        assert_eq!(finding.density, "solid");
        assert_eq!(finding.size_mm.long, "12");
        assert_eq!(finding.size_mm.short, "");
    }

    #[test]
    fn defaulting_is_idempotent() {
        let template = chest();
        let once = apply_defaults(filled_draft(), &template);
        let twice = apply_defaults(ReportDraft::from(once.clone()), &template);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalized_record_is_stable_across_serde() {
        let template = chest();
        let record = validate(filled_draft(), &template).expect("complete");
        let json = serde_json::to_string(&record).expect("serializes");
        let read: ReportRecord = serde_json::from_str(&json).expect("parses");
        assert_eq!(read, record);
        let revalidated =
            validate(ReportDraft::from(read), &template).expect("still complete");
        assert_eq!(revalidated, record);
    }

    #[test]
    fn all_violations_are_reported_together() {
        let draft = ReportDraft {
            findings: Some(vec![FindingDraft::default()]),
            ..ReportDraft::default()
        };
        let err = validate(draft, &chest()).expect_err("mandatory fields missing");
        let paths: Vec<String> = err.issues().iter().map(|i| i.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "patient.age".to_owned(),
                "patient.sex".to_owned(),
                "indication".to_owned(),
                "findings[0].site".to_owned(),
            ]
        );
    }

    #[test]
    fn whitespace_counts_as_missing() {
        let mut draft = filled_draft();
        draft.indication = Some("   ".to_owned());
        let err = validate(draft, &chest()).expect_err("blank indication");
        assert_eq!(err.len(), 1);
        assert_eq!(err.issues()[0].path, FieldPath::Indication);
    }

    #[test]
    fn filled_draft_validates_clean() {
        let record = validate(filled_draft(), &chest()).expect("complete");
        assert_eq!(record.patient.age, "45");
    }

    #[test]
    fn template_may_require_a_finding() {
        let template = StudyTemplate::new(
            TemplateKey::new("Biopsy CT"),
            chest().default_record(),
            FindingDefaults::new("Lesion", "regular", "solid"),
            true,
            "Indication:\n",
        );
        let err = validate(filled_draft(), &template).expect_err("no findings");
        assert_eq!(err.issues()[0].path, FieldPath::Findings);
        assert_eq!(err.issues()[0].message, "At least one finding is required");
    }

    #[test]
    fn error_set_formats_for_logs() {
        let err = validate(ReportDraft::default(), &chest()).expect_err("empty draft");
        let rendered = err.to_string();
        assert!(rendered.contains("patient.age: Age is required"));
        assert!(rendered.contains("; indication: Indication is required"));
    }

    #[test]
    fn issues_can_be_looked_up_by_path() {
        let err = validate(ReportDraft::default(), &chest()).expect_err("empty draft");
        assert_eq!(err.for_path(FieldPath::PatientSex).len(), 1);
        assert!(err.for_path(FieldPath::Findings).is_empty());
    }
}
