//! Structured report data model.
//!
//! Two shapes cover the editing lifecycle:
//!
//! - [`ReportRecord`] is the complete shape. Every field is present, lists may
//!   be empty but never missing. All in-memory editing and every downstream
//!   consumer (narrative, export, persistence) works on this shape.
//! - [`ReportDraft`] is the tolerant candidate shape used at trust boundaries:
//!   persisted drafts, request bodies, files. Any field may be absent and the
//!   schema pass fills the gaps.
//!
//! Wire names follow the persisted JSON: `studyArea`, `priorDate` and the
//! finding discriminator `type` keep their original spelling.

use serde::{Deserialize, Serialize};

/// Value `comparison.change` takes when a draft does not provide one.
pub const DEFAULT_CHANGE: &str = "stable";

/// A complete structured report.
///
/// `study_area` matches the key of the template the record was produced from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(rename = "studyArea")]
    pub study_area: String,
    pub patient: PatientInfo,
    pub indication: String,
    pub technique: Vec<String>,
    pub findings: Vec<Finding>,
    pub ancillary: Vec<String>,
    pub comparison: Comparison,
    pub impression: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Patient context captured alongside the study.
///
/// Age is kept as entered rather than parsed; the record stores what the
/// clinician typed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub age: String,
    pub sex: String,
    pub id: String,
}

/// One observed finding within the study.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size_mm: SizeMm,
    pub margins: String,
    pub density: String,
    pub additional: Vec<String>,
}

/// Finding dimensions in millimetres, kept as entered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeMm {
    pub long: String,
    pub short: String,
}

/// Reference to a prior study and how the picture evolved since.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(rename = "priorDate")]
    pub prior_date: String,
    pub change: String,
}

impl Default for Comparison {
    /// No prior study on record; `change` starts at [`DEFAULT_CHANGE`].
    fn default() -> Self {
        Self {
            prior_date: String::new(),
            change: DEFAULT_CHANGE.to_owned(),
        }
    }
}

/// A candidate report as found at a trust boundary.
///
/// Deserialization tolerates any subset of the record fields. Feeding a draft
/// through the schema pass yields a [`ReportRecord`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportDraft {
    #[serde(rename = "studyArea", skip_serializing_if = "Option::is_none")]
    pub study_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<Vec<FindingDraft>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancillary: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impression: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
}

/// Candidate shape of [`PatientInfo`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Candidate shape of [`Finding`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindingDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_mm: Option<SizeDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margins: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional: Option<Vec<String>>,
}

/// Candidate shape of [`SizeMm`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
}

/// Candidate shape of [`Comparison`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonDraft {
    #[serde(rename = "priorDate", skip_serializing_if = "Option::is_none")]
    pub prior_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
}

impl From<ReportRecord> for ReportDraft {
    fn from(record: ReportRecord) -> Self {
        Self {
            study_area: Some(record.study_area),
            patient: Some(PatientDraft {
                age: Some(record.patient.age),
                sex: Some(record.patient.sex),
                id: Some(record.patient.id),
            }),
            indication: Some(record.indication),
            technique: Some(record.technique),
            findings: Some(record.findings.into_iter().map(FindingDraft::from).collect()),
            ancillary: Some(record.ancillary),
            comparison: Some(ComparisonDraft {
                prior_date: Some(record.comparison.prior_date),
                change: Some(record.comparison.change),
            }),
            impression: Some(record.impression),
            recommendations: Some(record.recommendations),
        }
    }
}

impl From<Finding> for FindingDraft {
    fn from(finding: Finding) -> Self {
        Self {
            site: Some(finding.site),
            kind: Some(finding.kind),
            size_mm: Some(SizeDraft {
                long: Some(finding.size_mm.long),
                short: Some(finding.size_mm.short),
            }),
            margins: Some(finding.margins),
            density: Some(finding.density),
            additional: Some(finding.additional),
        }
    }
}

/// Splits a comma-delimited input into trimmed, non-empty entries.
///
/// Used for list fields that are edited as a single text input, such as a
/// finding's additional descriptors.
pub fn split_comma_list(input: &str) -> Vec<String> {
    split_list(input, ',')
}

/// Splits a semicolon-delimited block into trimmed, non-empty entries.
///
/// Impression and recommendation sections are edited as one block with one
/// clause per semicolon.
pub fn split_semicolon_list(input: &str) -> Vec<String> {
    split_list(input, ';')
}

fn split_list(input: &str, separator: char) -> Vec<String> {
    input
        .split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}
