//! Typed field paths into a report record.
//!
//! Editable fields are addressed by variants of [`FieldPath`] rather than by
//! strings, so a typo in a binding is a compile error instead of a silently
//! dead input. The `Display` form matches the persisted JSON names
//! (`findings[0].type`, `comparison.priorDate`) and is what validation issues
//! carry, so a host can highlight the offending widget from the path alone.
//!
//! This module performs no I/O and holds every path-shape decision in one
//! place.

use std::fmt;

use crate::record::{split_comma_list, split_semicolon_list, Finding, ReportRecord};

/// Address of one editable field, or of the findings collection itself.
///
/// Indexed variants refer to the current entry order of the record they are
/// applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldPath {
    PatientAge,
    PatientSex,
    PatientId,
    Indication,
    /// One technique entry.
    Technique(usize),
    FindingSite(usize),
    FindingKind(usize),
    FindingSizeLong(usize),
    FindingSizeShort(usize),
    FindingMargins(usize),
    FindingDensity(usize),
    /// A finding's additional descriptors, edited as one comma-delimited input.
    FindingAdditional(usize),
    /// Ancillary findings, edited as one comma-delimited input.
    Ancillary,
    ComparisonPriorDate,
    ComparisonChange,
    /// Impression clauses, edited as one semicolon-delimited block.
    Impression,
    /// Recommendation clauses, edited as one semicolon-delimited block.
    Recommendations,
    /// The findings collection itself. Reported by validation when the
    /// collection as a whole is at fault; not directly assignable.
    Findings,
}

/// Errors from resolving a [`FieldPath`] against a concrete record.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldPathError {
    /// The indexed entry does not exist in the record
    #[error("index {index} is out of range for `{collection}` (length {len})")]
    OutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },
    /// The path names a collection, not an assignable field
    #[error("`{0}` cannot be assigned directly")]
    NotAssignable(FieldPath),
}

impl FieldPath {
    /// Writes `value` into the addressed field of `record`.
    ///
    /// Scalar fields take the value verbatim. List fields edited as a single
    /// input are split on their delimiter with blank entries dropped. Indexed
    /// paths fail with [`FieldPathError::OutOfRange`] rather than growing the
    /// collection.
    pub fn apply(self, record: &mut ReportRecord, value: &str) -> Result<(), FieldPathError> {
        match self {
            Self::PatientAge => record.patient.age = value.to_owned(),
            Self::PatientSex => record.patient.sex = value.to_owned(),
            Self::PatientId => record.patient.id = value.to_owned(),
            Self::Indication => record.indication = value.to_owned(),
            Self::Technique(index) => {
                let len = record.technique.len();
                let entry = record.technique.get_mut(index).ok_or(
                    FieldPathError::OutOfRange {
                        collection: "technique",
                        index,
                        len,
                    },
                )?;
                *entry = value.to_owned();
            }
            Self::FindingSite(index) => finding_mut(record, index)?.site = value.to_owned(),
            Self::FindingKind(index) => finding_mut(record, index)?.kind = value.to_owned(),
            Self::FindingSizeLong(index) => {
                finding_mut(record, index)?.size_mm.long = value.to_owned();
            }
            Self::FindingSizeShort(index) => {
                finding_mut(record, index)?.size_mm.short = value.to_owned();
            }
            Self::FindingMargins(index) => finding_mut(record, index)?.margins = value.to_owned(),
            Self::FindingDensity(index) => finding_mut(record, index)?.density = value.to_owned(),
            Self::FindingAdditional(index) => {
                finding_mut(record, index)?.additional = split_comma_list(value);
            }
            Self::Ancillary => record.ancillary = split_comma_list(value),
            Self::ComparisonPriorDate => record.comparison.prior_date = value.to_owned(),
            Self::ComparisonChange => record.comparison.change = value.to_owned(),
            Self::Impression => record.impression = split_semicolon_list(value),
            Self::Recommendations => record.recommendations = split_semicolon_list(value),
            Self::Findings => return Err(FieldPathError::NotAssignable(self)),
        }
        Ok(())
    }
}

fn finding_mut(record: &mut ReportRecord, index: usize) -> Result<&mut Finding, FieldPathError> {
    let len = record.findings.len();
    record
        .findings
        .get_mut(index)
        .ok_or(FieldPathError::OutOfRange {
            collection: "findings",
            index,
            len,
        })
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PatientAge => write!(f, "patient.age"),
            Self::PatientSex => write!(f, "patient.sex"),
            Self::PatientId => write!(f, "patient.id"),
            Self::Indication => write!(f, "indication"),
            Self::Technique(index) => write!(f, "technique[{index}]"),
            Self::FindingSite(index) => write!(f, "findings[{index}].site"),
            Self::FindingKind(index) => write!(f, "findings[{index}].type"),
            Self::FindingSizeLong(index) => write!(f, "findings[{index}].size_mm.long"),
            Self::FindingSizeShort(index) => write!(f, "findings[{index}].size_mm.short"),
            Self::FindingMargins(index) => write!(f, "findings[{index}].margins"),
            Self::FindingDensity(index) => write!(f, "findings[{index}].density"),
            Self::FindingAdditional(index) => write!(f, "findings[{index}].additional"),
            Self::Ancillary => write!(f, "ancillary"),
            Self::ComparisonPriorDate => write!(f, "comparison.priorDate"),
            Self::ComparisonChange => write!(f, "comparison.change"),
            Self::Impression => write!(f, "impression"),
            Self::Recommendations => write!(f, "recommendations"),
            Self::Findings => write!(f, "findings"),
        }
    }
}
