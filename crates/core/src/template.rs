//! Study template registry.
//!
//! A template owns the default record an editor opens with, the defaults used
//! when a finding entry is added, and a free-text skeleton for hosts that
//! offer a plain dictation surface next to the structured form.

use laudo_types::TemplateKey;

use crate::record::{Comparison, Finding, PatientInfo, ReportRecord, SizeMm};

/// Raised when a key does not name a registered template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown study template: {0}")]
pub struct UnknownTemplateError(pub String);

/// Per-template defaults applied to a finding entry when the author has not
/// said otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindingDefaults {
    pub kind: String,
    pub margins: String,
    pub density: String,
}

impl FindingDefaults {
    pub fn new(
        kind: impl Into<String>,
        margins: impl Into<String>,
        density: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            margins: margins.into(),
            density: density.into(),
        }
    }

    /// Returns a fresh finding entry carrying these defaults.
    ///
    /// The site starts empty on purpose; it is the one finding field an
    /// author must always fill in.
    pub fn seed(&self) -> Finding {
        Finding {
            site: String::new(),
            kind: self.kind.clone(),
            size_mm: SizeMm::default(),
            margins: self.margins.clone(),
            density: self.density.clone(),
            additional: vec![],
        }
    }
}

/// One registered study template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudyTemplate {
    key: TemplateKey,
    default_record: ReportRecord,
    finding_defaults: FindingDefaults,
    requires_finding: bool,
    skeleton: String,
}

impl StudyTemplate {
    /// Builds a template.
    ///
    /// The default record's `studyArea` is forced to the key, so every record
    /// produced from this template names its template correctly no matter
    /// what the caller put there.
    pub fn new(
        key: TemplateKey,
        mut default_record: ReportRecord,
        finding_defaults: FindingDefaults,
        requires_finding: bool,
        skeleton: impl Into<String>,
    ) -> Self {
        default_record.study_area = key.as_str().to_owned();
        Self {
            key,
            default_record,
            finding_defaults,
            requires_finding,
            skeleton: skeleton.into(),
        }
    }

    pub fn key(&self) -> &TemplateKey {
        &self.key
    }

    /// Returns a fresh copy of the default record.
    ///
    /// Callers own the copy; editing it never leaks back into the registry.
    pub fn default_record(&self) -> ReportRecord {
        self.default_record.clone()
    }

    pub fn finding_defaults(&self) -> &FindingDefaults {
        &self.finding_defaults
    }

    /// Whether a record from this template must carry at least one finding to
    /// pass validation.
    pub fn requires_finding(&self) -> bool {
        self.requires_finding
    }

    /// Free-text section skeleton for dictation-first authoring.
    pub fn skeleton(&self) -> &str {
        &self.skeleton
    }
}

/// Ordered collection of the study templates a deployment offers.
#[derive(Clone, Debug)]
pub struct TemplateRegistry {
    templates: Vec<StudyTemplate>,
}

impl TemplateRegistry {
    /// Builds a registry from an explicit template set, kept in the given
    /// order.
    pub fn new(templates: Vec<StudyTemplate>) -> Self {
        Self { templates }
    }

    /// The built-in template set: chest, abdomen and head CT studies.
    ///
    /// The chest template opens blank so a pristine record renders only the
    /// two mandatory narrative lines. The other two seed their usual
    /// acquisition technique.
    pub fn builtin() -> Self {
        let chest = StudyTemplate::new(
            TemplateKey::new("Chest CT"),
            blank_record(&[]),
            FindingDefaults::new("Nodule", "regular", "solid"),
            false,
            "Indication:\n\nTechnique:\n\nFindings:\n\nImpression:\n",
        );
        let abdomen = StudyTemplate::new(
            TemplateKey::new("Abdomen CT"),
            blank_record(&["Multislice", "Portal phase", "With IV contrast"]),
            FindingDefaults::new("Hypodense lesion", "regular", "hypodense"),
            false,
            "Indication:\n\nTechnique:\n\nLiver:\n\nBiliary tract:\n\nPancreas:\n\n\
             Spleen:\n\nKidneys and adrenals:\n\nGastrointestinal tract:\n\nImpression:\n",
        );
        let head = StudyTemplate::new(
            TemplateKey::new("Head CT"),
            blank_record(&["Without contrast", "Thin axial slices", "Multiplanar reconstructions"]),
            FindingDefaults::new("Hypodensity", "ill-defined", "hypodense"),
            false,
            "Indication:\n\nTechnique:\n\nBrain parenchyma:\n\nVentricular system:\n\n\
             Subarachnoid spaces:\n\nCalvaria:\n\nImpression:\n",
        );
        Self::new(vec![chest, abdomen, head])
    }

    /// Lists the registered template keys in registration order.
    pub fn list_templates(&self) -> Vec<TemplateKey> {
        self.templates.iter().map(|t| t.key().clone()).collect()
    }

    /// Looks up a template by key.
    pub fn get(&self, key: &TemplateKey) -> Result<&StudyTemplate, UnknownTemplateError> {
        self.templates
            .iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| UnknownTemplateError(key.as_str().to_owned()))
    }

    /// Returns a fresh default record for the given template.
    pub fn get_default(&self, key: &TemplateKey) -> Result<ReportRecord, UnknownTemplateError> {
        Ok(self.get(key)?.default_record())
    }
}

fn blank_record(technique: &[&str]) -> ReportRecord {
    ReportRecord {
        study_area: String::new(),
        patient: PatientInfo::default(),
        indication: String::new(),
        technique: technique.iter().map(|t| (*t).to_owned()).collect(),
        findings: vec![],
        ancillary: vec![],
        comparison: Comparison::default(),
        impression: vec![],
        recommendations: vec![],
    }
}
