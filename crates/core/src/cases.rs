//! Teaching case presets.
//!
//! A preset is a named candidate report a host can drop into an editing
//! session for training or demonstration. Presets are kept as drafts, not
//! records, so applying one runs through the same schema pass as any other
//! external value.

use laudo_types::TemplateKey;

use crate::record::{FindingDraft, PatientDraft, ReportDraft, SizeDraft};

/// One named preset case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CasePreset {
    name: String,
    draft: ReportDraft,
}

impl CasePreset {
    pub fn new(name: impl Into<String>, draft: ReportDraft) -> Self {
        Self {
            name: name.into(),
            draft,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }
}

/// Preset cases grouped per template, in a fixed presentation order.
#[derive(Clone, Debug)]
pub struct CaseLibrary {
    entries: Vec<(TemplateKey, Vec<CasePreset>)>,
}

impl CaseLibrary {
    pub fn new(entries: Vec<(TemplateKey, Vec<CasePreset>)>) -> Self {
        Self { entries }
    }

    /// The built-in library. Every preset passes validation under its own
    /// template, so loading one always yields a submittable report.
    pub fn builtin() -> Self {
        Self::new(vec![
            (TemplateKey::new("Chest CT"), chest_cases()),
            (TemplateKey::new("Abdomen CT"), abdomen_cases()),
            (TemplateKey::new("Head CT"), vec![]),
        ])
    }

    /// Presets for the given template; empty when none are registered.
    pub fn cases_for(&self, key: &TemplateKey) -> &[CasePreset] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, cases)| cases.as_slice())
            .unwrap_or(&[])
    }

    /// Looks a preset up by template and name.
    pub fn find(&self, key: &TemplateKey, name: &str) -> Option<&CasePreset> {
        self.cases_for(key).iter().find(|c| c.name() == name)
    }
}

fn chest_cases() -> Vec<CasePreset> {
    vec![
        CasePreset::new(
            "Lobar pneumonia",
            draft(
                ("65", "M", "PAC-PNEUMO-01"),
                "Fever, productive cough and dyspnea for three days.",
                &["Multislice", "Without contrast"],
                vec![FindingDraft {
                    site: Some("Right lower lobe".to_owned()),
                    kind: Some("Parenchymal consolidation".to_owned()),
                    margins: Some("ill-defined".to_owned()),
                    density: Some("soft tissue".to_owned()),
                    additional: Some(vec!["air bronchograms within".to_owned()]),
                    ..FindingDraft::default()
                }],
                &["Consolidation in the right lower lobe, consistent with lobar pneumonia."],
            ),
        ),
        CasePreset::new(
            "Pulmonary emphysema",
            draft(
                ("72", "M", "PAC-DPOC-01"),
                "Chronic dyspnea in a long-term smoker.",
                &["Multislice", "High resolution", "Without contrast"],
                vec![FindingDraft {
                    site: Some("Both upper lobes".to_owned()),
                    kind: Some("Centrilobular emphysema".to_owned()),
                    margins: Some(String::new()),
                    density: Some("hypoattenuating".to_owned()),
                    additional: Some(vec!["apical bullae".to_owned()]),
                    ..FindingDraft::default()
                }],
                &["Diffuse centrilobular emphysema, upper-lobe predominant."],
            ),
        ),
    ]
}

fn abdomen_cases() -> Vec<CasePreset> {
    vec![CasePreset::new(
        "Acute appendicitis",
        draft(
            ("24", "F", "PAC-APEND-01"),
            "Right iliac fossa pain for 24 hours.",
            &["Multislice", "With IV contrast"],
            vec![FindingDraft {
                site: Some("Right iliac fossa".to_owned()),
                kind: Some("Distended appendix".to_owned()),
                size_mm: Some(SizeDraft {
                    long: Some("12".to_owned()),
                    short: None,
                }),
                density: Some("wall thickening with mural enhancement".to_owned()),
                additional: Some(vec!["adjacent fat stranding".to_owned()]),
                ..FindingDraft::default()
            }],
            &["Findings consistent with uncomplicated acute appendicitis."],
        ),
    )]
}

fn draft(
    (age, sex, id): (&str, &str, &str),
    indication: &str,
    technique: &[&str],
    findings: Vec<FindingDraft>,
    impression: &[&str],
) -> ReportDraft {
    ReportDraft {
        patient: Some(PatientDraft {
            age: Some(age.to_owned()),
            sex: Some(sex.to_owned()),
            id: Some(id.to_owned()),
        }),
        indication: Some(indication.to_owned()),
        technique: Some(strings(technique)),
        findings: Some(findings),
        impression: Some(strings(impression)),
        ..ReportDraft::default()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}
