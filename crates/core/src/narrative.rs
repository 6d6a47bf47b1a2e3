//! Narrative derivation.
//!
//! Turns a report record into the prose block shown in the live preview and
//! printed as the PDF body. Pure and total: any record renders, complete or
//! not, and empty display fields fall back to [`FALLBACK_TOKEN`].
//!
//! Line order and the conditional-emission rules are a fixed contract. The
//! first two lines always appear; findings follow in entry order; ancillary,
//! comparison, impression and recommendation lines appear only when they have
//! content. Tests compare against fixtures line for line.

use crate::record::{ReportRecord, SizeMm};

/// Placeholder printed when a display field has no value.
pub const FALLBACK_TOKEN: &str = "—";

/// Formats the size of a finding.
///
/// Non-empty measurements are joined with `" x "`; a finding with no
/// measurements at all renders as the fallback token.
pub fn size_token(size: &SizeMm) -> String {
    let parts: Vec<&str> = [size.long.as_str(), size.short.as_str()]
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        FALLBACK_TOKEN.to_owned()
    } else {
        parts.join(" x ")
    }
}

/// Renders the narrative as ordered lines.
pub fn narrative_lines(record: &ReportRecord) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("Indication: {}", or_fallback(&record.indication)));

    let technique = join_present(&record.technique, ", ");
    lines.push(format!("Technique: {}", or_fallback(&technique)));

    for (index, finding) in record.findings.iter().enumerate() {
        let additional = join_present(&finding.additional, ", ");
        let additional_clause = if additional.is_empty() {
            String::new()
        } else {
            format!("; additional: {additional}")
        };
        lines.push(format!(
            "Finding {}: {} in {}; margins {}; density {}; size {} mm{}.",
            index + 1,
            or_fallback(&finding.kind),
            or_fallback(&finding.site),
            or_fallback(&finding.margins),
            or_fallback(&finding.density),
            size_token(&finding.size_mm),
            additional_clause,
        ));
    }

    let ancillary = join_present(&record.ancillary, ", ");
    if !ancillary.is_empty() {
        lines.push(format!("Ancillary findings: {ancillary}"));
    }

    if !record.comparison.prior_date.trim().is_empty() {
        lines.push(format!(
            "Comparison: {} → {}",
            record.comparison.prior_date,
            or_fallback(&record.comparison.change),
        ));
    }

    let impression = join_present(&record.impression, "; ");
    if !impression.is_empty() {
        lines.push(format!("Impression: {impression}"));
    }

    let recommendations = join_present(&record.recommendations, "; ");
    if !recommendations.is_empty() {
        lines.push(format!("Recommendations: {recommendations}"));
    }

    lines
}

/// Renders the narrative as one newline-joined block.
pub fn render(record: &ReportRecord) -> String {
    narrative_lines(record).join("\n")
}

/// Returns `value`, or the fallback token when it is blank.
pub fn or_fallback(value: &str) -> &str {
    if value.trim().is_empty() {
        FALLBACK_TOKEN
    } else {
        value
    }
}

/// Joins the non-blank entries of a list, trimming nothing else.
pub fn join_present(entries: &[String], separator: &str) -> String {
    entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Comparison, Finding, PatientInfo, ReportRecord};
    use crate::template::TemplateRegistry;
    use laudo_types::TemplateKey;

    fn chest_default() -> ReportRecord {
        TemplateRegistry::builtin()
            .get_default(&TemplateKey::new("Chest CT"))
            .expect("built in")
    }

    fn nodule(long: &str, short: &str) -> Finding {
        Finding {
            site: "Right upper lobe".to_owned(),
            kind: "Nodule".to_owned(),
            size_mm: SizeMm {
                long: long.to_owned(),
                short: short.to_owned(),
            },
            margins: "regular".to_owned(),
            density: "solid".to_owned(),
            additional: vec![],
        }
    }

    #[test]
    fn pristine_default_renders_exactly_two_lines() {
        let lines = narrative_lines(&chest_default());
        assert_eq!(lines, vec!["Indication: —".to_owned(), "Technique: —".to_owned()]);
    }

    #[test]
    fn full_record_matches_fixture_line_for_line() {
        let record = ReportRecord {
            study_area: "Chest CT".to_owned(),
            patient: PatientInfo {
                age: "63".to_owned(),
                sex: "M".to_owned(),
                id: "PAC-010".to_owned(),
            },
            indication: "Pulmonary nodule follow-up".to_owned(),
            technique: vec!["Multislice".to_owned(), "Without contrast".to_owned()],
            findings: vec![
                Finding {
                    additional: vec!["calcified".to_owned(), "subpleural".to_owned()],
                    ..nodule("12", "8")
                },
                Finding {
                    site: "Left lower lobe".to_owned(),
                    ..nodule("", "")
                },
            ],
            ancillary: vec!["Mild emphysema".to_owned()],
            comparison: Comparison {
                prior_date: "2023-11-02".to_owned(),
                change: "stable".to_owned(),
            },
            impression: vec![
                "Stable dominant nodule".to_owned(),
                "No new lesions".to_owned(),
            ],
            recommendations: vec!["CT follow-up in 12 months".to_owned()],
        };

        let expected = "\
Indication: Pulmonary nodule follow-up
Technique: Multislice, Without contrast
Finding 1: Nodule in Right upper lobe; margins regular; density solid; size 12 x 8 mm; additional: calcified, subpleural.
Finding 2: Nodule in Left lower lobe; margins regular; density solid; size — mm.
Ancillary findings: Mild emphysema
Comparison: 2023-11-02 → stable
Impression: Stable dominant nodule; No new lesions
Recommendations: CT follow-up in 12 months";
        assert_eq!(render(&record), expected);
    }

    #[test]
    fn size_token_joins_present_measurements() {
        assert_eq!(size_token(&SizeMm { long: "12".to_owned(), short: "8".to_owned() }), "12 x 8");
        assert_eq!(size_token(&SizeMm { long: "12".to_owned(), short: String::new() }), "12");
        assert_eq!(size_token(&SizeMm { long: String::new(), short: "8".to_owned() }), "8");
        assert_eq!(size_token(&SizeMm::default()), "—");
    }

    #[test]
    fn comparison_line_needs_a_prior_date() {
        let mut record = chest_default();
        record.comparison.change = "worsened".to_owned();
        assert!(!render(&record).contains("Comparison:"));

        record.comparison.prior_date = "2024-05-01".to_owned();
        assert!(render(&record).contains("Comparison: 2024-05-01 → worsened"));
    }

    #[test]
    fn empty_change_falls_back_in_comparison_line() {
        let mut record = chest_default();
        record.comparison.prior_date = "2024-05-01".to_owned();
        record.comparison.change = String::new();
        assert!(render(&record).contains("Comparison: 2024-05-01 → —"));
    }

    #[test]
    fn blank_list_entries_are_filtered_before_emission() {
        let mut record = chest_default();
        record.technique = vec!["Multislice".to_owned(), "  ".to_owned()];
        record.impression = vec![String::new(), "  ".to_owned()];
        let lines = narrative_lines(&record);
        assert_eq!(lines[1], "Technique: Multislice");
        // Impression entries were all blank, so no impression line at all.
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn additional_clause_only_when_present() {
        let mut record = chest_default();
        record.findings.push(nodule("12", "8"));
        let line = &narrative_lines(&record)[2];
        assert!(!line.contains("additional"));
        assert!(line.ends_with("size 12 x 8 mm."));

        record.findings[0].additional = vec!["spiculated".to_owned()];
        let line = &narrative_lines(&record)[2];
        assert!(line.ends_with("size 12 x 8 mm; additional: spiculated."));
    }

    #[test]
    fn unfilled_finding_renders_with_fallbacks() {
        let mut record = chest_default();
        record.findings.push(Finding {
            site: String::new(),
            kind: String::new(),
            size_mm: SizeMm::default(),
            margins: String::new(),
            density: String::new(),
            additional: vec![],
        });
        let line = &narrative_lines(&record)[2];
        assert_eq!(
            line,
            "Finding 1: — in —; margins —; density —; size — mm."
        );
    }
}
