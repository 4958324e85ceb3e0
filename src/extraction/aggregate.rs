//! Weighted merge of strategy candidates into one answer per field.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::AutofillConfig;

use super::{ExtractionCandidate, FieldCandidates, JobField};

pub const PAGE_TITLE_SOURCE: &str = "page-title";
pub const PAGE_TITLE_CONFIDENCE: f64 = 0.5;

/// Fields whose confidence decides whether a record is trustworthy.
pub const CORE_FIELDS: [JobField; 4] = [JobField::Position, JobField::Company, JobField::Location, JobField::Salary];

static TITLE_AT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\s+at\s+(.+)$").expect("static regex"));
static TITLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+[-–—|]\s+").expect("static regex"));

/// Winning value for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResult {
    pub value: String,
    pub source: &'static str,
    /// The winning candidate's own confidence.
    pub confidence: f64,
    /// `confidence` times the source weight; what the winner was chosen by.
    pub weighted: f64,
}

impl FieldResult {
    fn from_candidate(candidate: &ExtractionCandidate, weight: f64) -> Self {
        Self {
            value: candidate.value.clone(),
            source: candidate.source,
            confidence: candidate.confidence,
            weighted: candidate.confidence * weight,
        }
    }
}

pub type AggregatedFields = BTreeMap<JobField, FieldResult>;

/// Total order over results, independent of arrival order: weighted score,
/// then raw confidence, then source name, then value.
fn rank(a: &FieldResult, b: &FieldResult) -> Ordering {
    b.weighted
        .total_cmp(&a.weighted)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.source.cmp(b.source))
        .then_with(|| a.value.cmp(&b.value))
}

/// Per field, the candidate with the highest `confidence x source weight`.
pub fn aggregate(candidates: &FieldCandidates, config: &AutofillConfig) -> AggregatedFields {
    let mut out = AggregatedFields::new();
    for (field, candidate) in candidates.iter() {
        let result = FieldResult::from_candidate(candidate, config.source_weight(candidate.source));
        match out.get(&field) {
            Some(current) if rank(&result, current) != Ordering::Less => {}
            _ => {
                out.insert(field, result);
            }
        }
    }
    out
}

/// Mean raw confidence of the core fields that were found; 0 when none were.
pub fn overall_confidence(fields: &AggregatedFields) -> f64 {
    let found: Vec<f64> = CORE_FIELDS
        .iter()
        .filter_map(|f| fields.get(f))
        .map(|r| r.confidence)
        .collect();
    if found.is_empty() {
        0.0
    } else {
        found.iter().sum::<f64>() / found.len() as f64
    }
}

/// Split a page title into position and company. Recognised shapes:
/// `Title at Company`, `Title - Company`, `Title | Company`.
pub fn split_page_title(title: &str) -> Option<(String, Option<String>)> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    if let Some(caps) = TITLE_AT.captures(title) {
        let company = TITLE_SEPARATOR.split(&caps[2]).next().unwrap_or("").trim();
        return Some((caps[1].trim().to_string(), Some(company.to_string()).filter(|c| !c.is_empty())));
    }
    let mut parts = TITLE_SEPARATOR.split(title).map(str::trim).filter(|p| !p.is_empty());
    let position = parts.next()?.to_string();
    let company = parts.next().map(str::to_string);
    Some((position, company))
}

/// Fill still-empty position/company from the page title.
pub fn apply_title_fallback(fields: &mut AggregatedFields, title: &str, config: &AutofillConfig) {
    let Some((position, company)) = split_page_title(title) else {
        return;
    };
    let weight = config.source_weight(PAGE_TITLE_SOURCE);
    let candidates = [(JobField::Position, Some(position)), (JobField::Company, company)];
    for (field, value) in candidates {
        let Some(value) = value else {
            continue;
        };
        fields.entry(field).or_insert_with(|| {
            FieldResult::from_candidate(&ExtractionCandidate::new(value, PAGE_TITLE_SOURCE, PAGE_TITLE_CONFIDENCE), weight)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(list: &[(JobField, &str, &'static str, f64)]) -> FieldCandidates {
        let mut out = FieldCandidates::new();
        for (field, value, source, confidence) in list {
            out.push(*field, ExtractionCandidate::new(*value, *source, *confidence));
        }
        out
    }

    #[test]
    fn test_weighted_winner() {
        let config = AutofillConfig::default();
        // regex 0.9 * 0.7 = 0.63 loses to aria 0.8 * 0.85 = 0.68
        let set = candidates(&[
            (JobField::Position, "Engineer", "regex", 0.9),
            (JobField::Position, "Senior Engineer", "aria", 0.8),
        ]);
        let merged = aggregate(&set, &config);
        let position = &merged[&JobField::Position];
        assert_eq!(position.value, "Senior Engineer");
        assert_eq!(position.source, "aria");
        assert!((position.weighted - 0.68).abs() < 1e-9);
    }

    #[test]
    fn test_order_independent() {
        let config = AutofillConfig::default();
        let a = (JobField::Company, "Acme", "nlp", 0.7);
        let b = (JobField::Company, "ACME Inc", "regex", 0.6);
        let c = (JobField::Company, "Acme Corp", "json-ld", 0.42);
        let forward = aggregate(&candidates(&[a, b, c]), &config);
        let backward = aggregate(&candidates(&[c, b, a]), &config);
        assert_eq!(forward, backward);
        // json-ld 0.42 == nlp 0.7 * 0.6; raw confidence breaks the tie.
        assert_eq!(forward[&JobField::Company].source, "nlp");
    }

    #[test]
    fn test_overall_confidence() {
        let config = AutofillConfig::default();
        let set = candidates(&[
            (JobField::Position, "Engineer", "json-ld", 0.95),
            (JobField::Company, "Acme", "regex", 0.65),
            (JobField::JobDescription, "text", "json-ld", 0.1),
        ]);
        let merged = aggregate(&set, &config);
        assert!((overall_confidence(&merged) - 0.8).abs() < 1e-9);
        assert_eq!(overall_confidence(&AggregatedFields::new()), 0.0);
    }

    #[test]
    fn test_title_shapes() {
        assert_eq!(
            split_page_title("Backend Engineer at Initech | Careers"),
            Some(("Backend Engineer".into(), Some("Initech".into())))
        );
        assert_eq!(
            split_page_title("Data Analyst - Globex"),
            Some(("Data Analyst".into(), Some("Globex".into())))
        );
        assert_eq!(split_page_title("Jobs"), Some(("Jobs".into(), None)));
        assert_eq!(split_page_title("  "), None);
    }

    #[test]
    fn test_title_fallback_only_fills_gaps() {
        let config = AutofillConfig::default();
        let mut merged = aggregate(
            &candidates(&[(JobField::Position, "Platform Engineer", "json-ld", 0.95)]),
            &config,
        );
        apply_title_fallback(&mut merged, "Engineer | Hooli", &config);
        assert_eq!(merged[&JobField::Position].value, "Platform Engineer");
        let company = &merged[&JobField::Company];
        assert_eq!(company.value, "Hooli");
        assert_eq!(company.source, PAGE_TITLE_SOURCE);
        assert!((company.weighted - 0.25).abs() < 1e-9);
    }
}
