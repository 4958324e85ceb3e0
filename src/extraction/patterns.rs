//! Regex strategy over the page's visible text.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractionCandidate, ExtractionStrategy, FieldCandidates, JobField, PageContent};

pub const REGEX_SOURCE: &str = "regex";

const LABELLED_CONFIDENCE: f64 = 0.7;
const SALARY_SHAPE_CONFIDENCE: f64 = 0.6;
const MAX_VALUE_CHARS: usize = 120;

static LABELLED_LINES: Lazy<Vec<(JobField, Regex)>> = Lazy::new(|| {
    [
        (JobField::Position, r"(?im)^\s*(?:job\s*title|position|role)\s*[:\-–]\s*(.+?)\s*$"),
        (JobField::Company, r"(?im)^\s*(?:company(?:\s*name)?|employer|organi[sz]ation)\s*[:\-–]\s*(.+?)\s*$"),
        (JobField::Location, r"(?im)^\s*(?:job\s*)?(?:location|office|based\s+in)\s*[:\-–]\s*(.+?)\s*$"),
        (JobField::Salary, r"(?im)^\s*(?:salary(?:\s*range)?|compensation|pay(?:\s*range)?)\s*[:\-–]\s*(.+?)\s*$"),
    ]
    .into_iter()
    .map(|(field, src)| (field, Regex::new(src).expect("static regex")))
    .collect()
});

static SALARY_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[$€£]\s?\d[\d,.]*\s?[km]?\s*(?:-|–|to)\s*[$€£]?\s?\d[\d,.]*\s?[km]?(?:\s*(?:per|/|a|an)\s*(?:year|yr|annum|hour|hr|month|mo))?",
    )
    .expect("static regex")
});

pub fn regex_candidates(text: &str) -> FieldCandidates {
    let mut out = FieldCandidates::new();

    for (field, re) in LABELLED_LINES.iter() {
        if let Some(value) = re
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .find(|v| !v.is_empty() && v.chars().count() <= MAX_VALUE_CHARS)
        {
            out.push(*field, ExtractionCandidate::new(value, REGEX_SOURCE, LABELLED_CONFIDENCE));
        }
    }

    if out.get(JobField::Salary).is_empty() {
        if let Some(m) = SALARY_RANGE.find(text) {
            out.push(
                JobField::Salary,
                ExtractionCandidate::new(m.as_str().trim(), REGEX_SOURCE, SALARY_SHAPE_CONFIDENCE),
            );
        }
    }

    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RegexStrategy;

#[async_trait(?Send)]
impl ExtractionStrategy for RegexStrategy {
    fn name(&self) -> &'static str {
        REGEX_SOURCE
    }

    async fn extract(&self, page: &PageContent) -> FieldCandidates {
        regex_candidates(&page.text)
    }
}
