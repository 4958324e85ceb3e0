//! Job-posting extraction.
//!
//! Independent strategies each propose candidates per field; the pipeline
//! runs them together, weighs their answers and only then asks the LLM when
//! the cheap strategies were not convincing.
//!
//! - `jsonld`: schema.org `JobPosting` blocks
//! - `aria`: accessibility labels and headings
//! - `patterns`: labelled lines and salary shapes in page text
//! - `nlp`: phrase templates ("Acme is hiring a ...")
//! - `llm`: optional model fallback behind [`LlmTransport`]

mod aggregate;
mod aria;
mod jsonld;
mod llm;
mod nlp;
mod page;
mod patterns;
mod pipeline;

pub use aggregate::*;
pub use aria::*;
pub use jsonld::*;
pub use llm::*;
pub use nlp::*;
pub use page::*;
pub use patterns::*;
pub use pipeline::*;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Fields a job record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobField {
    Position,
    Company,
    Location,
    Salary,
    JobDescription,
}

impl JobField {
    pub const ALL: [JobField; 5] = [
        JobField::Position,
        JobField::Company,
        JobField::Location,
        JobField::Salary,
        JobField::JobDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Company => "company",
            Self::Location => "location",
            Self::Salary => "salary",
            Self::JobDescription => "jobDescription",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "position" | "title" | "jobTitle" => Some(Self::Position),
            "company" | "companyName" | "hiringOrganization" => Some(Self::Company),
            "location" => Some(Self::Location),
            "salary" | "compensation" => Some(Self::Salary),
            "jobDescription" | "description" => Some(Self::JobDescription),
            _ => None,
        }
    }
}

/// One strategy's proposal for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionCandidate {
    pub value: String,
    pub source: &'static str,
    /// Always within 0.0-1.0.
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl ExtractionCandidate {
    pub fn new(value: impl Into<String>, source: &'static str, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self {
            value: value.into(),
            source,
            confidence,
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// Candidates grouped by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldCandidates {
    by_field: BTreeMap<JobField, Vec<ExtractionCandidate>>,
}

impl FieldCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate. Blank values are dropped.
    pub fn push(&mut self, field: JobField, candidate: ExtractionCandidate) {
        let value = candidate.value.trim();
        if value.is_empty() {
            return;
        }
        let candidate = ExtractionCandidate {
            value: value.to_string(),
            ..candidate
        };
        self.by_field.entry(field).or_default().push(candidate);
    }

    pub fn get(&self, field: JobField) -> &[ExtractionCandidate] {
        self.by_field.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Highest-confidence candidate for `field` from this set alone.
    pub fn best(&self, field: JobField) -> Option<&ExtractionCandidate> {
        self.get(field)
            .iter()
            .fold(None, |best: Option<&ExtractionCandidate>, c| match best {
                Some(b) if b.confidence >= c.confidence => Some(b),
                _ => Some(c),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobField, &ExtractionCandidate)> {
        self.by_field
            .iter()
            .flat_map(|(field, list)| list.iter().map(move |c| (*field, c)))
    }

    pub fn merge(&mut self, other: FieldCandidates) {
        for (field, list) in other.by_field {
            self.by_field.entry(field).or_default().extend(list);
        }
    }

    pub fn len(&self) -> usize {
        self.by_field.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A source of job-field candidates. Strategies never see each other's
/// output.
#[async_trait(?Send)]
pub trait ExtractionStrategy {
    /// Unique source tag stamped on every candidate.
    fn name(&self) -> &'static str;

    async fn extract(&self, page: &PageContent) -> FieldCandidates;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(ExtractionCandidate::new("x", "regex", 1.7).confidence, 1.0);
        assert_eq!(ExtractionCandidate::new("x", "regex", -0.2).confidence, 0.0);
        assert_eq!(ExtractionCandidate::new("x", "regex", f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_blank_values_dropped_and_trimmed() {
        let mut set = FieldCandidates::new();
        set.push(JobField::Company, ExtractionCandidate::new("   ", "aria", 0.8));
        set.push(JobField::Company, ExtractionCandidate::new(" Acme ", "aria", 0.8));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(JobField::Company)[0].value, "Acme");
    }

    #[test]
    fn test_best_and_merge() {
        let mut a = FieldCandidates::new();
        a.push(JobField::Position, ExtractionCandidate::new("Engineer", "regex", 0.6));
        let mut b = FieldCandidates::new();
        b.push(JobField::Position, ExtractionCandidate::new("Senior Engineer", "json-ld", 0.95));
        a.merge(b);
        assert_eq!(a.get(JobField::Position).len(), 2);
        assert_eq!(a.best(JobField::Position).unwrap().source, "json-ld");
        assert!(a.best(JobField::Salary).is_none());
    }

    #[test]
    fn test_field_keys() {
        assert_eq!(JobField::from_key("title"), Some(JobField::Position));
        assert_eq!(JobField::from_key("companyName"), Some(JobField::Company));
        assert_eq!(JobField::from_key("benefits"), None);
        for field in JobField::ALL {
            assert_eq!(JobField::from_key(field.as_str()), Some(field));
        }
    }
}
