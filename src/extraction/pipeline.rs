//! Strategy fan-out, aggregation and the conditional LLM pass.

use std::collections::BTreeMap;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AutofillConfig;
use crate::platform::Platform;

use super::{
    aggregate, apply_title_fallback, overall_confidence, AggregatedFields, AriaStrategy, ExtractionStrategy,
    FieldCandidates, FieldResult, JobField, JsonLdStrategy, LlmFallback, NlpStrategy, PageContent, RegexStrategy,
};

/// Final answer for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub url: String,
    pub fields: BTreeMap<JobField, FieldResult>,
    pub confidence: f64,
    pub platform: Platform,
    pub used_llm: bool,
}

impl JobRecord {
    pub fn value(&self, field: JobField) -> Option<&str> {
        self.fields.get(&field).map(|r| r.value.as_str())
    }
}

pub struct ExtractionPipeline {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    llm: Option<LlmFallback>,
    config: AutofillConfig,
}

impl ExtractionPipeline {
    /// Pipeline with the built-in non-LLM strategies.
    pub fn new(config: AutofillConfig) -> Self {
        Self {
            strategies: vec![
                Box::new(JsonLdStrategy),
                Box::new(AriaStrategy),
                Box::new(RegexStrategy),
                Box::new(NlpStrategy),
            ],
            llm: None,
            config,
        }
    }

    /// Pipeline with exactly `strategies`.
    pub fn with_strategies(config: AutofillConfig, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self {
            strategies,
            llm: None,
            config,
        }
    }

    pub fn with_llm(mut self, llm: LlmFallback) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Whether the cheap strategies left the record weak enough to ask the
    /// model: low overall confidence, or a missing or shaky position or company.
    pub fn needs_llm(&self, fields: &AggregatedFields) -> bool {
        if overall_confidence(fields) < self.config.llm_threshold {
            return true;
        }
        [JobField::Position, JobField::Company].iter().any(|f| {
            fields
                .get(f)
                .map_or(true, |r| r.confidence < self.config.critical_field_floor)
        })
    }

    pub async fn extract(&self, page: &PageContent) -> JobRecord {
        let results = join_all(self.strategies.iter().map(|s| s.extract(page))).await;

        let mut candidates = FieldCandidates::new();
        for (strategy, found) in self.strategies.iter().zip(results) {
            debug!(strategy = strategy.name(), candidates = found.len(), "strategy finished");
            candidates.merge(found);
        }

        let mut fields = aggregate(&candidates, &self.config);
        let mut used_llm = false;
        if let Some(llm) = self.llm.as_ref().filter(|_| self.needs_llm(&fields)) {
            let answer = llm.extract(page).await;
            used_llm = !answer.is_empty();
            if used_llm {
                candidates.merge(answer);
                fields = aggregate(&candidates, &self.config);
            }
        }

        apply_title_fallback(&mut fields, &page.title, &self.config);
        let confidence = overall_confidence(&fields);
        let platform = Platform::detect(&page.url);
        info!(
            fields = fields.len(),
            confidence,
            platform = %platform,
            used_llm,
            "job extraction finished"
        );

        JobRecord {
            url: page.url.clone(),
            fields,
            confidence,
            platform,
            used_llm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::extraction::LlmTransport;
    use async_trait::async_trait;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingTransport {
        calls: Rc<Cell<usize>>,
    }

    #[async_trait(?Send)]
    impl LlmTransport for CountingTransport {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(r#"{"position": "Staff SRE", "company": "Massive Dynamic", "location": "Boston"}"#.to_string())
        }
    }

    fn pipeline_with_llm() -> (ExtractionPipeline, Rc<Cell<usize>>) {
        let config = AutofillConfig::default();
        let calls = Rc::new(Cell::new(0));
        let llm = LlmFallback::new(Box::new(CountingTransport { calls: Rc::clone(&calls) }), &config);
        (ExtractionPipeline::new(config).with_llm(llm), calls)
    }

    const JSON_LD_PAGE: &str = r#"<html><head><title>Careers</title>
        <script type="application/ld+json">{"@type": "JobPosting", "title": "Rust Engineer",
          "hiringOrganization": {"name": "Ferrous Systems"},
          "jobLocation": {"address": {"addressLocality": "Berlin", "addressCountry": "DE"}},
          "baseSalary": {"currency": "EUR", "value": {"minValue": 80000, "maxValue": 100000, "unitText": "YEAR"}}}
        </script></head><body><h1>Rust Engineer</h1><p>Location: Remote</p></body></html>"#;

    #[tokio::test]
    async fn test_structured_page_skips_llm() {
        let (pipeline, calls) = pipeline_with_llm();
        let page = PageContent::new(JSON_LD_PAGE, "https://jobs.lever.co/ferrous/1");
        let record = pipeline.extract(&page).await;

        assert_eq!(record.value(JobField::Position), Some("Rust Engineer"));
        assert_eq!(record.value(JobField::Company), Some("Ferrous Systems"));
        assert_eq!(record.value(JobField::Location), Some("Berlin, DE"));
        assert_eq!(record.value(JobField::Salary), Some("EUR 80,000 - 100,000 per year"));
        assert_eq!(record.fields[&JobField::Location].source, "json-ld");
        assert_eq!(record.platform, Platform::Lever);
        assert!(!record.used_llm);
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_weak_page_asks_llm_once() {
        let (pipeline, calls) = pipeline_with_llm();
        let html = "<html><head><title>Open role</title></head><body><p>Great team, great snacks.</p></body></html>";
        let page = PageContent::new(html, "https://example.com/jobs/9");

        let record = pipeline.extract(&page).await;
        assert!(record.used_llm);
        assert_eq!(record.value(JobField::Company), Some("Massive Dynamic"));
        assert_eq!(record.fields[&JobField::Company].source, "llm");
        assert_eq!(record.platform, Platform::Unknown);

        pipeline.extract(&page).await;
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_without_llm_title_fills_gaps() {
        let pipeline = ExtractionPipeline::new(AutofillConfig::default());
        let html = "<html><head><title>Support Specialist - Vandelay Industries</title></head><body><p>Apply below.</p></body></html>";
        let record = pipeline.extract(&PageContent::new(html, "https://example.com")).await;
        assert!(!record.used_llm);
        assert_eq!(record.value(JobField::Position), Some("Support Specialist"));
        assert_eq!(record.value(JobField::Company), Some("Vandelay Industries"));
        assert_eq!(record.fields[&JobField::Company].source, "page-title");
    }

    #[test]
    fn test_needs_llm_rules() {
        let pipeline = ExtractionPipeline::new(AutofillConfig::default());
        let strong = |v: &str| FieldResult {
            value: v.to_string(),
            source: "json-ld",
            confidence: 0.95,
            weighted: 0.95,
        };
        let mut fields = AggregatedFields::new();
        assert!(pipeline.needs_llm(&fields));

        fields.insert(JobField::Position, strong("Engineer"));
        assert!(pipeline.needs_llm(&fields));

        fields.insert(JobField::Company, strong("Acme"));
        assert!(!pipeline.needs_llm(&fields));

        fields.get_mut(&JobField::Company).unwrap().confidence = 0.4;
        assert!(pipeline.needs_llm(&fields));
    }
}
