//! Accessibility-tree strategy: ARIA labels, headings and the main landmark.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::dom::{element_text, normalize};

use super::{ExtractionCandidate, ExtractionStrategy, FieldCandidates, JobField, PageContent};

pub const ARIA_SOURCE: &str = "aria";

const LABELLED_CONFIDENCE: f64 = 0.8;
const HEADING_CONFIDENCE: f64 = 0.75;
const MAIN_HEADING_CONFIDENCE: f64 = 0.7;
const MAX_VALUE_CHARS: usize = 150;

static LABELLED: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[aria-label], [aria-labelledby], [aria-describedby]").expect("static selector")
});
static HEADINGS: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"[role="heading"]"#).expect("static selector"));
static MAIN: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"[role="main"], main"#).expect("static selector"));
static MAIN_HEADINGS: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2").expect("static selector"));

/// Keyword sets a label is classified by, most specific field first.
const FIELD_KEYWORDS: &[(JobField, &[&str])] = &[
    (JobField::Salary, &["salary", "compensation", "pay range", "pay rate"]),
    (JobField::Location, &["location", "office", "workplace", "where you'll work"]),
    (JobField::Company, &["company", "employer", "organization", "organisation", "hiring"]),
    (JobField::Position, &["job title", "position", "role", "job name"]),
];

static JOB_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(engineer|developer|manager|designer|analyst|scientist|specialist|director|lead|intern|architect|consultant|coordinator|administrator|assistant|associate|representative|officer|technician|nurse|accountant|executive|head of|vp|writer|editor|recruiter|programmer|strategist|researcher|advisor|agent|operator|supervisor|sre|devops)\b",
    )
    .expect("static regex")
});
static CHROME_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(apply|sign in|log in|login|search|menu|cookies?|careers?|jobs|home|similar|share|save|navigation|filter|results|privacy)\b",
    )
    .expect("static regex")
});

/// Heading text that reads like a job title rather than page chrome.
pub fn is_title_like(text: &str) -> bool {
    let len = text.chars().count();
    (3..=120).contains(&len) && JOB_KEYWORD.is_match(text) && !CHROME_WORD.is_match(text)
}

fn classify_label(label: &str) -> Option<JobField> {
    let label = normalize(label);
    FIELD_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| label.contains(w)))
        .map(|(field, _)| *field)
}

fn referenced_text(document: &Html, ids: &str) -> String {
    ids.split_whitespace()
        .filter_map(|id| {
            let selector = Selector::parse(&format!(r#"[id="{id}"]"#)).ok()?;
            document.select(&selector).next().map(element_text)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn usable(value: &str) -> bool {
    !value.is_empty() && value.chars().count() <= MAX_VALUE_CHARS
}

fn selector_hint(element: ElementRef<'_>) -> String {
    let el = element.value();
    match el.id() {
        Some(id) => format!("{}#{}", el.name(), id),
        None => el.name().to_string(),
    }
}

pub fn aria_candidates(document: &Html) -> FieldCandidates {
    let mut out = FieldCandidates::new();

    for element in document.select(&LABELLED) {
        let el = element.value();
        let value = element_text(element);
        let labels = [
            el.attr("aria-label").map(str::to_string),
            el.attr("aria-labelledby").map(|ids| referenced_text(document, ids)),
            el.attr("aria-describedby").map(|ids| referenced_text(document, ids)),
        ];
        for label in labels.into_iter().flatten() {
            let Some(field) = classify_label(&label) else {
                continue;
            };
            // A label that is its own content carries no value.
            if !usable(&value) || normalize(&value) == normalize(&label) {
                continue;
            }
            out.push(
                field,
                ExtractionCandidate::new(value.clone(), ARIA_SOURCE, LABELLED_CONFIDENCE)
                    .with_selector(selector_hint(element)),
            );
            break;
        }
    }

    for heading in document.select(&HEADINGS) {
        let text = element_text(heading);
        if is_title_like(&text) {
            let level_one = heading.value().attr("aria-level").map_or(true, |l| l.trim() == "1");
            let confidence = if level_one { HEADING_CONFIDENCE } else { HEADING_CONFIDENCE - 0.1 };
            out.push(
                JobField::Position,
                ExtractionCandidate::new(text, ARIA_SOURCE, confidence).with_selector(r#"[role="heading"]"#),
            );
        }
    }

    if let Some(main) = document.select(&MAIN).next() {
        if let Some(text) = main
            .select(&MAIN_HEADINGS)
            .map(element_text)
            .find(|t| is_title_like(t))
        {
            out.push(
                JobField::Position,
                ExtractionCandidate::new(text, ARIA_SOURCE, MAIN_HEADING_CONFIDENCE).with_selector("main h1"),
            );
        }
    }

    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AriaStrategy;

#[async_trait(?Send)]
impl ExtractionStrategy for AriaStrategy {
    fn name(&self) -> &'static str {
        ARIA_SOURCE
    }

    async fn extract(&self, page: &PageContent) -> FieldCandidates {
        aria_candidates(&page.document)
    }
}
