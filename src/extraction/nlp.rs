//! Phrase-template heuristics over the main content.
//!
//! Recruiting copy is formulaic: "Acme is hiring a Data Engineer", "Join
//! Acme as a Designer", "We're looking for a Product Manager". The templates
//! below read those sentences; remote and hybrid wording fills location.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractionCandidate, ExtractionStrategy, FieldCandidates, JobField, PageContent};

pub const NLP_SOURCE: &str = "nlp";

const TEMPLATE_CONFIDENCE: f64 = 0.7;
const LOOKING_FOR_CONFIDENCE: f64 = 0.6;
const HEADLINE_CONFIDENCE: f64 = 0.65;
const WORK_MODE_CONFIDENCE: f64 = 0.5;

const ROLE_END: &str = r"(?:\s+(?:to|who|with|in|for|at|and|on)\b|[.,;:!?\n]|$)";

static HIRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*){{0,3}})\s+is\s+(?:hiring|looking\s+for|seeking)\s+(?:an?\s+)?([A-Za-z][\w/&+ -]{{2,60}}?){ROLE_END}"
    ))
    .expect("static regex")
});
static JOIN_AS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b[Jj]oin\s+([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*){{0,3}})\s+as\s+(?:an?\s+)?([A-Za-z][\w/&+ -]{{2,60}}?){ROLE_END}"
    ))
    .expect("static regex")
});
static LOOKING_FOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\bwe(?:'re|\s+are)\s+(?:looking\s+for|hiring|seeking)\s+(?:an?\s+)?(?:talented\s+|experienced\s+|passionate\s+)?([a-z][\w/&+ -]{{2,60}}?){ROLE_END}"
    ))
    .expect("static regex")
});
static HEADLINE_AT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][\w/&+ ,-]{2,60}?)\s+at\s+([A-Z][\w&.' -]{1,40})$").expect("static regex"));
static HYBRID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bhybrid\b").expect("static regex"));
static REMOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:fully\s+remote|remote[- ]first|100%\s+remote|work\s+(?:from\s+home|remotely)|remote\s+(?:role|position|job|work))\b")
        .expect("static regex")
});

/// Words that open a sentence but never name a company.
const NOT_A_COMPANY: &[&str] = &["we", "our team", "the team", "this role", "you", "who", "the company"];

fn push_company(out: &mut FieldCandidates, company: &str, confidence: f64) {
    let company = company.trim();
    if !NOT_A_COMPANY.contains(&company.to_lowercase().as_str()) {
        out.push(JobField::Company, ExtractionCandidate::new(company, NLP_SOURCE, confidence));
    }
}

pub fn nlp_candidates(text: &str) -> FieldCandidates {
    let mut out = FieldCandidates::new();

    for re in [&*HIRING, &*JOIN_AS] {
        if let Some(caps) = re.captures(text) {
            push_company(&mut out, &caps[1], TEMPLATE_CONFIDENCE);
            out.push(JobField::Position, ExtractionCandidate::new(&caps[2], NLP_SOURCE, TEMPLATE_CONFIDENCE));
        }
    }

    if let Some(caps) = LOOKING_FOR.captures(text) {
        out.push(JobField::Position, ExtractionCandidate::new(&caps[1], NLP_SOURCE, LOOKING_FOR_CONFIDENCE));
    }

    if let Some(headline) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
        if let Some(caps) = HEADLINE_AT.captures(headline) {
            out.push(JobField::Position, ExtractionCandidate::new(&caps[1], NLP_SOURCE, HEADLINE_CONFIDENCE));
            push_company(&mut out, &caps[2], HEADLINE_CONFIDENCE);
        }
    }

    let mode = if HYBRID.is_match(text) {
        Some("Hybrid")
    } else if REMOTE.is_match(text) {
        Some("Remote")
    } else {
        None
    };
    if let Some(mode) = mode {
        out.push(JobField::Location, ExtractionCandidate::new(mode, NLP_SOURCE, WORK_MODE_CONFIDENCE));
    }

    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NlpStrategy;

#[async_trait(?Send)]
impl ExtractionStrategy for NlpStrategy {
    fn name(&self) -> &'static str {
        NLP_SOURCE
    }

    async fn extract(&self, page: &PageContent) -> FieldCandidates {
        nlp_candidates(page.best_text())
    }
}
