//! schema.org `JobPosting` extraction from JSON-LD script blocks.
//!
//! Each `<script type="application/ld+json">` is parsed on its own, so one
//! malformed block never hides a valid one. `@graph` containers and arrays
//! are searched recursively.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::dom::{collapse_whitespace, element_text};

use super::{ExtractionCandidate, ExtractionStrategy, FieldCandidates, JobField, PageContent};

pub const JSON_LD_SOURCE: &str = "json-ld";
pub const JSON_LD_CONFIDENCE: f64 = 0.95;

const JOB_POSTING: &str = "JobPosting";
const SCRIPT_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

static SCRIPTS: Lazy<Selector> = Lazy::new(|| Selector::parse(SCRIPT_SELECTOR).expect("static selector"));

fn strip_schema_prefix(t: &str) -> &str {
    t.strip_prefix("https://schema.org/")
        .or_else(|| t.strip_prefix("http://schema.org/"))
        .unwrap_or(t)
}

fn has_type(obj: &Map<String, Value>, wanted: &str) -> bool {
    match obj.get("@type") {
        Some(Value::String(s)) => strip_schema_prefix(s) == wanted,
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| strip_schema_prefix(t) == wanted),
        _ => false,
    }
}

fn collect_postings(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Object(obj) => {
            if let Some(Value::Array(graph)) = obj.get("@graph") {
                for item in graph {
                    collect_postings(item, out);
                }
            }
            if has_type(obj, JOB_POSTING) {
                out.push(value.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_postings(item, out);
            }
        }
        _ => {}
    }
}

/// Every `JobPosting` object on the page, in document order.
pub fn find_job_postings(document: &Html) -> Vec<Value> {
    let mut postings = Vec::new();
    for (index, script) in document.select(&SCRIPTS).enumerate() {
        let text = script.text().collect::<String>();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(json) => collect_postings(&json, &mut postings),
            Err(e) => warn!(block = index, error = %e, "skipping malformed JSON-LD block"),
        }
    }
    postings
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(collapse_whitespace(s)).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj.get("name").and_then(text_of),
        _ => None,
    }
}

pub fn extract_title(posting: &Value) -> Option<String> {
    posting.get("title").and_then(text_of)
}

/// `hiringOrganization` as a string or `{name}`.
pub fn extract_organization(posting: &Value) -> Option<String> {
    match posting.get("hiringOrganization")? {
        Value::Array(orgs) => orgs.iter().find_map(text_of),
        other => text_of(other),
    }
}

fn format_address(address: &Value) -> Option<String> {
    match address {
        Value::String(_) => text_of(address),
        Value::Object(obj) => {
            let parts: Vec<String> = ["addressLocality", "addressRegion", "addressCountry"]
                .iter()
                .filter_map(|key| obj.get(*key).and_then(text_of))
                .collect();
            if parts.is_empty() {
                obj.get("streetAddress").and_then(text_of)
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

fn format_place(place: &Value) -> Option<String> {
    match place {
        Value::String(_) => text_of(place),
        Value::Object(obj) => obj
            .get("address")
            .and_then(format_address)
            .or_else(|| obj.get("name").and_then(text_of)),
        _ => None,
    }
}

/// `jobLocation` (string, `Place`, or array of either). Telecommute
/// postings report `Remote`.
pub fn extract_location(posting: &Value) -> Option<String> {
    let physical = match posting.get("jobLocation") {
        Some(Value::Array(places)) => {
            let all: Vec<String> = places.iter().filter_map(format_place).collect();
            (!all.is_empty()).then(|| all.join("; "))
        }
        Some(place) => format_place(place),
        None => None,
    };

    let remote = posting
        .get("jobLocationType")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("TELECOMMUTE"));

    match (physical, remote) {
        (Some(place), true) => Some(format!("{place} (Remote)")),
        (None, true) => Some("Remote".to_string()),
        (physical, false) => physical,
    }
}

fn format_amount(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            let amount = n.as_f64()?;
            if amount.fract() == 0.0 {
                Some(group_thousands(amount as u64))
            } else {
                Some(format!("{amount:.2}"))
            }
        }
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `baseSalary` as a plain value or a `MonetaryAmount`.
pub fn extract_salary(posting: &Value) -> Option<String> {
    let salary = posting.get("baseSalary")?;
    let Value::Object(amount) = salary else {
        return format_amount(salary);
    };

    let currency = amount.get("currency").and_then(Value::as_str).unwrap_or("").trim();
    let (range, unit) = match amount.get("value")? {
        Value::Object(quantity) => {
            let min = quantity.get("minValue").and_then(format_amount);
            let max = quantity.get("maxValue").and_then(format_amount);
            let exact = quantity.get("value").and_then(format_amount);
            let range = match (min, max, exact) {
                (Some(min), Some(max), _) if min != max => format!("{min} - {max}"),
                (Some(v), _, _) | (None, Some(v), _) | (None, None, Some(v)) => v,
                _ => return None,
            };
            let unit = quantity
                .get("unitText")
                .or_else(|| amount.get("unitText"))
                .and_then(Value::as_str)
                .map(str::to_lowercase);
            (range, unit)
        }
        other => (
            format_amount(other)?,
            amount.get("unitText").and_then(Value::as_str).map(str::to_lowercase),
        ),
    };

    let mut out = if currency.is_empty() {
        range
    } else {
        format!("{currency} {range}")
    };
    if let Some(unit) = unit.filter(|u| !u.is_empty()) {
        out.push_str(" per ");
        out.push_str(&unit);
    }
    Some(out)
}

/// Description with markup stripped. Entity-escaped HTML is unwrapped too.
pub fn extract_description(posting: &Value) -> Option<String> {
    let raw = posting.get("description")?.as_str()?;
    let mut text = element_text(Html::parse_fragment(raw).root_element());
    if text.contains('<') && text.contains('>') {
        text = element_text(Html::parse_fragment(&text).root_element());
    }
    Some(text).filter(|t| !t.is_empty())
}

/// Candidates from the first posting on the page that has a title, else
/// from the first posting.
pub fn posting_candidates(postings: &[Value]) -> FieldCandidates {
    let mut out = FieldCandidates::new();
    let Some(posting) = postings
        .iter()
        .find(|p| extract_title(p).is_some())
        .or_else(|| postings.first())
    else {
        return out;
    };

    let fields = [
        (JobField::Position, extract_title(posting)),
        (JobField::Company, extract_organization(posting)),
        (JobField::Location, extract_location(posting)),
        (JobField::Salary, extract_salary(posting)),
        (JobField::JobDescription, extract_description(posting)),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            out.push(
                field,
                ExtractionCandidate::new(value, JSON_LD_SOURCE, JSON_LD_CONFIDENCE).with_selector(SCRIPT_SELECTOR),
            );
        }
    }
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLdStrategy;

#[async_trait(?Send)]
impl ExtractionStrategy for JsonLdStrategy {
    fn name(&self) -> &'static str {
        JSON_LD_SOURCE
    }

    async fn extract(&self, page: &PageContent) -> FieldCandidates {
        let postings = find_job_postings(&page.document);
        debug!(count = postings.len(), "JSON-LD job postings");
        posting_candidates(&postings)
    }
}
