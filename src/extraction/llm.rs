//! LLM fallback for pages the cheap strategies could not read.
//!
//! The model sees at most `llm_max_chars` of page text. Answers are cached by
//! a rolling hash of the text's opening, so revisiting a page (or the same
//! posting on a mirror) does not pay for a second call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AutofillConfig;
use crate::error::{AutofillError, Result};

use super::{ExtractionCandidate, ExtractionStrategy, FieldCandidates, JobField, PageContent};

pub const LLM_SOURCE: &str = "llm";
pub const LLM_CONFIDENCE: f64 = 0.85;
/// Characters of page text that make up the cache key.
pub const CACHE_KEY_CHARS: usize = 500;

const EVICT_FRACTION: f64 = 0.2;
const DEFAULT_MODEL: &str = "gpt-4o-mini";

static FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("static regex"));

/// Sends a prompt to a language model and returns its raw reply.
#[async_trait(?Send)]
pub trait LlmTransport {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completions endpoint.
pub struct HttpLlmTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpLlmTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Reply text from a chat-completions body, a `{content}`/`{text}` body, or
/// the raw body when it is not JSON at all.
fn reply_text(body: String) -> String {
    let Ok(value) = serde_json::from_str::<Value>(&body) else {
        return body;
    };
    let text = value
        .pointer("/choices/0/message/content")
        .or_else(|| value.pointer("/content/0/text"))
        .or_else(|| value.get("content"))
        .or_else(|| value.get("text"))
        .and_then(Value::as_str);
    match text {
        Some(text) => text.to_string(),
        None => body,
    }
}

#[async_trait(?Send)]
impl LlmTransport for HttpLlmTransport {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [{"role": "user", "content": prompt}],
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AutofillError::Transport(format!("status {}: {}", status.as_u16(), text)));
        }
        Ok(reply_text(response.text().await?))
    }
}

/// Java-style 31-multiplier hash over the first [`CACHE_KEY_CHARS`] chars.
pub fn rolling_hash(text: &str) -> u32 {
    text.chars()
        .take(CACHE_KEY_CHARS)
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(c as u32))
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        "Extract the job posting details from the page text below. Reply with only a JSON object \
         with the keys \"position\", \"company\", \"location\", \"salary\". Use null for anything \
         the text does not state.\n\n---\n{text}\n---"
    )
}

/// First balanced `{...}` in `text`, honouring JSON strings.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Candidates from a model reply: a fenced block or the first JSON object.
/// Replies that are not an object, or name no known field, yield nothing.
pub fn parse_llm_response(raw: &str) -> Option<FieldCandidates> {
    let body = FENCED
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .and_then(first_object)
        .or_else(|| first_object(raw))?;

    let object: Map<String, Value> = match serde_json::from_str(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return None,
        Err(e) => {
            debug!(error = %e, "LLM reply is not JSON");
            return None;
        }
    };

    let mut out = FieldCandidates::new();
    for (key, value) in &object {
        let Some(field) = JobField::from_key(key) else {
            continue;
        };
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("unknown") {
            continue;
        }
        out.push(field, ExtractionCandidate::new(text, LLM_SOURCE, LLM_CONFIDENCE));
    }
    (!out.is_empty()).then_some(out)
}

struct CacheEntry {
    stored: Instant,
    candidates: FieldCandidates,
}

/// Model-backed strategy with a bounded, expiring answer cache.
pub struct LlmFallback {
    transport: Box<dyn LlmTransport>,
    cache: RefCell<HashMap<u32, CacheEntry>>,
    max_chars: usize,
    timeout: Duration,
    ttl: Duration,
    capacity: usize,
}

impl LlmFallback {
    pub fn new(transport: Box<dyn LlmTransport>, config: &AutofillConfig) -> Self {
        Self {
            transport,
            cache: RefCell::new(HashMap::new()),
            max_chars: config.llm_max_chars,
            timeout: config.llm_timeout(),
            ttl: config.llm_cache_ttl(),
            capacity: config.llm_cache_capacity,
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    fn cached(&self, key: u32) -> Option<FieldCandidates> {
        let mut cache = self.cache.borrow_mut();
        let entry = cache.get(&key)?;
        if entry.stored.elapsed() < self.ttl {
            return Some(entry.candidates.clone());
        }
        cache.remove(&key);
        None
    }

    fn store(&self, key: u32, candidates: FieldCandidates) {
        let mut cache = self.cache.borrow_mut();
        cache.insert(
            key,
            CacheEntry {
                stored: Instant::now(),
                candidates,
            },
        );
        if cache.len() > self.capacity {
            let evict = ((cache.len() as f64 * EVICT_FRACTION).ceil() as usize).max(1);
            let mut by_age: Vec<(Instant, u32)> = cache.iter().map(|(k, e)| (e.stored, *k)).collect();
            by_age.sort();
            for (_, old) in by_age.into_iter().take(evict) {
                cache.remove(&old);
            }
            debug!(evicted = evict, remaining = cache.len(), "LLM cache trimmed");
        }
    }

    /// Ask the model about `text`, consulting the cache first.
    pub async fn extract_text(&self, text: &str) -> FieldCandidates {
        let text = truncate_chars(text.trim(), self.max_chars);
        if text.is_empty() {
            return FieldCandidates::new();
        }
        let key = rolling_hash(text);
        if let Some(hit) = self.cached(key) {
            debug!(key, "LLM cache hit");
            return hit;
        }

        let prompt = build_prompt(text);
        let reply = match tokio::time::timeout(self.timeout, self.transport.complete(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(error = %e, "LLM transport failed");
                return FieldCandidates::new();
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "LLM call timed out");
                return FieldCandidates::new();
            }
        };

        match parse_llm_response(&reply) {
            Some(candidates) => {
                info!(fields = candidates.len(), "LLM extraction");
                self.store(key, candidates.clone());
                candidates
            }
            None => {
                warn!("LLM reply had no usable fields");
                FieldCandidates::new()
            }
        }
    }
}

#[async_trait(?Send)]
impl ExtractionStrategy for LlmFallback {
    fn name(&self) -> &'static str {
        LLM_SOURCE
    }

    async fn extract(&self, page: &PageContent) -> FieldCandidates {
        self.extract_text(page.best_text()).await
    }
}
