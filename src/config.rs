//! Tunables for matching, filling and job extraction.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AutofillError, Result};

/// Page-session configuration. Every field has a default so partial JSON
/// documents (as sent over FFI) deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutofillConfig {
    /// Floor for the semantic detector's own confidence before its hit is used.
    pub enhanced_min_confidence: f64,
    /// Minimum scorer confidence (0-100) before a field is filled.
    pub min_confidence: f64,
    /// Delay between successive field commits.
    pub fill_delay_ms: u64,
    /// Aggregate confidence below which the LLM fallback runs.
    pub llm_threshold: f64,
    /// Per-field confidence below which a critical field counts as weak.
    pub critical_field_floor: f64,
    pub llm_max_chars: usize,
    pub llm_cache_ttl_secs: u64,
    pub llm_cache_capacity: usize,
    pub llm_timeout_ms: u64,
    /// Source name -> aggregation weight. Unknown sources weigh 0.5.
    pub source_weights: HashMap<String, f64>,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            enhanced_min_confidence: 0.6,
            min_confidence: 30.0,
            fill_delay_ms: 50,
            llm_threshold: 0.6,
            critical_field_floor: 0.5,
            llm_max_chars: 8000,
            llm_cache_ttl_secs: 24 * 60 * 60,
            llm_cache_capacity: 100,
            llm_timeout_ms: 20_000,
            source_weights: default_source_weights(),
        }
    }
}

fn default_source_weights() -> HashMap<String, f64> {
    [
        ("json-ld", 1.0),
        ("llm", 0.9),
        ("aria", 0.85),
        ("regex", 0.7),
        ("nlp", 0.6),
        ("page-title", 0.5),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

impl AutofillConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(AutofillError::Config(format!("{name} must be within [0, 1], got {v}")))
            }
        };
        unit("enhancedMinConfidence", self.enhanced_min_confidence)?;
        unit("llmThreshold", self.llm_threshold)?;
        unit("criticalFieldFloor", self.critical_field_floor)?;
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(AutofillError::Config(format!(
                "minConfidence must be within [0, 100], got {}",
                self.min_confidence
            )));
        }
        if self.llm_cache_capacity == 0 {
            return Err(AutofillError::Config("llmCacheCapacity must be positive".into()));
        }
        if let Some((name, w)) = self.source_weights.iter().find(|(_, w)| **w < 0.0) {
            return Err(AutofillError::Config(format!("negative weight {w} for source {name}")));
        }
        Ok(())
    }

    pub fn source_weight(&self, source: &str) -> f64 {
        self.source_weights.get(source).copied().unwrap_or(0.5)
    }

    pub fn fill_delay(&self) -> Duration {
        Duration::from_millis(self.fill_delay_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn llm_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.llm_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AutofillConfig::from_json(r#"{"minConfidence": 45, "fillDelayMs": 10}"#).unwrap();
        assert_eq!(config.min_confidence, 45.0);
        assert_eq!(config.fill_delay(), Duration::from_millis(10));
        assert_eq!(config.llm_max_chars, 8000);
        assert_eq!(config.source_weight("json-ld"), 1.0);
        assert_eq!(config.source_weight("something-else"), 0.5);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(AutofillConfig::from_json(r#"{"llmThreshold": 1.5}"#).is_err());
        assert!(AutofillConfig::from_json(r#"{"minConfidence": -1}"#).is_err());
        assert!(AutofillConfig::from_json(r#"{"llmCacheCapacity": 0}"#).is_err());
    }
}
