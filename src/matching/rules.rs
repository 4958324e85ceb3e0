//! User-defined matching rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AutofillError, Result};

/// Rule as the user stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRuleSpec {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Regex source, tested case-insensitively against the control's
    /// combined identifying text.
    pub pattern: String,
    /// Field type reported for a hit.
    pub name: String,
    pub profile_path: String,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct CustomRule {
    pub name: String,
    pub profile_path: String,
    regex: Regex,
}

impl CustomRule {
    pub fn compile(spec: &CustomRuleSpec) -> Result<Self> {
        let regex = Regex::new(&format!("(?i){}", spec.pattern)).map_err(|source| {
            AutofillError::InvalidPattern {
                rule: spec.name.clone(),
                source,
            }
        })?;
        Ok(Self {
            name: spec.name.clone(),
            profile_path: spec.profile_path.clone(),
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        !text.is_empty() && self.regex.is_match(text)
    }
}

/// Compile the enabled rules, skipping (and logging) any with a bad pattern.
pub fn compile_rules(specs: &[CustomRuleSpec]) -> Vec<CustomRule> {
    specs
        .iter()
        .filter(|s| s.enabled)
        .filter_map(|spec| match CustomRule::compile(spec) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!(rule = %spec.name, error = %e, "skipping custom rule");
                None
            }
        })
        .collect()
}
