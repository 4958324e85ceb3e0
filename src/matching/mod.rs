//! Field identification.
//!
//! Two matchers share the catalog: the certainty-staged matcher (fixed
//! certainty per strategy, auditable) and the multi-signal scorer (graded
//! confidence for unfamiliar markup). The confirmation resolver and option
//! chooser run after either.

mod confirm;
mod options;
mod rules;
mod scorer;
mod semantic;
mod staged;

pub use confirm::*;
pub use options::*;
pub use rules::*;
pub use scorer::*;
pub use semantic::*;
pub use staged::*;

use serde::{Deserialize, Serialize};

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchSource {
    CustomRule,
    Enhanced,
    Autocomplete,
    DataAttribute,
    InputType,
    DirectAttributes,
    Label,
    ParentText,
    Placeholder,
    Confirmation,
    Scorer,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomRule => "custom-rule",
            Self::Enhanced => "enhanced",
            Self::Autocomplete => "autocomplete",
            Self::DataAttribute => "data-attribute",
            Self::InputType => "input-type",
            Self::DirectAttributes => "direct-attributes",
            Self::Label => "label",
            Self::ParentText => "parent-text",
            Self::Placeholder => "placeholder",
            Self::Confirmation => "confirmation",
            Self::Scorer => "scorer",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which matcher a call site consults. Results are never merged: the
/// combined mode asks the scorer only when the staged matcher found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    Staged,
    Scored,
    #[default]
    StagedThenScored,
}

/// Best answer for one control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub field_type: String,
    /// 0.0-1.0. Scorer confidences are divided by 100.
    pub certainty: f64,
    pub source: MatchSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
    pub auto_check: bool,
    pub is_confirm: bool,
}
