//! Applicant profile schema and path resolution.
//!
//! Field definitions reference profile data through string paths such as
//! `personal.firstName` or `workHistory[0].company`. Resolution never fails:
//! any missing segment yields `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AutofillError, Result};

/// Path that resolves to the default cover letter (or the first one).
pub const DEFAULT_COVER_LETTER_PATH: &str = "coverLetters.default";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub personal: Personal,
    pub work_history: Vec<WorkEntry>,
    pub education: Vec<Education>,
    pub skills: Skills,
    pub cover_letters: Vec<CoverLetter>,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Personal {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub summary: Option<String>,
    pub pronouns: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkEntry {
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Education {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Skills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
    pub languages: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoverLetter {
    pub name: String,
    pub content: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub current_salary: Option<String>,
    pub expected_salary: Option<String>,
    pub notice_period: Option<String>,
    pub available_start_date: Option<String>,
    pub work_authorization: Option<String>,
    pub requires_sponsorship: Option<bool>,
    pub willing_to_relocate: Option<bool>,
    pub years_of_experience: Option<u32>,
}

/// One parsed path segment: a key plus an optional array index.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment<'p> {
    key: &'p str,
    index: Option<usize>,
}

fn parse_path(path: &str) -> Option<Vec<Segment<'_>>> {
    path.split('.')
        .map(|raw| match raw.find('[') {
            Some(open) => {
                let close = raw.rfind(']')?;
                if close != raw.len() - 1 || close <= open + 1 {
                    return None;
                }
                let index = raw[open + 1..close].parse().ok()?;
                Some(Segment { key: &raw[..open], index: Some(index) })
            }
            None if raw.is_empty() => None,
            None => Some(Segment { key: raw, index: None }),
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

impl Profile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AutofillError::Profile(e.to_string()))
    }

    /// Resolve a dot/bracket path to a fill value.
    pub fn resolve(&self, path: &str) -> Option<String> {
        if path == DEFAULT_COVER_LETTER_PATH {
            return self.default_cover_letter().map(|c| c.content.clone());
        }
        if path == "personal.fullName" {
            return self.personal.full_name();
        }

        let segments = parse_path(path)?;
        let root = serde_json::to_value(self).ok()?;
        let mut current = &root;
        for segment in &segments {
            current = current.get(segment.key)?;
            if let Some(index) = segment.index {
                current = current.get(index)?;
            }
        }
        scalar_to_string(current)
    }

    pub fn default_cover_letter(&self) -> Option<&CoverLetter> {
        self.cover_letters
            .iter()
            .find(|c| c.is_default)
            .or_else(|| self.cover_letters.first())
    }
}

impl Personal {
    /// Explicit full name, or first + last joined.
    pub fn full_name(&self) -> Option<String> {
        if let Some(name) = self.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}
