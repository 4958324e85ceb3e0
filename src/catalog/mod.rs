//! Field-type catalog: what each semantic field looks like in markup.
//!
//! Definitions are written as plain pattern strings in [`definitions`] and
//! compiled once into [`FieldTypeDefinition`]s. Nothing mutates a catalog
//! after it is built.

mod autocomplete;
mod definitions;

pub use autocomplete::*;
pub use definitions::BUILTIN_FIELDS;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::dom::{SignalBundle, SignalSource};

/// Source form of a field definition.
///
/// `attribute` patterns apply to `id`, `name`, `formcontrolname` and the
/// `data-test` family; `text` patterns apply to the label, ARIA label and
/// placeholder. `data_test` adds vendor-specific automation ids on top.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub weight: f64,
    pub attribute: &'static [&'static str],
    pub text: &'static [&'static str],
    pub data_test: &'static [&'static str],
    pub negative: &'static [&'static str],
    pub requires: &'static [&'static str],
    pub context_clues: &'static [&'static str],
    pub input_types: &'static [&'static str],
    pub profile_path: &'static str,
    pub auto_check: bool,
}

impl FieldSpec {
    pub const EMPTY: FieldSpec = FieldSpec {
        key: "",
        weight: 1.0,
        attribute: &[],
        text: &[],
        data_test: &[],
        negative: &[],
        requires: &[],
        context_clues: &[],
        input_types: &[],
        profile_path: "",
        auto_check: false,
    };
}

/// Compiled definition of one semantic field.
#[derive(Debug, Clone)]
pub struct FieldTypeDefinition {
    pub key: &'static str,
    pub weight: f64,
    pub patterns: Vec<(SignalSource, Vec<Regex>)>,
    pub negative_patterns: Vec<Regex>,
    pub requires_patterns: Vec<Regex>,
    pub context_clues: &'static [&'static str],
    pub input_types: &'static [&'static str],
    pub profile_path: &'static str,
    pub auto_check: bool,
}

fn compile(key: &str, sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .filter_map(|src| match Regex::new(&format!("(?i){src}")) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(field_type = key, pattern = *src, error = %e, "skipping invalid field pattern");
                None
            }
        })
        .collect()
}

impl FieldTypeDefinition {
    pub fn compile(spec: &FieldSpec) -> Self {
        let attribute = compile(spec.key, spec.attribute);
        let text = compile(spec.key, spec.text);
        let mut data_test = compile(spec.key, spec.data_test);
        data_test.extend(attribute.iter().cloned());

        let mut patterns = Vec::new();
        if !attribute.is_empty() {
            patterns.push((SignalSource::Id, attribute.clone()));
            patterns.push((SignalSource::FormControlName, attribute.clone()));
            patterns.push((SignalSource::Name, attribute));
        }
        if !text.is_empty() {
            patterns.push((SignalSource::Label, text.clone()));
            patterns.push((SignalSource::AriaLabel, text.clone()));
            patterns.push((SignalSource::Placeholder, text));
        }
        if !data_test.is_empty() {
            patterns.push((SignalSource::DataTest, data_test));
        }

        Self {
            key: spec.key,
            weight: spec.weight,
            patterns,
            negative_patterns: compile(spec.key, spec.negative),
            requires_patterns: compile(spec.key, spec.requires),
            context_clues: spec.context_clues,
            input_types: spec.input_types,
            profile_path: spec.profile_path,
            auto_check: spec.auto_check,
        }
    }

    pub fn patterns_for(&self, source: SignalSource) -> &[Regex] {
        self.patterns
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, p)| p.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `text` (one signal's value) hits this field's patterns for `source`.
    pub fn matches_source(&self, source: SignalSource, text: &str) -> bool {
        !text.is_empty() && self.patterns_for(source).iter().any(|re| re.is_match(text))
    }

    pub fn requires_satisfied(&self, combined: &str) -> bool {
        self.requires_patterns.is_empty() || self.requires_patterns.iter().any(|re| re.is_match(combined))
    }

    pub fn negative_hit(&self, combined: &str) -> bool {
        self.negative_patterns.iter().any(|re| re.is_match(combined))
    }

    /// Passes the required-pattern gate and trips no negative pattern.
    pub fn is_eligible(&self, combined: &str) -> bool {
        self.requires_satisfied(combined) && !self.negative_hit(combined)
    }

    pub fn context_hit(&self, bundle: &SignalBundle) -> bool {
        !bundle.context.is_empty() && self.context_clues.iter().any(|c| bundle.context.contains(c))
    }

    pub fn accepts_input_type(&self, input_type: &str) -> bool {
        self.input_types.iter().any(|t| *t == input_type)
    }
}

/// Ordered set of field definitions. Order decides ties between equally
/// strong matches, so more specific fields come first.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    definitions: Vec<FieldTypeDefinition>,
    index: HashMap<&'static str, usize>,
}

static BUILTIN: Lazy<Arc<FieldCatalog>> = Lazy::new(|| Arc::new(FieldCatalog::from_specs(BUILTIN_FIELDS)));

impl FieldCatalog {
    /// Build from specs. A duplicate key keeps its first definition.
    pub fn from_specs(specs: &[FieldSpec]) -> Self {
        let mut definitions = Vec::with_capacity(specs.len());
        let mut index = HashMap::new();
        for spec in specs {
            if index.contains_key(spec.key) {
                warn!(field_type = spec.key, "duplicate field type ignored");
                continue;
            }
            index.insert(spec.key, definitions.len());
            definitions.push(FieldTypeDefinition::compile(spec));
        }
        Self { definitions, index }
    }

    pub fn builtin() -> Arc<FieldCatalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn get(&self, key: &str) -> Option<&FieldTypeDefinition> {
        self.index.get(key).map(|&i| &self.definitions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldTypeDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
