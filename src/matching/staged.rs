//! Certainty-staged matcher.
//!
//! Every stage runs and reports at most one hit with a fixed certainty. Hits
//! are stably sorted by certainty, so a weak signal never outranks a strong
//! one and equal certainties keep stage order.

use tracing::debug;

use crate::catalog::{field_for_autocomplete, FieldCatalog, FieldTypeDefinition};
use crate::dom::{SignalBundle, SignalSource};
use crate::profile::Profile;

use super::rules::CustomRule;
use super::semantic::{SemanticDetector, SemanticHit};
use super::{MatchCandidate, MatchSource};

pub const CERTAINTY_EXACT: f64 = 1.0;
pub const CERTAINTY_CUSTOM_RULE: f64 = 0.95;
pub const CERTAINTY_INPUT_TYPE: f64 = 0.9;
pub const CERTAINTY_ENHANCED: f64 = 0.85;
pub const CERTAINTY_DIRECT: f64 = 0.7;
pub const CERTAINTY_LABEL: f64 = 0.5;
pub const CERTAINTY_PARENT_TEXT: f64 = 0.3;
pub const CERTAINTY_PLACEHOLDER: f64 = 0.25;

/// Input types distinctive enough to identify a field on their own.
const DISTINCTIVE_INPUT_TYPES: &[&str] = &["email", "tel"];

const DIRECT_SOURCES: &[SignalSource] = &[
    SignalSource::Name,
    SignalSource::Id,
    SignalSource::FormControlName,
    SignalSource::DataTest,
];

/// One stage's raw hit, before profile values are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct StageHit {
    pub field_type: String,
    pub certainty: f64,
    pub source: MatchSource,
    pub profile_path: String,
    pub auto_check: bool,
}

impl StageHit {
    fn from_definition(def: &FieldTypeDefinition, certainty: f64, source: MatchSource) -> Self {
        Self {
            field_type: def.key.to_string(),
            certainty,
            source,
            profile_path: def.profile_path.to_string(),
            auto_check: def.auto_check,
        }
    }
}

pub struct StagedMatcher<'s> {
    catalog: &'s FieldCatalog,
    rules: &'s [CustomRule],
    semantic: Option<&'s SemanticDetector>,
    enhanced_floor: f64,
}

impl<'s> StagedMatcher<'s> {
    pub fn new(
        catalog: &'s FieldCatalog,
        rules: &'s [CustomRule],
        semantic: Option<&'s SemanticDetector>,
        enhanced_floor: f64,
    ) -> Self {
        Self {
            catalog,
            rules,
            semantic,
            enhanced_floor,
        }
    }

    /// Synchronous variant: the enhanced stage contributes only once the
    /// semantic detector is ready.
    pub fn match_bundle(&self, bundle: &SignalBundle, profile: &Profile) -> Option<MatchCandidate> {
        let semantic = self.semantic.and_then(|d| d.detect_if_ready(bundle));
        let hits = self.ranked_hits(bundle, semantic);
        self.decide(hits, profile)
    }

    /// Async variant: waits for the semantic detector before matching.
    pub async fn match_bundle_async(&self, bundle: &SignalBundle, profile: &Profile) -> Option<MatchCandidate> {
        let semantic = match self.semantic {
            Some(detector) => detector.detect(bundle).await,
            None => None,
        };
        let hits = self.ranked_hits(bundle, semantic);
        self.decide(hits, profile)
    }

    /// Every stage's hit, best first.
    pub fn ranked_hits(&self, bundle: &SignalBundle, semantic: Option<SemanticHit>) -> Vec<StageHit> {
        let combined = bundle.combined();
        let eligible: Vec<&FieldTypeDefinition> =
            self.catalog.iter().filter(|d| d.is_eligible(&combined)).collect();

        let mut hits: Vec<StageHit> = [
            self.custom_rule_stage(&combined),
            self.enhanced_stage(semantic),
            self.exact_stage(bundle, &eligible),
            self.input_type_stage(bundle, &eligible),
            self.direct_stage(bundle, &eligible),
            first_text_hit(&eligible, &bundle.label, CERTAINTY_LABEL, MatchSource::Label),
            first_text_hit(&eligible, &bundle.parent_text, CERTAINTY_PARENT_TEXT, MatchSource::ParentText),
            first_placeholder_hit(&eligible, &bundle.placeholder),
        ]
        .into_iter()
        .flatten()
        .collect();

        hits.sort_by(|a, b| b.certainty.total_cmp(&a.certainty));
        hits
    }

    fn decide(&self, hits: Vec<StageHit>, profile: &Profile) -> Option<MatchCandidate> {
        let top = hits.into_iter().next()?;
        let value = if top.auto_check || top.profile_path.is_empty() {
            None
        } else {
            profile.resolve(&top.profile_path)
        };
        debug!(
            field_type = %top.field_type,
            certainty = top.certainty,
            source = %top.source,
            has_value = value.is_some(),
            "staged match"
        );
        Some(MatchCandidate {
            field_type: top.field_type,
            certainty: top.certainty,
            source: top.source,
            value,
            profile_path: (!top.profile_path.is_empty()).then_some(top.profile_path),
            auto_check: top.auto_check,
            is_confirm: false,
        })
    }

    fn custom_rule_stage(&self, combined: &str) -> Option<StageHit> {
        let rule = self.rules.iter().find(|r| r.is_match(combined))?;
        Some(StageHit {
            field_type: rule.name.clone(),
            certainty: CERTAINTY_CUSTOM_RULE,
            source: MatchSource::CustomRule,
            profile_path: rule.profile_path.clone(),
            auto_check: false,
        })
    }

    fn enhanced_stage(&self, semantic: Option<SemanticHit>) -> Option<StageHit> {
        let hit = semantic.filter(|h| h.confidence >= self.enhanced_floor)?;
        let def = self.catalog.get(hit.field_type)?;
        Some(StageHit::from_definition(def, CERTAINTY_ENHANCED, MatchSource::Enhanced))
    }

    fn exact_stage(&self, bundle: &SignalBundle, eligible: &[&FieldTypeDefinition]) -> Option<StageHit> {
        if let Some(field) = field_for_autocomplete(&bundle.autocomplete) {
            if let Some(def) = eligible.iter().find(|d| d.key == field) {
                return Some(StageHit::from_definition(def, CERTAINTY_EXACT, MatchSource::Autocomplete));
            }
        }
        // A wrapper's test id describes a group; it counts as a direct attribute.
        if bundle.data_test.is_empty() || bundle.data_test_inherited {
            return None;
        }
        eligible
            .iter()
            .find(|d| {
                d.patterns_for(SignalSource::DataTest)
                    .iter()
                    .any(|re| re.is_match(&bundle.data_test))
            })
            .map(|d| StageHit::from_definition(d, CERTAINTY_EXACT, MatchSource::DataAttribute))
    }

    fn input_type_stage(&self, bundle: &SignalBundle, eligible: &[&FieldTypeDefinition]) -> Option<StageHit> {
        if !DISTINCTIVE_INPUT_TYPES.contains(&bundle.input_type.as_str()) {
            return None;
        }
        eligible
            .iter()
            .find(|d| d.accepts_input_type(&bundle.input_type))
            .map(|d| StageHit::from_definition(d, CERTAINTY_INPUT_TYPE, MatchSource::InputType))
    }

    fn direct_stage(&self, bundle: &SignalBundle, eligible: &[&FieldTypeDefinition]) -> Option<StageHit> {
        eligible
            .iter()
            .find(|d| {
                DIRECT_SOURCES
                    .iter()
                    .any(|&source| d.matches_source(source, bundle.get(source)))
            })
            .map(|d| StageHit::from_definition(d, CERTAINTY_DIRECT, MatchSource::DirectAttributes))
    }
}

fn first_text_hit(
    eligible: &[&FieldTypeDefinition],
    text: &str,
    certainty: f64,
    source: MatchSource,
) -> Option<StageHit> {
    eligible
        .iter()
        .find(|d| d.matches_source(SignalSource::Label, text))
        .map(|d| StageHit::from_definition(d, certainty, source))
}

fn first_placeholder_hit(eligible: &[&FieldTypeDefinition], placeholder: &str) -> Option<StageHit> {
    eligible
        .iter()
        .find(|d| d.matches_source(SignalSource::Placeholder, placeholder))
        .map(|d| StageHit::from_definition(d, CERTAINTY_PLACEHOLDER, MatchSource::Placeholder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AUTOCOMPLETE_TOKENS;
    use crate::dom::{extract_signals, ControlId, FormDocument};
    use crate::matching::{compile_rules, CustomRuleSpec, SemanticModel};
    use scraper::Html;

    fn bundle_for(html: &str) -> SignalBundle {
        let html = Html::parse_document(html);
        let doc = FormDocument::new(&html, 1);
        extract_signals(&doc, doc.control(ControlId(0)).unwrap())
    }

    fn profile() -> Profile {
        Profile::from_json(
            r#"{"personal": {"firstName": "Ada", "email": "a@b.com", "phone": "+1 555 0100"},
                "coverLetters": [{"name": "main", "content": "Dear hiring team"}]}"#,
        )
        .unwrap()
    }

    fn run(html: &str) -> Option<MatchCandidate> {
        let catalog = FieldCatalog::builtin();
        let matcher = StagedMatcher::new(&catalog, &[], None, 0.6);
        matcher.match_bundle(&bundle_for(html), &profile())
    }

    #[test]
    fn test_first_name_direct_attribute() {
        let m = run(r#"<input id="first_name">"#).unwrap();
        assert_eq!(m.field_type, "firstName");
        assert_eq!(m.value.as_deref(), Some("Ada"));
        assert_eq!(m.certainty, 0.7);
        assert_eq!(m.source.as_str(), "direct-attributes");
    }

    #[test]
    fn test_autocomplete_email_is_exact() {
        let m = run(r#"<input autocomplete="email">"#).unwrap();
        assert_eq!(m.field_type, "email");
        assert_eq!(m.value.as_deref(), Some("a@b.com"));
        assert_eq!(m.certainty, 1.0);
        assert_eq!(m.source, MatchSource::Autocomplete);
    }

    #[test]
    fn test_every_autocomplete_token_reaches_max_tier() {
        for (token, field) in AUTOCOMPLETE_TOKENS {
            let m = run(&format!(r#"<input autocomplete="{token}">"#)).unwrap();
            assert_eq!(m.field_type, *field, "token {token}");
            assert_eq!(m.certainty, CERTAINTY_EXACT, "token {token}");
        }
    }

    #[test]
    fn test_no_signal_no_match() {
        assert!(run(r#"<input id="x1" name="q_17">"#).is_none());
        assert!(run(r#"<textarea></textarea>"#).is_none());
    }

    #[test]
    fn test_input_type_outranks_label() {
        let m = run(r#"<label for="c">Contact</label><input id="c" type="tel">"#).unwrap();
        assert_eq!(m.field_type, "phone");
        assert_eq!(m.certainty, CERTAINTY_INPUT_TYPE);
        assert_eq!(m.value.as_deref(), Some("+1 555 0100"));
    }

    #[test]
    fn test_ranking_prefers_higher_certainty_regardless_of_stage_order() {
        // Label says city (0.5) but type=email fires at 0.9.
        let bundle = bundle_for(r#"<label for="e">City</label><input id="e" type="email">"#);
        let catalog = FieldCatalog::builtin();
        let matcher = StagedMatcher::new(&catalog, &[], None, 0.6);
        let hits = matcher.ranked_hits(&bundle, None);
        assert_eq!(hits[0].certainty, 0.9);
        assert_eq!(hits[0].field_type, "email");
        assert!(hits.iter().any(|h| h.certainty == 0.5 && h.field_type == "city"));
    }

    #[test]
    fn test_inherited_test_id_is_direct_tier() {
        let m = run(r#"<div data-qa="employer"><input name="q9"></div>"#).unwrap();
        assert_eq!(m.field_type, "currentCompany");
        assert_eq!(m.certainty, CERTAINTY_DIRECT);
        assert_eq!(m.source, MatchSource::DirectAttributes);

        let m = run(r#"<input name="q9" data-qa="employer">"#).unwrap();
        assert_eq!(m.field_type, "currentCompany");
        assert_eq!(m.certainty, CERTAINTY_EXACT);
        assert_eq!(m.source, MatchSource::DataAttribute);
    }

    #[test]
    fn test_label_parent_and_placeholder_tiers() {
        let m = run(r#"<label for="q">Your LinkedIn</label><input id="q">"#).unwrap();
        assert_eq!((m.field_type.as_str(), m.source), ("linkedin", MatchSource::Label));

        let m = run(r#"<div>Postal code <input name="q1"></div>"#).unwrap();
        assert_eq!((m.field_type.as_str(), m.source), ("postalCode", MatchSource::ParentText));

        let m = run(r#"<input name="q2" placeholder="GitHub profile">"#).unwrap();
        assert_eq!(m.source, MatchSource::Placeholder);
        assert_eq!(m.field_type, "github");
    }

    #[test]
    fn test_placeholder_only_when_label_absent() {
        let catalog = FieldCatalog::builtin();
        let matcher = StagedMatcher::new(&catalog, &[], None, 0.6);
        let bundle = SignalBundle {
            placeholder: "zip code".into(),
            input_type: "text".into(),
            ..Default::default()
        };
        let hits = matcher.ranked_hits(&bundle, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, MatchSource::Placeholder);
        assert_eq!(hits[0].certainty, CERTAINTY_PLACEHOLDER);
    }

    #[test]
    fn test_confirm_email_not_resolved_as_email() {
        let m = run(r#"<label for="confirmEmail">Confirm your email</label><input id="confirmEmail" type="email">"#).unwrap();
        assert_eq!(m.field_type, "confirmEmail");
        assert_eq!(m.value.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_custom_rule_overrides_defaults() {
        let rules = compile_rules(&[CustomRuleSpec {
            enabled: true,
            pattern: "first.?name".into(),
            name: "nickname".into(),
            profile_path: "personal.email".into(),
        }]);
        let catalog = FieldCatalog::builtin();
        let matcher = StagedMatcher::new(&catalog, &rules, None, 0.6);
        let m = matcher.match_bundle(&bundle_for(r#"<input id="first_name">"#), &profile()).unwrap();
        assert_eq!(m.field_type, "nickname");
        assert_eq!(m.source, MatchSource::CustomRule);
        assert_eq!(m.certainty, CERTAINTY_CUSTOM_RULE);
        assert_eq!(m.value.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_enhanced_stage_respects_floor() {
        let catalog = FieldCatalog::builtin();
        let matcher = StagedMatcher::new(&catalog, &[], None, 0.6);
        let bundle = SignalBundle::default();

        let strong = Some(SemanticHit { field_type: "expectedSalary", confidence: 0.8 });
        let hits = matcher.ranked_hits(&bundle, strong);
        assert_eq!(hits[0].source, MatchSource::Enhanced);
        assert_eq!(hits[0].certainty, CERTAINTY_ENHANCED);

        let weak = Some(SemanticHit { field_type: "expectedSalary", confidence: 0.55 });
        assert!(matcher.ranked_hits(&bundle, weak).is_empty());
    }

    #[tokio::test]
    async fn test_async_variant_waits_for_semantic_stage() {
        let catalog = FieldCatalog::builtin();
        let detector = SemanticDetector::new("<html><body></body></html>");
        let matcher = StagedMatcher::new(&catalog, &[], Some(&detector), 0.6);
        let bundle = bundle_for(r#"<label for="q">What are your salary expectations?</label><input id="q">"#);

        assert!(matcher.match_bundle(&bundle, &profile()).unwrap().source != MatchSource::Enhanced);

        let m = matcher.match_bundle_async(&bundle, &profile()).await.unwrap();
        assert_eq!(m.field_type, "expectedSalary");
        assert_eq!(m.source, MatchSource::Enhanced);
        assert_eq!(m.value, None);

        let again = matcher.match_bundle(&bundle, &profile()).unwrap();
        assert_eq!(again, m);
        assert!(SemanticModel::default().detect(&bundle).is_some());
    }

    #[test]
    fn test_auto_check_skips_value() {
        let m = run(r#"<label><input type="checkbox" name="agree_terms"> I agree to the terms</label>"#).unwrap();
        assert_eq!(m.field_type, "termsAgreement");
        assert!(m.auto_check);
        assert_eq!(m.value, None);
    }

    #[test]
    fn test_cover_letter_default_path() {
        let m = run(r#"<label for="cl">Cover Letter</label><textarea id="cl"></textarea>"#).unwrap();
        assert_eq!(m.field_type, "coverLetter");
        assert_eq!(m.value.as_deref(), Some("Dear hiring team"));
    }

    #[test]
    fn test_idempotent() {
        let html = r#"<label for="p">Phone number</label><input id="p" name="phone" type="tel">"#;
        assert_eq!(run(html), run(html));
    }
}
