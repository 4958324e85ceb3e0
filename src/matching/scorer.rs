//! Multi-signal scorer.
//!
//! Every field type is scored against every signal; several weak signals that
//! agree can outrank one strong one. Negative patterns subtract a penalty
//! large enough to sink a field type whose id merely looks right.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{field_for_autocomplete, FieldCatalog, FieldTypeDefinition};
use crate::dom::{SignalBundle, SignalSource};
use crate::profile::Profile;

use super::{MatchCandidate, MatchSource};

pub const INPUT_TYPE_BONUS: f64 = 8.0;
pub const CONTEXT_CLUE_BONUS: f64 = 10.0;
pub const NEGATIVE_PENALTY: f64 = 100.0;
/// Score a field of weight 1.0 needs for full confidence.
pub const EXPECTED_MAX_SCORE: f64 = 100.0;

/// Sources tested against a definition's patterns, in weight order.
const PATTERN_SOURCES: &[SignalSource] = &[
    SignalSource::Id,
    SignalSource::FormControlName,
    SignalSource::Name,
    SignalSource::Label,
    SignalSource::AriaLabel,
    SignalSource::DataTest,
    SignalSource::Placeholder,
];

pub fn source_weight(source: SignalSource) -> f64 {
    match source {
        SignalSource::Autocomplete => 50.0,
        SignalSource::Id => 40.0,
        SignalSource::FormControlName => 38.0,
        SignalSource::Name => 35.0,
        SignalSource::Label => 30.0,
        SignalSource::AriaLabel => 28.0,
        SignalSource::DataTest => 25.0,
        SignalSource::Placeholder => 15.0,
        SignalSource::Context => 10.0,
    }
}

/// One contribution to a field type's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreContribution {
    pub signal: &'static str,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredField {
    pub field_type: &'static str,
    /// Raw score times the definition weight.
    pub score: f64,
    pub raw_score: f64,
    /// 0-100.
    pub confidence: f64,
    pub matches: Vec<ScoreContribution>,
    #[serde(skip)]
    position: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub ranked: Vec<ScoredField>,
}

impl ScoreReport {
    /// Top entry, if it scored above zero.
    pub fn best_match(&self) -> Option<&ScoredField> {
        self.ranked.first().filter(|f| f.score > 0.0)
    }
}

pub struct MultiSignalScorer<'s> {
    catalog: &'s FieldCatalog,
}

impl<'s> MultiSignalScorer<'s> {
    pub fn new(catalog: &'s FieldCatalog) -> Self {
        Self { catalog }
    }

    pub fn score(&self, bundle: &SignalBundle) -> ScoreReport {
        let combined = bundle.combined();
        let autocomplete_field = field_for_autocomplete(&bundle.autocomplete);

        let mut ranked: Vec<ScoredField> = self
            .catalog
            .iter()
            .enumerate()
            .filter_map(|(position, def)| score_field(def, bundle, &combined, autocomplete_field, position))
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.raw_score.partial_cmp(&a.raw_score).unwrap_or(Ordering::Equal))
                .then_with(|| a.position.cmp(&b.position))
        });
        ScoreReport { ranked }
    }

    /// Best field as a match candidate, gated by `min_confidence` (0-100).
    pub fn best_candidate(
        &self,
        bundle: &SignalBundle,
        profile: &Profile,
        min_confidence: f64,
    ) -> Option<MatchCandidate> {
        let report = self.score(bundle);
        let best = report.best_match()?;
        if best.confidence < min_confidence {
            debug!(
                field_type = best.field_type,
                confidence = best.confidence,
                min_confidence,
                "scored match below threshold"
            );
            return None;
        }

        let def = self.catalog.get(best.field_type)?;
        let value = if def.auto_check || def.profile_path.is_empty() {
            None
        } else {
            profile.resolve(def.profile_path)
        };
        Some(MatchCandidate {
            field_type: best.field_type.to_string(),
            certainty: best.confidence / 100.0,
            source: MatchSource::Scorer,
            value,
            profile_path: (!def.profile_path.is_empty()).then(|| def.profile_path.to_string()),
            auto_check: def.auto_check,
            is_confirm: false,
        })
    }
}

fn score_field(
    def: &FieldTypeDefinition,
    bundle: &SignalBundle,
    combined: &str,
    autocomplete_field: Option<&str>,
    position: usize,
) -> Option<ScoredField> {
    if !def.requires_satisfied(combined) {
        return None;
    }

    let mut matches = Vec::new();
    if autocomplete_field == Some(def.key) {
        matches.push(ScoreContribution {
            signal: SignalSource::Autocomplete.as_str(),
            points: source_weight(SignalSource::Autocomplete),
        });
    }
    for &source in PATTERN_SOURCES {
        if def.matches_source(source, bundle.get(source)) {
            matches.push(ScoreContribution {
                signal: source.as_str(),
                points: source_weight(source),
            });
        }
    }
    // Section headings read like labels.
    if def.matches_source(SignalSource::Label, &bundle.context) {
        matches.push(ScoreContribution {
            signal: SignalSource::Context.as_str(),
            points: source_weight(SignalSource::Context),
        });
    }

    // Bonuses only reinforce real evidence.
    if matches.is_empty() {
        return None;
    }
    if def.accepts_input_type(&bundle.input_type) || def.accepts_input_type(&bundle.tag) {
        matches.push(ScoreContribution {
            signal: "type",
            points: INPUT_TYPE_BONUS,
        });
    }
    if def.context_hit(bundle) {
        matches.push(ScoreContribution {
            signal: "contextClue",
            points: CONTEXT_CLUE_BONUS,
        });
    }
    if def.negative_hit(combined) {
        matches.push(ScoreContribution {
            signal: "negative",
            points: -NEGATIVE_PENALTY,
        });
    }

    let raw_score: f64 = matches.iter().map(|m| m.points).sum();
    let score = raw_score * def.weight;
    let expected_max = EXPECTED_MAX_SCORE * def.weight.max(1.0);
    let confidence = (score / expected_max * 100.0).clamp(0.0, 100.0);

    Some(ScoredField {
        field_type: def.key,
        score,
        raw_score,
        confidence,
        matches,
        position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{extract_signals, ControlId, FormDocument};
    use scraper::Html;

    fn bundle_for(html: &str) -> SignalBundle {
        let html = Html::parse_document(html);
        let doc = FormDocument::new(&html, 1);
        extract_signals(&doc, doc.control(ControlId(0)).unwrap())
    }

    fn report(html: &str) -> ScoreReport {
        let catalog = FieldCatalog::builtin();
        MultiSignalScorer::new(&catalog).score(&bundle_for(html))
    }

    #[test]
    fn test_confirm_email_penalty_dominates() {
        let r = report(r#"<label for="confirmEmail">Confirm your email</label><input id="confirmEmail" type="email">"#);
        let best = r.best_match().unwrap();
        assert_eq!(best.field_type, "confirmEmail");

        let email = r.ranked.iter().find(|f| f.field_type == "email").unwrap();
        assert!(email.score < 0.0);
        assert_eq!(email.confidence, 0.0);
        assert!(email.matches.iter().any(|m| m.signal == "negative"));
    }

    #[test]
    fn test_requires_gate_keeps_plain_email_plain() {
        let r = report(r#"<input id="email" type="email">"#);
        assert_eq!(r.best_match().unwrap().field_type, "email");
        assert!(r.ranked.iter().all(|f| f.field_type != "confirmEmail"));
    }

    #[test]
    fn test_autocomplete_scores_highest_source() {
        let r = report(r#"<input autocomplete="given-name">"#);
        let best = r.best_match().unwrap();
        assert_eq!(best.field_type, "firstName");
        assert_eq!(best.raw_score, 50.0);
        assert!((best.confidence - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_weak_signals_accumulate() {
        let r = report(r#"<input name="q" aria-label="ZIP" placeholder="Postal code">"#);
        let best = r.best_match().unwrap();
        assert_eq!(best.field_type, "postalCode");
        // label (from aria-label) + aria-label + placeholder
        assert_eq!(best.raw_score, 30.0 + 28.0 + 15.0);
    }

    #[test]
    fn test_light_weight_lowers_confidence() {
        let r = report(r#"<label for="s">Skills</label><input id="s">"#);
        let best = r.best_match().unwrap();
        assert_eq!(best.field_type, "skills");
        assert!((best.confidence - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_bonuses_need_evidence() {
        let r = report(r#"<textarea></textarea>"#);
        assert!(r.ranked.is_empty());
        assert!(r.best_match().is_none());
    }

    #[test]
    fn test_threshold_gates_candidate() {
        let catalog = FieldCatalog::builtin();
        let scorer = MultiSignalScorer::new(&catalog);
        let profile = Profile::from_json(r#"{"personal": {"postalCode": "10001"}}"#).unwrap();

        let weak = SignalBundle {
            placeholder: "zip code".into(),
            ..Default::default()
        };
        assert!(scorer.score(&weak).best_match().is_some());
        assert!(scorer.best_candidate(&weak, &profile, 30.0).is_none());

        let strong = SignalBundle {
            id: "zip".into(),
            placeholder: "zip code".into(),
            ..Default::default()
        };
        let m = scorer.best_candidate(&strong, &profile, 30.0).unwrap();
        assert_eq!(m.field_type, "postalCode");
        assert_eq!(m.source, MatchSource::Scorer);
        assert_eq!(m.value.as_deref(), Some("10001"));
        assert!((m.certainty - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_context_clue_bonus() {
        let plain = report(r#"<input name="phone">"#);
        let in_section = report(r#"<section><h2>Contact details</h2><input name="phone"></section>"#);
        let a = plain.best_match().unwrap();
        let b = in_section.best_match().unwrap();
        assert_eq!(a.field_type, "phone");
        assert_eq!(b.field_type, "phone");
        assert_eq!(b.raw_score - a.raw_score, CONTEXT_CLUE_BONUS);
    }

    #[test]
    fn test_ties_fall_back_to_catalog_order() {
        let catalog = FieldCatalog::builtin();
        let scorer = MultiSignalScorer::new(&catalog);
        let bundle = SignalBundle {
            label: "github and linkedin".into(),
            ..Default::default()
        };
        let r = scorer.score(&bundle);
        assert_eq!(r.ranked[0].field_type, "linkedin");
        assert_eq!(r.ranked[1].field_type, "github");
    }
}
