//! Page-level fill driver.
//!
//! Walks controls in document order, matches each one and hands the value to
//! a [`ControlCommitter`]. The DOM itself is never touched here. Text controls
//! that ask to repeat a value wait for a second pass so they can repeat what
//! actually got committed; when there is nothing to repeat they fall back to
//! their ordinary match.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dom::{normalize, ControlId, ControlInfo, FormDocument, SelectOption, SignalBundle};
use crate::error::Result;
use crate::matching::{choose_option, is_confirmation_control, resolve_confirmation, MatchCandidate, MatchMode};
use crate::profile::Profile;
use crate::session::PageSession;

const TRUTHY: &[&str] = &["yes", "y", "true", "1"];
const FALSY: &[&str] = &["no", "n", "false", "0"];

/// What to write into one control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FillValue {
    Text { text: String },
    Check { checked: bool },
    Select { value: String, text: String },
}

impl FillValue {
    /// Value a confirmation control should repeat, if any.
    fn repeatable(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Select { value, .. } => Some(value),
            Self::Check { .. } => None,
        }
    }
}

/// Writes a value into the live control. Implemented by the embedder.
#[async_trait(?Send)]
pub trait ControlCommitter {
    async fn commit(&self, control: &ControlInfo, value: &FillValue) -> Result<()>;
}

/// A matched control and the value it will receive.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedFill {
    pub control: ControlInfo,
    pub candidate: MatchCandidate,
    pub value: FillValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum FillStatus {
    Filled,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOutcome {
    pub control: ControlId,
    pub field_type: String,
    pub value: FillValue,
    pub status: FillStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    pub outcomes: Vec<FillOutcome>,
    /// Fillable controls no matcher recognised.
    pub unmatched: Vec<ControlId>,
    /// Matched controls left alone: no usable value, or a field already filled.
    pub skipped: Vec<ControlId>,
}

impl FillReport {
    pub fn filled(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status == FillStatus::Filled).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.filled()
    }
}

/// A text control that asks to repeat a value, held back for the second pass.
struct Deferred {
    control: ControlInfo,
    bundle: Rc<SignalBundle>,
    /// Its ordinary match, used when there is nothing to repeat.
    fallback: Option<MatchCandidate>,
}

/// Result of the main pass: fills to commit plus the deferred confirmations.
struct MainPass {
    fills: Vec<PlannedFill>,
    confirmations: Vec<Deferred>,
    filled_types: HashSet<String>,
    unmatched: Vec<ControlId>,
    skipped: Vec<ControlId>,
}

pub struct FormFiller<'s> {
    session: &'s PageSession,
    profile: &'s Profile,
    mode: MatchMode,
}

impl<'s> FormFiller<'s> {
    pub fn new(session: &'s PageSession, profile: &'s Profile) -> Self {
        Self {
            session,
            profile,
            mode: MatchMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Every fill the driver would attempt, assuming all commits succeed.
    pub async fn plan(&self, doc: &FormDocument<'_>) -> Vec<PlannedFill> {
        let mut pass = self.main_pass(doc).await;
        let mut filled = repeatable_values(pass.fills.iter().map(|p| (&p.candidate.field_type, &p.value)));
        let mut plan = pass.fills;
        for deferred in pass.confirmations {
            if let Some(fill) = settle(deferred, &filled, &mut pass.filled_types) {
                if let Some(v) = fill.value.repeatable() {
                    filled.entry(fill.candidate.field_type.clone()).or_insert_with(|| v.to_string());
                }
                plan.push(fill);
            }
        }
        plan
    }

    /// Match and commit the whole form. Commit failures are recorded in the
    /// report and never abort the pass.
    pub async fn fill(&self, doc: &FormDocument<'_>, committer: &dyn ControlCommitter) -> FillReport {
        let mut pass = self.main_pass(doc).await;
        let delay = self.session.config().fill_delay();
        let mut report = FillReport {
            unmatched: pass.unmatched,
            skipped: pass.skipped,
            ..FillReport::default()
        };
        let mut committed: HashMap<String, String> = HashMap::new();

        for planned in pass.fills {
            if !report.outcomes.is_empty() {
                tokio::time::sleep(delay).await;
            }
            let outcome = commit(committer, &planned).await;
            if outcome.status == FillStatus::Filled {
                if let Some(v) = planned.value.repeatable() {
                    committed.entry(outcome.field_type.clone()).or_insert_with(|| v.to_string());
                }
            }
            report.outcomes.push(outcome);
        }

        for deferred in pass.confirmations {
            let id = deferred.control.control;
            let Some(planned) = settle(deferred, &committed, &mut pass.filled_types) else {
                report.unmatched.push(id);
                continue;
            };
            if !report.outcomes.is_empty() {
                tokio::time::sleep(delay).await;
            }
            report.outcomes.push(commit(committer, &planned).await);
        }

        info!(
            filled = report.filled(),
            failed = report.failed(),
            unmatched = report.unmatched.len(),
            skipped = report.skipped.len(),
            "form fill finished"
        );
        report
    }

    async fn main_pass(&self, doc: &FormDocument<'_>) -> MainPass {
        let mut pass = MainPass {
            fills: Vec::new(),
            confirmations: Vec::new(),
            filled_types: HashSet::new(),
            unmatched: Vec::new(),
            skipped: Vec::new(),
        };

        for id in doc.control_ids() {
            let Some(control) = doc.info(id).filter(ControlInfo::is_fillable) else {
                continue;
            };
            let Some(bundle) = self.session.bundle(doc, id) else {
                continue;
            };
            let candidate = self.session.match_bundle_async(&bundle, self.profile, self.mode).await;

            // Selects, checkboxes and controls matched to an ordinary field
            // ("confirm you are authorized to work") are filled normally.
            let repeats = control.is_text_entry()
                && is_confirmation_control(&bundle)
                && candidate.as_ref().map_or(true, |c| c.field_type.starts_with("confirm"));
            if repeats {
                pass.confirmations.push(Deferred {
                    control,
                    bundle,
                    fallback: candidate,
                });
                continue;
            }

            let Some(candidate) = candidate else {
                pass.unmatched.push(id);
                continue;
            };
            if !control.is_checkable() && pass.filled_types.contains(&candidate.field_type) {
                debug!(control = id.0, field_type = %candidate.field_type, "field type already filled");
                pass.skipped.push(id);
                continue;
            }
            let Some(value) = fill_value(&control, &bundle, &candidate) else {
                debug!(control = id.0, field_type = %candidate.field_type, "no usable value");
                pass.skipped.push(id);
                continue;
            };

            pass.filled_types.insert(candidate.field_type.clone());
            pass.fills.push(PlannedFill {
                control,
                candidate,
                value,
            });
        }
        pass
    }
}

fn repeatable_values<'a>(fills: impl Iterator<Item = (&'a String, &'a FillValue)>) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for (field_type, value) in fills {
        if let Some(v) = value.repeatable() {
            out.entry(field_type.clone()).or_insert_with(|| v.to_string());
        }
    }
    out
}

/// Repeat a filled value into a deferred control, else fill it from its own
/// match like any other control.
fn settle(
    deferred: Deferred,
    filled: &HashMap<String, String>,
    filled_types: &mut HashSet<String>,
) -> Option<PlannedFill> {
    let Deferred {
        control,
        bundle,
        fallback,
    } = deferred;

    if let Some(candidate) = resolve_confirmation(&bundle, filled) {
        if let Some(text) = candidate.value.clone() {
            return Some(PlannedFill {
                control,
                candidate,
                value: FillValue::Text { text },
            });
        }
    }

    let candidate = fallback?;
    if filled_types.contains(&candidate.field_type) {
        return None;
    }
    let value = fill_value(&control, &bundle, &candidate)?;
    debug!(
        control = control.control.0,
        field_type = %candidate.field_type,
        "nothing to repeat, using own match"
    );
    filled_types.insert(candidate.field_type.clone());
    Some(PlannedFill {
        control,
        candidate,
        value,
    })
}

async fn commit(committer: &dyn ControlCommitter, planned: &PlannedFill) -> FillOutcome {
    let status = match committer.commit(&planned.control, &planned.value).await {
        Ok(()) => {
            debug!(
                control = planned.control.control.0,
                field_type = %planned.candidate.field_type,
                source = %planned.candidate.source,
                "value committed"
            );
            FillStatus::Filled
        }
        Err(e) => {
            warn!(
                control = planned.control.control.0,
                field_type = %planned.candidate.field_type,
                error = %e,
                "commit failed"
            );
            FillStatus::Failed(e.to_string())
        }
    };
    FillOutcome {
        control: planned.control.control,
        field_type: planned.candidate.field_type.clone(),
        value: planned.value.clone(),
        status,
    }
}

/// Turn a match into the value its control can take.
pub fn fill_value(control: &ControlInfo, bundle: &SignalBundle, candidate: &MatchCandidate) -> Option<FillValue> {
    if control.is_checkable() {
        if candidate.auto_check {
            return Some(FillValue::Check { checked: true });
        }
        let target = candidate.value.as_deref()?;
        if control.input_type == "radio" {
            let option = SelectOption {
                value: control.value.clone().unwrap_or_default(),
                text: bundle.label.clone(),
            };
            return choose_option(std::slice::from_ref(&option), target).map(|_| FillValue::Check { checked: true });
        }
        let target = normalize(target);
        return if TRUTHY.contains(&target.as_str()) {
            Some(FillValue::Check { checked: true })
        } else if FALSY.contains(&target.as_str()) {
            Some(FillValue::Check { checked: false })
        } else {
            None
        };
    }

    let target = candidate.value.as_deref().filter(|v| !v.trim().is_empty())?;
    if control.is_select() {
        return choose_option(&control.options, target).map(|o| FillValue::Select {
            value: o.value.clone(),
            text: o.text.clone(),
        });
    }
    Some(FillValue::Text {
        text: target.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutofillError;
    use scraper::Html;
    use std::cell::RefCell;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingCommitter {
        commits: RefCell<Vec<(ControlId, FillValue)>>,
        reject: Option<ControlId>,
    }

    #[async_trait(?Send)]
    impl ControlCommitter for RecordingCommitter {
        async fn commit(&self, control: &ControlInfo, value: &FillValue) -> Result<()> {
            if self.reject == Some(control.control) {
                return Err(AutofillError::Commit {
                    control: control.control.0,
                    reason: "detached".into(),
                });
            }
            self.commits.borrow_mut().push((control.control, value.clone()));
            Ok(())
        }
    }

    fn profile() -> Profile {
        Profile::from_json(
            r#"{"personal": {"firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com",
                "country": "USA"}}"#,
        )
        .unwrap()
    }

    const FORM: &str = r#"<form>
        <input type="hidden" name="csrf" value="x">
        <div><input id="first_name" name="first_name"></div>
        <div><input id="last_name" name="last_name"></div>
        <div><input type="email" id="email" name="email" autocomplete="email"></div>
        <div>
            <label for="confirmEmail">Confirm email</label>
            <input type="email" id="confirmEmail" name="confirmEmail">
        </div>
        <div>
            <select id="country" name="country">
                <option value="">Select...</option>
                <option value="CA">Canada</option>
                <option value="US">United States</option>
            </select>
        </div>
        <div><input id="favourite_colour" name="favourite_colour"></div>
        <input type="submit" value="Apply">
    </form>"#;

    fn text(value: &str) -> FillValue {
        FillValue::Text { text: value.into() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_form_end_to_end() {
        let session = PageSession::builder().build().unwrap();
        let html = Html::parse_document(FORM);
        let doc = session.open_document(&html);
        let profile = profile();
        let committer = RecordingCommitter::default();

        let started = tokio::time::Instant::now();
        let report = FormFiller::new(&session, &profile).fill(&doc, &committer).await;

        let commits = committer.commits.borrow();
        let values: Vec<&FillValue> = commits.iter().map(|(_, v)| v).collect();
        assert_eq!(
            values,
            vec![
                &text("Ada"),
                &text("Lovelace"),
                &text("ada@example.com"),
                &FillValue::Select {
                    value: "US".into(),
                    text: "United States".into()
                },
                &text("ada@example.com"),
            ]
        );
        assert_eq!(report.filled(), 5);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.unmatched, vec![ControlId(6)]);
        assert!(report.outcomes.last().unwrap().field_type == "email");

        // Four gaps between five commits.
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_failed_commit_is_recorded_and_confirm_falls_back() {
        let session = PageSession::builder().build().unwrap();
        let html = Html::parse_document(FORM);
        let doc = session.open_document(&html);
        let profile = profile();
        let committer = RecordingCommitter {
            reject: Some(ControlId(3)),
            ..RecordingCommitter::default()
        };

        let report = FormFiller::new(&session, &profile).fill(&doc, &committer).await;
        let failed: Vec<&FillOutcome> = report
            .outcomes
            .iter()
            .filter(|o| matches!(o.status, FillStatus::Failed(_)))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].control, ControlId(3));
        // Nothing committed to repeat, so the confirm box takes its own match.
        let confirm = report.outcomes.last().unwrap();
        assert_eq!(confirm.control, ControlId(4));
        assert_eq!(confirm.field_type, "confirmEmail");
        assert_eq!(confirm.value, text("ada@example.com"));
        assert!(!report.unmatched.contains(&ControlId(4)));
        assert_eq!(committer.commits.borrow().len(), 4);
    }

    #[tokio::test]
    async fn test_plan_includes_confirmation() {
        let session = PageSession::builder().build().unwrap();
        let html = Html::parse_document(FORM);
        let doc = session.open_document(&html);
        let profile = profile();

        let plan = FormFiller::new(&session, &profile).plan(&doc).await;
        let confirm = plan.last().unwrap();
        assert_eq!(confirm.control.control, ControlId(4));
        assert!(confirm.candidate.is_confirm);
        assert_eq!(confirm.value, text("ada@example.com"));
    }

    #[tokio::test]
    async fn test_duplicate_field_type_skipped() {
        let session = PageSession::builder().build().unwrap();
        let html = Html::parse_document(r#"<input id="first_name"><input name="firstName">"#);
        let doc = session.open_document(&html);
        let profile = profile();

        let report = FormFiller::new(&session, &profile)
            .fill(&doc, &RecordingCommitter::default())
            .await;
        assert_eq!(report.filled(), 1);
        assert_eq!(report.skipped, vec![ControlId(1)]);
    }

    #[tokio::test]
    async fn test_confirm_wording_on_non_text_controls_fills_normally() {
        let session = PageSession::builder().build().unwrap();
        let html = Html::parse_document(
            r#"<form>
                <div><input type="email" id="email" autocomplete="email"></div>
                <div>
                    <label for="work_auth">Please confirm you are legally authorized to work in the US</label>
                    <select id="work_auth" name="work_auth">
                        <option value="">Select...</option>
                        <option value="Y">Yes</option>
                        <option value="N">No</option>
                    </select>
                </div>
                <div>
                    <input type="checkbox" id="attest" name="attest">
                    <label for="attest">I confirm the information above is true</label>
                </div>
            </form>"#,
        );
        let doc = session.open_document(&html);
        let profile = Profile::from_json(
            r#"{"personal": {"email": "ada@example.com"}, "preferences": {"workAuthorization": "Yes"}}"#,
        )
        .unwrap();
        let committer = RecordingCommitter::default();

        let report = FormFiller::new(&session, &profile).fill(&doc, &committer).await;
        assert_eq!(
            *committer.commits.borrow(),
            vec![
                (ControlId(0), text("ada@example.com")),
                (
                    ControlId(1),
                    FillValue::Select {
                        value: "Y".into(),
                        text: "Yes".into()
                    }
                ),
                (ControlId(2), FillValue::Check { checked: true }),
            ]
        );
        assert_eq!(report.outcomes[1].field_type, "workAuthorization");
        assert_eq!(report.outcomes[2].field_type, "termsAgreement");
    }

    #[tokio::test]
    async fn test_repeat_password_left_alone() {
        let session = PageSession::builder().build().unwrap();
        let html = Html::parse_document(
            r#"<div><input type="email" id="email" autocomplete="email"></div>
               <div><label for="pw2">Re-enter password</label><input type="password" id="pw2"></div>"#,
        );
        let doc = session.open_document(&html);
        let profile = profile();
        let committer = RecordingCommitter::default();

        let report = FormFiller::new(&session, &profile).fill(&doc, &committer).await;
        assert_eq!(committer.commits.borrow().len(), 1);
        assert_eq!(report.unmatched, vec![ControlId(1)]);
    }

    fn control(tag: &str, input_type: &str, value: Option<&str>) -> ControlInfo {
        ControlInfo {
            control: ControlId(0),
            tag: tag.into(),
            input_type: input_type.into(),
            dom_id: None,
            name: None,
            value: value.map(String::from),
            disabled: false,
            options: Vec::new(),
        }
    }

    fn candidate(value: Option<&str>, auto_check: bool) -> MatchCandidate {
        MatchCandidate {
            field_type: "x".into(),
            certainty: 0.7,
            source: crate::matching::MatchSource::DirectAttributes,
            value: value.map(String::from),
            profile_path: None,
            auto_check,
            is_confirm: false,
        }
    }

    #[test]
    fn test_checkable_values() {
        let bundle = SignalBundle {
            label: "Yes".into(),
            ..Default::default()
        };
        let checkbox = control("input", "checkbox", None);
        assert_eq!(
            fill_value(&checkbox, &bundle, &candidate(None, true)),
            Some(FillValue::Check { checked: true })
        );
        assert_eq!(
            fill_value(&checkbox, &bundle, &candidate(Some("No"), false)),
            Some(FillValue::Check { checked: false })
        );
        assert_eq!(fill_value(&checkbox, &bundle, &candidate(Some("maybe"), false)), None);

        let radio_yes = control("input", "radio", Some("yes"));
        assert_eq!(
            fill_value(&radio_yes, &bundle, &candidate(Some("Yes"), false)),
            Some(FillValue::Check { checked: true })
        );
        let radio_no = control("input", "radio", Some("no"));
        let no_bundle = SignalBundle {
            label: "No".into(),
            ..Default::default()
        };
        assert_eq!(fill_value(&radio_no, &no_bundle, &candidate(Some("Yes"), false)), None);
    }

    #[test]
    fn test_text_needs_value() {
        let input = control("input", "text", None);
        let bundle = SignalBundle::default();
        assert_eq!(fill_value(&input, &bundle, &candidate(None, false)), None);
        assert_eq!(fill_value(&input, &bundle, &candidate(Some("  "), false)), None);
        assert_eq!(fill_value(&input, &bundle, &candidate(Some("Ada"), false)), Some(text("Ada")));
    }
}
