//! Confirmation fields ("confirm your email", "re-enter password").
//!
//! Runs after the main pass: a text control that asks to repeat a value gets
//! the value already filled for the field it confirms.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::dom::SignalBundle;

use super::staged::CERTAINTY_DIRECT;
use super::{MatchCandidate, MatchSource};

/// Verbs must start a token (`confirm_email`, `confirmemail`); `confirm` and
/// `again` may also end one (`emailconfirm`, `email_again`). `against` and
/// `unverified` stay out.
static CONFIRM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])(?:confirm|repeat|verif|re.?enter|retype)|(?:confirm|again)(?:[^a-z]|$)")
        .expect("static regex")
});
/// One-time codes say "verify" too but never repeat a profile value.
static ONE_TIME_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcode\b|\botp\b|one.?time").expect("static regex"));

/// Field types a confirmation control can repeat, checked in order.
const CONFIRMABLE: &[(&str, &[&str])] = &[
    ("email", &["email", "e-mail", "mail"]),
    ("phone", &["phone", "mobile", "tel"]),
    ("password", &["password", "passwd", "pwd"]),
];

pub fn is_confirmation_control(bundle: &SignalBundle) -> bool {
    let text = bundle.combined();
    CONFIRM.is_match(&text) && !ONE_TIME_CODE.is_match(&text)
}

/// Resolve a confirmation control against values already filled this pass.
pub fn resolve_confirmation(bundle: &SignalBundle, filled: &HashMap<String, String>) -> Option<MatchCandidate> {
    if !is_confirmation_control(bundle) {
        return None;
    }
    let text = bundle.combined();

    // A named target that was never filled gets nothing; only an unnamed
    // "please repeat" falls back to email.
    let target = CONFIRMABLE
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map_or("email", |(field, _)| *field);

    let value = filled.get(target)?.clone();
    debug!(field_type = target, "confirmation field");
    Some(MatchCandidate {
        field_type: target.to_string(),
        certainty: CERTAINTY_DIRECT,
        source: MatchSource::Confirmation,
        value: Some(value),
        profile_path: None,
        auto_check: false,
        is_confirm: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn bundle(id: &str, label: &str) -> SignalBundle {
        SignalBundle {
            id: id.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_confirm_email_reuses_value() {
        let b = bundle("confirmemail", "confirm your email");
        assert!(resolve_confirmation(&b, &HashMap::new()).is_none());

        let m = resolve_confirmation(&b, &filled(&[("email", "a@b.com")])).unwrap();
        assert_eq!(m.field_type, "email");
        assert_eq!(m.value.as_deref(), Some("a@b.com"));
        assert_eq!(m.certainty, 0.7);
        assert!(m.is_confirm);
        assert_eq!(m.source, MatchSource::Confirmation);
    }

    #[test]
    fn test_phone_and_email_fallback() {
        let values = filled(&[("email", "a@b.com"), ("phone", "555")]);
        let m = resolve_confirmation(&bundle("", "re-enter mobile"), &values).unwrap();
        assert_eq!((m.field_type.as_str(), m.value.as_deref()), ("phone", Some("555")));

        let m = resolve_confirmation(&bundle("field_2", "please repeat"), &values).unwrap();
        assert_eq!(m.field_type, "email");

        let only_phone = filled(&[("phone", "555")]);
        assert!(resolve_confirmation(&bundle("", "repeat your password"), &only_phone).is_none());
    }

    #[test]
    fn test_named_target_never_falls_back_to_email() {
        let values = filled(&[("email", "a@b.com")]);
        let b = bundle("password_confirm", "re-enter password");
        assert!(is_confirmation_control(&b));
        assert!(resolve_confirmation(&b, &values).is_none());
        assert!(resolve_confirmation(&bundle("", "confirm phone number"), &values).is_none());
    }

    #[test]
    fn test_confirm_words_respect_token_edges() {
        assert!(is_confirmation_control(&bundle("emailconfirm", "")));
        assert!(is_confirmation_control(&bundle("email_again", "")));
        assert!(is_confirmation_control(&bundle("confirmemail", "")));
        assert!(is_confirmation_control(&bundle("", "re-enter your email")));
        assert!(!is_confirmation_control(&bundle("eeo", "we do not discriminate against applicants")));
        assert!(!is_confirmation_control(&bundle("status", "unverified")));
    }

    #[test]
    fn test_verification_codes_ignored() {
        let values = filled(&[("email", "a@b.com")]);
        assert!(resolve_confirmation(&bundle("otp", "verification code"), &values).is_none());
        assert!(resolve_confirmation(&bundle("email", "email address"), &values).is_none());
    }
}
