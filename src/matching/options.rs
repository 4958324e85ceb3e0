//! Picking a `<select>` option for a profile value.

use crate::dom::{normalize, SelectOption};

/// Values that name the same thing. Matching any member matches them all.
const ALIAS_GROUPS: &[&[&str]] = &[
    &["united states", "united states of america", "usa", "us", "u.s.", "u.s.a.", "america"],
    &["united kingdom", "uk", "u.k.", "great britain", "gb", "england"],
    &["united arab emirates", "uae"],
    &["germany", "deutschland", "de"],
    &["netherlands", "the netherlands", "holland", "nl"],
    &["south korea", "korea, republic of", "republic of korea", "korea"],
    &["yes", "y", "true"],
    &["no", "n", "false"],
    &["male", "man", "m"],
    &["female", "woman", "f"],
    &["prefer not to say", "prefer not to answer", "decline to self identify", "i don't wish to answer"],
];

const PLACEHOLDER_PREFIXES: &[&str] = &["select", "choose", "please select", "--", "pick"];

fn is_placeholder(option: &SelectOption) -> bool {
    let text = normalize(&option.text);
    option.value.trim().is_empty()
        || text.is_empty()
        || PLACEHOLDER_PREFIXES.iter().any(|p| text.starts_with(p))
}

fn aliases(value: &str) -> Option<&'static [&'static str]> {
    ALIAS_GROUPS.iter().copied().find(|group| group.contains(&value))
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Best option for `target`: exact value or text, then alias group, then
/// whole-word containment either way, then prefix. Placeholders never win.
pub fn choose_option<'o>(options: &'o [SelectOption], target: &str) -> Option<&'o SelectOption> {
    let target = normalize(target);
    if target.is_empty() {
        return None;
    }
    let candidates: Vec<(&SelectOption, String, String)> = options
        .iter()
        .filter(|o| !is_placeholder(o))
        .map(|o| (o, normalize(&o.value), normalize(&o.text)))
        .collect();

    if let Some((o, _, _)) = candidates.iter().find(|(_, v, t)| *v == target || *t == target) {
        return Some(o);
    }

    if let Some(group) = aliases(&target) {
        if let Some((o, _, _)) = candidates
            .iter()
            .find(|(_, v, t)| group.contains(&v.as_str()) || group.contains(&t.as_str()))
        {
            return Some(o);
        }
    }

    if let Some((o, _, _)) = candidates
        .iter()
        .find(|(_, _, t)| contains_word(t, &target) || contains_word(&target, t))
    {
        return Some(o);
    }

    candidates
        .iter()
        .find(|(_, v, t)| t.starts_with(&target) || v.starts_with(&target))
        .map(|(o, _, _)| *o)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> Vec<SelectOption> {
        pairs
            .iter()
            .map(|(v, t)| SelectOption {
                value: v.to_string(),
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_usa_selects_united_states() {
        let options = opts(&[("", "Select a country"), ("CA", "Canada"), ("US", "United States"), ("UM", "United States Minor Outlying Islands")]);
        assert_eq!(choose_option(&options, "usa").unwrap().text, "United States");
        assert_eq!(choose_option(&options, "United States").unwrap().value, "US");
    }

    #[test]
    fn test_exact_beats_word_match() {
        let options = opts(&[("1", "Yes, I am authorized"), ("2", "Yes")]);
        assert_eq!(choose_option(&options, "yes").unwrap().value, "2");
    }

    #[test]
    fn test_boolean_alias_and_word_match() {
        let options = opts(&[("", "Choose..."), ("t", "True"), ("f", "False")]);
        assert_eq!(choose_option(&options, "Yes").unwrap().value, "t");

        let options = opts(&[("a", "Bachelor's Degree"), ("b", "Master's Degree")]);
        assert_eq!(choose_option(&options, "master's").unwrap().value, "b");
    }

    #[test]
    fn test_prefix_and_placeholder_never_chosen() {
        let options = opts(&[("", "Select..."), ("imm", "Immediately")]);
        assert_eq!(choose_option(&options, "immed").unwrap().value, "imm");
        assert!(choose_option(&options, "select").is_none());
        assert!(choose_option(&options, "").is_none());
    }
}
