//! WHATWG autofill tokens mapped to field types.
//!
//! Reference: https://html.spec.whatwg.org/multipage/form-control-infrastructure.html#autofill

/// `(token, field type)`. Several tokens may map to the same field.
pub const AUTOCOMPLETE_TOKENS: &[(&str, &str)] = &[
    ("given-name", "firstName"),
    ("additional-name", "middleName"),
    ("family-name", "lastName"),
    ("nickname", "preferredName"),
    ("name", "fullName"),
    ("email", "email"),
    ("tel", "phone"),
    ("tel-national", "phone"),
    ("tel-local", "phone"),
    ("street-address", "address"),
    ("address-line1", "address"),
    ("address-line2", "addressLine2"),
    ("address-level2", "city"),
    ("address-level1", "state"),
    ("postal-code", "postalCode"),
    ("country", "country"),
    ("country-name", "country"),
    ("organization", "currentCompany"),
    ("organization-title", "currentTitle"),
    ("url", "website"),
    ("sex", "gender"),
];

/// Field type for an `autocomplete` attribute value. Section and
/// shipping/billing prefixes are ignored by taking the last token
/// (`"shipping address-line1"` -> `address-line1`).
pub fn field_for_autocomplete(value: &str) -> Option<&'static str> {
    let token = value
        .split_whitespace()
        .filter(|t| !t.eq_ignore_ascii_case("webauthn"))
        .last()?
        .to_ascii_lowercase();

    AUTOCOMPLETE_TOKENS
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, field)| *field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_word_tokens_use_last() {
        assert_eq!(field_for_autocomplete("shipping address-line1"), Some("address"));
        assert_eq!(field_for_autocomplete("section-work billing tel"), Some("phone"));
        assert_eq!(field_for_autocomplete("email webauthn"), Some("email"));
        assert_eq!(field_for_autocomplete("GIVEN-NAME"), Some("firstName"));
    }

    #[test]
    fn test_non_field_tokens() {
        assert_eq!(field_for_autocomplete("off"), None);
        assert_eq!(field_for_autocomplete("on"), None);
        assert_eq!(field_for_autocomplete(""), None);
        assert_eq!(field_for_autocomplete("new-password"), None);
    }
}
