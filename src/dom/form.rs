//! Form document: the control arena for one parsed page.
//!
//! Each `input`/`select`/`textarea` gets a stable [`ControlId`] (its position
//! in document order). Caches key on that id, never on element identity, and
//! are dropped wholesale when the page changes.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::text::{collapse_whitespace, element_text};

static CONTROLS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, select, textarea").expect("static selector"));
static WITH_ID: Lazy<Selector> = Lazy::new(|| Selector::parse("[id]").expect("static selector"));
static LABEL_FOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("label[for]").expect("static selector"));
static OPTIONS: Lazy<Selector> = Lazy::new(|| Selector::parse("option").expect("static selector"));

/// Opaque handle for a control within one [`FormDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ControlId(pub usize);

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// Static description of a control, handed to committers and FFI callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlInfo {
    pub control: ControlId,
    pub tag: String,
    pub input_type: String,
    pub dom_id: Option<String>,
    pub name: Option<String>,
    pub value: Option<String>,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl ControlInfo {
    pub fn is_checkable(&self) -> bool {
        self.tag == "input" && matches!(self.input_type.as_str(), "checkbox" | "radio")
    }

    pub fn is_select(&self) -> bool {
        self.tag == "select"
    }

    /// Free-text controls, the only ones a typed-in repeat value fits.
    pub fn is_text_entry(&self) -> bool {
        self.tag == "textarea"
            || (self.tag == "input"
                && matches!(
                    self.input_type.as_str(),
                    "text" | "email" | "tel" | "password" | "search" | "url"
                ))
    }

    /// Controls the filler never touches.
    pub fn is_fillable(&self) -> bool {
        !self.disabled
            && !(self.tag == "input"
                && matches!(
                    self.input_type.as_str(),
                    "hidden" | "submit" | "button" | "reset" | "image" | "file"
                ))
    }
}

/// Parsed page plus the per-page indexes the signal extractor needs.
pub struct FormDocument<'a> {
    html: &'a Html,
    generation: u64,
    controls: Vec<ElementRef<'a>>,
    by_id: HashMap<&'a str, ElementRef<'a>>,
    labels_for: HashMap<&'a str, Vec<ElementRef<'a>>>,
}

impl<'a> FormDocument<'a> {
    /// Index `html`. `generation` stamps which cache epoch this snapshot belongs to.
    pub fn new(html: &'a Html, generation: u64) -> Self {
        let controls: Vec<ElementRef<'a>> = html.select(&CONTROLS).collect();

        let mut by_id = HashMap::new();
        for element in html.select(&WITH_ID) {
            if let Some(id) = element.value().attr("id") {
                by_id.entry(id).or_insert(element);
            }
        }

        let mut labels_for: HashMap<&'a str, Vec<ElementRef<'a>>> = HashMap::new();
        for label in html.select(&LABEL_FOR) {
            if let Some(target) = label.value().attr("for") {
                labels_for.entry(target).or_default().push(label);
            }
        }

        Self {
            html,
            generation,
            controls,
            by_id,
            labels_for,
        }
    }

    pub fn html(&self) -> &'a Html {
        self.html
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn control_ids(&self) -> impl Iterator<Item = ControlId> + '_ {
        (0..self.controls.len()).map(ControlId)
    }

    pub fn control(&self, id: ControlId) -> Option<ElementRef<'a>> {
        self.controls.get(id.0).copied()
    }

    /// Reverse lookup, used when a caller holds an element from a selector.
    pub fn control_id_of(&self, element: ElementRef<'a>) -> Option<ControlId> {
        self.controls.iter().position(|c| *c == element).map(ControlId)
    }

    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'a>> {
        self.by_id.get(id).copied()
    }

    pub fn labels_for(&self, id: &str) -> &[ElementRef<'a>] {
        self.labels_for.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn info(&self, id: ControlId) -> Option<ControlInfo> {
        let element = self.control(id)?;
        let el = element.value();
        let tag = el.name().to_ascii_lowercase();
        let input_type = control_type(element);
        let options = if tag == "select" {
            element
                .select(&OPTIONS)
                .map(|opt| {
                    let text = element_text(opt);
                    SelectOption {
                        value: opt.value().attr("value").map(String::from).unwrap_or_else(|| text.clone()),
                        text,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(ControlInfo {
            control: id,
            tag,
            input_type,
            dom_id: el.attr("id").map(String::from),
            name: el.attr("name").map(String::from),
            value: el.attr("value").map(collapse_whitespace),
            disabled: el.attr("disabled").is_some()
                || element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| a.value().name() == "fieldset" && a.value().attr("disabled").is_some()),
            options,
        })
    }
}

/// `type` for inputs (default `text`), tag name for select/textarea.
pub fn control_type(element: ElementRef<'_>) -> String {
    let el = element.value();
    match el.name() {
        "input" => el
            .attr("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string()),
        other => other.to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
        <form>
            <label for="fn">First name</label>
            <input id="fn" name="first_name">
            <label for="fn">(legal)</label>
            <input type="hidden" name="csrf">
            <fieldset disabled><input id="locked"></fieldset>
            <select id="country" name="country">
                <option value="">Select...</option>
                <option value="us">United States</option>
                <option>Canada</option>
            </select>
            <textarea id="cover"></textarea>
        </form>
    "#;

    #[test]
    fn test_controls_in_document_order() {
        let html = Html::parse_document(FORM);
        let doc = FormDocument::new(&html, 1);
        assert_eq!(doc.len(), 5);

        let types: Vec<String> = doc.control_ids().map(|id| doc.info(id).unwrap().input_type).collect();
        assert_eq!(types, vec!["text", "hidden", "text", "select", "textarea"]);
        assert_eq!(doc.labels_for("fn").len(), 2);
        assert!(doc.element_by_id("cover").is_some());
    }

    #[test]
    fn test_control_info() {
        let html = Html::parse_document(FORM);
        let doc = FormDocument::new(&html, 1);

        let hidden = doc.info(ControlId(1)).unwrap();
        assert!(!hidden.is_fillable());

        let locked = doc.info(ControlId(2)).unwrap();
        assert!(locked.disabled);

        let country = doc.info(ControlId(3)).unwrap();
        assert!(country.is_select());
        assert_eq!(country.options.len(), 3);
        assert_eq!(country.options[1], SelectOption { value: "us".into(), text: "United States".into() });
        assert_eq!(country.options[2].value, "Canada");

        let first = doc.control(ControlId(0)).unwrap();
        assert_eq!(doc.control_id_of(first), Some(ControlId(0)));
    }
}
