//! Signal extraction: the identifying strings of one form control.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use scraper::ElementRef;
use serde::{Deserialize, Serialize};

use super::form::{control_type, ControlId, FormDocument};
use super::text::{element_text, normalize, text_excluding};

const DATA_TEST_ATTRS: &[&str] = &["data-test", "data-testid", "data-automation-id", "data-qa"];
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "legend"];

/// Nearby-label search stops after this many ancestor levels.
const LABEL_SEARCH_DEPTH: usize = 3;
/// Parent text longer than this is treated as page chrome, not a caption.
const MAX_PARENT_TEXT: usize = 200;

/// Where a signal string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalSource {
    Autocomplete,
    Id,
    #[serde(rename = "formcontrolname")]
    FormControlName,
    Name,
    Label,
    AriaLabel,
    DataTest,
    Placeholder,
    Context,
}

impl SignalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Autocomplete => "autocomplete",
            Self::Id => "id",
            Self::FormControlName => "formcontrolname",
            Self::Name => "name",
            Self::Label => "label",
            Self::AriaLabel => "ariaLabel",
            Self::DataTest => "dataTest",
            Self::Placeholder => "placeholder",
            Self::Context => "context",
        }
    }
}

/// Lower-cased signal strings for one control. Missing signals are `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalBundle {
    pub tag: String,
    pub id: String,
    pub name: String,
    pub autocomplete: String,
    pub label: String,
    pub placeholder: String,
    pub data_test: String,
    /// `data_test` came from a wrapper, not the control itself.
    pub data_test_inherited: bool,
    pub formcontrolname: String,
    pub aria_label: String,
    pub input_type: String,
    pub context: String,
    pub parent_text: String,
}

impl SignalBundle {
    pub fn get(&self, source: SignalSource) -> &str {
        match source {
            SignalSource::Autocomplete => &self.autocomplete,
            SignalSource::Id => &self.id,
            SignalSource::FormControlName => &self.formcontrolname,
            SignalSource::Name => &self.name,
            SignalSource::Label => &self.label,
            SignalSource::AriaLabel => &self.aria_label,
            SignalSource::DataTest => &self.data_test,
            SignalSource::Placeholder => &self.placeholder,
            SignalSource::Context => &self.context,
        }
    }

    /// All of the control's own identifying text, space separated. Section
    /// context is left out: a heading describes its neighbours too.
    pub fn combined(&self) -> String {
        [
            &self.id,
            &self.name,
            &self.autocomplete,
            &self.label,
            &self.placeholder,
            &self.data_test,
            &self.formcontrolname,
            &self.aria_label,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Extract every signal for `element`.
pub fn extract_signals<'a>(doc: &FormDocument<'a>, element: ElementRef<'a>) -> SignalBundle {
    let el = element.value();
    let attr = |name: &str| el.attr(name).map(normalize).unwrap_or_default();
    let own_data_test = DATA_TEST_ATTRS.iter().find_map(|n| el.attr(n)).map(normalize);
    let data_test_inherited = own_data_test.is_none();

    SignalBundle {
        tag: el.name().to_ascii_lowercase(),
        id: attr("id"),
        name: attr("name"),
        autocomplete: attr("autocomplete"),
        label: resolve_label(doc, element),
        placeholder: attr("placeholder"),
        data_test: own_data_test.unwrap_or_else(|| nearest_attr(element, DATA_TEST_ATTRS)),
        data_test_inherited,
        formcontrolname: nearest_attr(element, &["formcontrolname"]),
        aria_label: attr("aria-label"),
        input_type: control_type(element),
        context: resolve_context(element),
        parent_text: parent_text(element),
    }
}

/// First of `names` found on the element, else on the nearest ancestor.
fn nearest_attr(element: ElementRef<'_>, names: &[&str]) -> String {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find_map(|e| names.iter().find_map(|n| e.value().attr(n)))
        .map(normalize)
        .unwrap_or_default()
}

fn joined_text<'a>(parts: impl Iterator<Item = ElementRef<'a>>, skip: ElementRef<'a>) -> String {
    let texts: Vec<String> = parts
        .map(|p| normalize(&text_excluding(p, Some(skip))))
        .filter(|t| !t.is_empty())
        .collect();
    texts.join(" ")
}

/// Label resolution, first non-empty strategy wins.
pub fn resolve_label<'a>(doc: &FormDocument<'a>, element: ElementRef<'a>) -> String {
    let el = element.value();

    if let Some(id) = el.attr("id").filter(|id| !id.is_empty()) {
        let text = joined_text(doc.labels_for(id).iter().copied(), element);
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(label) = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "label")
    {
        let text = normalize(&text_excluding(label, Some(element)));
        if !text.is_empty() {
            return text;
        }
    }

    let nearby = nearby_label(element);
    if !nearby.is_empty() {
        return nearby;
    }

    if let Some(ids) = el.attr("aria-labelledby") {
        let text = joined_text(ids.split_whitespace().filter_map(|id| doc.element_by_id(id)), element);
        if !text.is_empty() {
            return text;
        }
    }

    el.attr("aria-label").map(normalize).unwrap_or_default()
}

/// A `.label`-like element or legend inside a small container that holds
/// only this control.
fn nearby_label(element: ElementRef<'_>) -> String {
    for container in element.ancestors().filter_map(ElementRef::wrap).take(LABEL_SEARCH_DEPTH) {
        let controls = container
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|d| matches!(d.value().name(), "input" | "select" | "textarea"))
            .count();
        if controls != 1 {
            break;
        }

        let found = container
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|d| *d != element && !is_ancestor_of(*d, element))
            .find(|d| {
                d.value().name() == "legend"
                    || d.value()
                        .attr("class")
                        .is_some_and(|c| c.to_ascii_lowercase().contains("label"))
            });
        if let Some(label) = found {
            let text = normalize(&element_text(label));
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

fn is_ancestor_of(candidate: ElementRef<'_>, element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a == candidate)
}

fn is_section_like(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if matches!(el.name(), "section" | "fieldset") {
        return true;
    }
    ["class", "id", "data-automation-id"]
        .iter()
        .filter_map(|a| el.attr(a))
        .any(|v| v.to_ascii_lowercase().contains("section"))
}

/// Heading text and wrapper test id of the nearest section-like ancestor.
pub fn resolve_context(element: ElementRef<'_>) -> String {
    let Some(section) = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| is_section_like(*a))
    else {
        return String::new();
    };

    let mut parts: Vec<String> = section
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|d| HEADING_TAGS.contains(&d.value().name()))
        .map(|h| normalize(&element_text(h)))
        .filter(|t| !t.is_empty())
        .collect();

    if let Some(test_id) = DATA_TEST_ATTRS.iter().find_map(|a| section.value().attr(a)) {
        parts.push(normalize(test_id));
    }
    parts.join(" ")
}

fn parent_text(element: ElementRef<'_>) -> String {
    let Some(parent) = element.parent().and_then(ElementRef::wrap) else {
        return String::new();
    };
    let text = normalize(&text_excluding(parent, Some(element)));
    if text.chars().count() > MAX_PARENT_TEXT {
        String::new()
    } else {
        text
    }
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<ControlId, Rc<SignalBundle>>,
}

/// Page-scoped signal cache. Single-threaded by construction; invalidation
/// drops everything rather than patching entries.
#[derive(Debug, Default)]
pub struct SignalCache {
    state: RefCell<CacheState>,
}

impl SignalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached bundle for `id`, extracting on first use. Snapshots older than
    /// the cache's generation bypass it entirely.
    pub fn bundle(&self, doc: &FormDocument<'_>, id: ControlId) -> Option<Rc<SignalBundle>> {
        let element = doc.control(id)?;
        let mut state = self.state.borrow_mut();

        if doc.generation() < state.generation {
            return Some(Rc::new(extract_signals(doc, element)));
        }
        if doc.generation() > state.generation {
            state.entries.clear();
            state.generation = doc.generation();
        }

        let bundle = state
            .entries
            .entry(id)
            .or_insert_with(|| Rc::new(extract_signals(doc, element)));
        Some(Rc::clone(bundle))
    }

    /// Drop every entry and move to `generation`.
    pub fn invalidate(&self, generation: u64) {
        let mut state = self.state.borrow_mut();
        state.entries.clear();
        state.generation = generation;
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
