//! Text helpers shared by signal extraction and the job strategies.

use scraper::ElementRef;

const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "main", "aside", "li", "ul", "ol",
    "h1", "h2", "h3", "h4", "h5", "h6", "tr", "table", "dd", "dt", "dl", "br", "form",
    "fieldset", "legend", "label", "nav", "blockquote", "pre",
];

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-case and collapse whitespace; the form every signal is stored in.
pub fn normalize(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

/// Visible text of an element, whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    text_excluding(element, None)
}

/// Visible text of `root` with the subtree of `skip` left out.
pub fn text_excluding<'a>(root: ElementRef<'a>, skip: Option<ElementRef<'a>>) -> String {
    let mut out = String::new();
    push_text(root, skip, &mut out);
    collapse_whitespace(&out)
}

fn push_text<'a>(element: ElementRef<'a>, skip: Option<ElementRef<'a>>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&**text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if Some(child_el) == skip || HIDDEN_TAGS.contains(&child_el.value().name()) {
                continue;
            }
            out.push(' ');
            push_text(child_el, skip, out);
            out.push(' ');
        }
    }
}

/// Visible text with a line break after every block-level element, so
/// labelled lines ("Location: Berlin") survive as separate lines.
pub fn block_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_block_text(root, &mut out);
    out.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_block_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&text.replace('\n', " "));
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if HIDDEN_TAGS.contains(&name) {
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            push_block_text(child_el, out);
            if block {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_text_excluding_skips_subtree_and_scripts() {
        let html = Html::parse_fragment(
            r#"<label id="l">Country <select id="s"><option>Canada</option></select><script>x()</script></label>"#,
        );
        let label = html.select(&Selector::parse("#l").unwrap()).next().unwrap();
        let select = html.select(&Selector::parse("#s").unwrap()).next().unwrap();

        assert_eq!(text_excluding(label, Some(select)), "Country");
        assert_eq!(element_text(label), "Country Canada");
    }

    #[test]
    fn test_block_text_keeps_lines() {
        let html = Html::parse_document(
            "<body><div>Job Title: Rust Engineer</div><p>Location:  <b>Berlin</b></p></body>",
        );
        let text = block_text(html.root_element());
        assert_eq!(text, "Job Title: Rust Engineer\nLocation: Berlin");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  First\n  NAME "), "first name");
    }
}
