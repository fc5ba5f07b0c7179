//! HTML → [`PageContent`] extraction.
//!
//! Pure function of the HTML string. Parsing goes through `scraper`
//! (html5ever), which recovers from broken markup the way browsers do, so
//! malformed input degrades to fallback values instead of failing.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use founderfuel_shared::{BODY_TEXT_LIMIT, PageContent};

/// Title used when the document has no non-empty `<title>`.
pub const TITLE_FALLBACK: &str = "No title found";

/// Description used when neither meta description is present.
pub const DESCRIPTION_FALLBACK: &str = "No description found";

/// Elements whose whole subtree never contributes body text.
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "iframe"];

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static META_DESCRIPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).expect("valid selector"));
static OG_DESCRIPTION_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:description"]"#).expect("valid selector")
});
static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Extract title, description, and bounded body text from raw HTML.
pub fn extract_content(html: &str) -> PageContent {
    let doc = Html::parse_document(html);

    PageContent {
        title: extract_title(&doc),
        description: extract_description(&doc),
        body_text: extract_body_text(&doc),
    }
}

fn extract_title(doc: &Html) -> String {
    doc.select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| TITLE_FALLBACK.to_string())
}

fn extract_description(doc: &Html) -> String {
    meta_content(doc, &META_DESCRIPTION_SEL)
        .or_else(|| meta_content(doc, &OG_DESCRIPTION_SEL))
        .unwrap_or_else(|| DESCRIPTION_FALLBACK.to_string())
}

/// Trimmed, non-empty `content` attribute of the first element matching `sel`.
fn meta_content(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn extract_body_text(doc: &Html) -> String {
    let mut raw = String::new();
    if let Some(body) = doc.select(&BODY_SEL).next() {
        collect_text(body, &mut raw);
    }

    let collapsed = WHITESPACE_RE.replace_all(&raw, " ");
    collapsed.trim().chars().take(BODY_TEXT_LIMIT).collect()
}

/// Append the text of `element`'s subtree, skipping [`SKIPPED_TAGS`] subtrees.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !SKIPPED_TAGS.contains(&child_el.value().name()) {
                collect_text(child_el, out);
            }
        }
    }
}
