//! Rich-text sanitizing
//!
//! Note bodies are stored as a small HTML subset and rendered as live markup,
//! so everything outside that subset is stripped before display. Parsing goes
//! through html5ever (via `scraper`) so malformed input is normalized the same
//! way a browser would see it.

use scraper::{ElementRef, Html, Node};

/// Tags kept in sanitized output
const ALLOWED_TAGS: &[&str] = &[
    "strong",
    "em",
    "u",
    "s",
    "p",
    "br",
    "blockquote",
    "code",
    "pre",
    "ul",
    "ol",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "a",
    "span",
    "div",
];

/// Attributes kept on allowed tags
const ALLOWED_ATTRS: &[&str] = &["href", "target", "rel", "class"];

/// Elements removed together with everything inside them
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "style", "template", "iframe", "object", "embed", "noscript", "textarea", "title",
    "svg", "math", "select", "xmp", "noembed", "noframes",
];

/// URL schemes allowed in `href`
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Elements that end a line when rendered as plain text
const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "br",
    "li",
    "blockquote",
    "pre",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
];

/// Strip everything outside the allowed rich-text subset
///
/// Disallowed elements are unwrapped (their text survives) unless they are
/// script-like, in which case their content is dropped too. Comments and
/// unsafe `href` values are removed.
pub fn sanitize_html(dirty: &str) -> String {
    if dirty.is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(dirty);
    let mut out = String::with_capacity(dirty.len());
    write_children(fragment.root_element(), &mut out);
    out
}

/// Text content of a rich-text body, one line per block element
pub fn plain_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    collect_text(fragment.root_element(), &mut out);

    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// True when the body has no visible text once markup is removed
pub fn is_blank(html: &str) -> bool {
    plain_text(html).trim().is_empty()
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => escape_into(text, out),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(element, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();

    if DROP_WITH_CONTENT.contains(&name) {
        return;
    }
    if !ALLOWED_TAGS.contains(&name) {
        write_children(element, out);
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        if !ALLOWED_ATTRS.contains(&attr) {
            continue;
        }
        if attr == "href" && !is_safe_url(value) {
            continue;
        }
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_into(value, out);
        out.push('"');
    }
    out.push('>');

    if name == "br" {
        return;
    }

    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn collect_text(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = element.value().name();
                if DROP_WITH_CONTENT.contains(&name) {
                    continue;
                }
                collect_text(element, out);
                if BLOCK_TAGS.contains(&name) && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Whether an `href` is safe to render
///
/// Relative URLs and the schemes in [`SAFE_SCHEMES`] pass. Browsers ignore
/// ASCII whitespace and control characters inside a scheme, so those are
/// removed before it is inspected.
fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();

    match cleaned.find(':') {
        Some(colon) => {
            let before = &cleaned[..colon];
            // A colon after a path, query or fragment delimiter is not a scheme
            if before.contains(['/', '?', '#']) {
                return true;
            }
            SAFE_SCHEMES.contains(&before)
        }
        None => true,
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
