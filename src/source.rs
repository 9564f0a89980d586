//! Text sources: where the narrated text comes from.

use std::path::Path;

use anyhow::Context as _;
use scraper::{ElementRef, Html, Node, Selector};

use crate::foundation::error::ReelResult;

/// Produces the visible text of a document.
pub trait TextSource {
    /// Visible text, deterministic for a given document state.
    fn extract_visible_text(&self) -> ReelResult<String>;
}

/// Text that is already plain.
#[derive(Clone, Debug)]
pub struct PlainText {
    text: String,
}

impl PlainText {
    /// Wrap `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a UTF-8 text file.
    pub fn from_file(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read text '{}'", path.display()))?;
        Ok(Self { text })
    }
}

impl TextSource for PlainText {
    fn extract_visible_text(&self) -> ReelResult<String> {
        Ok(self.text.trim().to_string())
    }
}

/// Tags whose text is never shown.
const IGNORED_TAGS: [&str; 7] = [
    "script", "style", "noscript", "meta", "link", "iframe", "template",
];

/// An HTML document; visible text is collected from `<body>`.
#[derive(Clone, Debug)]
pub struct HtmlDocument {
    html: String,
}

impl HtmlDocument {
    /// Wrap an HTML string.
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Read an HTML file.
    pub fn from_file(path: &Path) -> ReelResult<Self> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("read html '{}'", path.display()))?;
        Ok(Self { html })
    }
}

impl TextSource for HtmlDocument {
    /// Trimmed text nodes joined by single spaces, skipping non-content tags and elements hidden by
    /// `hidden`, `aria-hidden="true"` or inline `display:none` / `visibility:hidden` / `opacity:0`.
    fn extract_visible_text(&self) -> ReelResult<String> {
        let doc = Html::parse_document(&self.html);
        let mut parts = Vec::new();
        match Selector::parse("body")
            .ok()
            .and_then(|sel| doc.select(&sel).next())
        {
            Some(body) => collect_visible(body, &mut parts),
            None => collect_visible(doc.root_element(), &mut parts),
        }
        Ok(parts.join(" "))
    }
}

fn collect_visible<'a>(el: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                let s = t.trim();
                if !s.is_empty() {
                    out.push(s);
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child)
                    && is_visible(child_el)
                {
                    collect_visible(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn is_visible(el: ElementRef<'_>) -> bool {
    let e = el.value();
    if IGNORED_TAGS.contains(&e.name()) {
        return false;
    }
    if e.attr("hidden").is_some() || e.attr("aria-hidden") == Some("true") {
        return false;
    }
    e.attr("style").is_none_or(|style| !style_hides(style))
}

fn style_hides(style: &str) -> bool {
    style.split(';').any(|decl| {
        let Some((prop, value)) = decl.split_once(':') else {
            return false;
        };
        let value = value.trim().trim_end_matches("!important").trim();
        match prop.trim().to_ascii_lowercase().as_str() {
            "display" => value.eq_ignore_ascii_case("none"),
            "visibility" => value.eq_ignore_ascii_case("hidden"),
            "opacity" => value.parse::<f32>().is_ok_and(|o| o == 0.0),
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_trimmed() {
        let src = PlainText::new("  Hello world.  \n");
        assert_eq!(src.extract_visible_text().unwrap(), "Hello world.");
    }

    #[test]
    fn html_skips_non_content_tags() {
        let doc = HtmlDocument::new(
            r#"<html><head><title>T</title><style>p{}</style></head>
            <body><p>First line.</p><script>var x = 1;</script>
            <noscript>Enable JS.</noscript><div>Second <b>line</b>.</div></body></html>"#,
        );
        assert_eq!(
            doc.extract_visible_text().unwrap(),
            "First line. Second line ."
        );
    }

    #[test]
    fn html_skips_hidden_subtrees() {
        let doc = HtmlDocument::new(
            r#"<body>
              <p>Shown.</p>
              <div style="display: none"><p>Gone.</p></div>
              <p style="opacity:0">Invisible.</p>
              <p hidden>Hidden.</p>
              <p aria-hidden="true">Decor.</p>
              <p style="color: red; visibility:hidden !important">Nope.</p>
              <p style="opacity: 0.5">Faded.</p>
            </body>"#,
        );
        assert_eq!(doc.extract_visible_text().unwrap(), "Shown. Faded.");
    }

    #[test]
    fn style_parser_ignores_unrelated_declarations() {
        assert!(!style_hides("color: black; margin: 0"));
        assert!(style_hides("DISPLAY:NONE"));
        assert!(!style_hides("display"));
    }
}
