//! Markdown-to-HTML conversion and the HTML document shell.

use pulldown_cmark::{Options, Parser, html};
use tracing::debug;

/// Convert Markdown to a complete HTML document.
///
/// Tables, strikethrough, and fenced code blocks are supported. When `css` is
/// given it is placed verbatim inside a `<style>` block in the head.
pub fn markdown_to_html(markdown: &str, css: Option<&str>) -> String {
    let body = markdown_to_fragment(markdown);
    debug!(markdown_len = markdown.len(), html_len = body.len(), "markdown converted");
    wrap_document(&body, css)
}

/// Convert Markdown to an HTML fragment (no `<html>` shell).
pub fn markdown_to_fragment(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Wrap an HTML fragment in a minimal UTF-8 document.
fn wrap_document(body: &str, css: Option<&str>) -> String {
    let mut doc = String::with_capacity(body.len() + css.map_or(0, str::len) + 160);
    doc.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    if let Some(css) = css {
        doc.push_str("<style>\n");
        doc.push_str(css);
        doc.push_str("\n</style>\n");
    }
    doc.push_str("</head>\n<body>\n");
    doc.push_str(body);
    doc.push_str("</body>\n</html>\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn count(doc: &Html, selector: &str) -> usize {
        doc.select(&Selector::parse(selector).unwrap()).count()
    }

    #[test]
    fn headings_and_lists_survive() {
        let md = "# Test Heading\n\nThis is a test paragraph.\n\n* Item 1\n* Item 2\n* Item 3\n";
        let html = markdown_to_html(md, None);

        assert!(html.contains("<h1>Test Heading</h1>"));
        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>Item 1</li>"));
        assert!(!html.contains("<style>"));
    }

    #[test]
    fn tables_render() {
        let md = "## Skills\n\n| Skill | Level |\n|---|---|\n| Python | Expert |\n| Testing | Advanced |\n";
        let doc = Html::parse_document(&markdown_to_html(md, None));

        assert_eq!(count(&doc, "table"), 1);
        assert_eq!(count(&doc, "th"), 2);
        assert_eq!(count(&doc, "tbody tr"), 2);
    }

    #[test]
    fn fenced_code_renders() {
        let md = "```rust\nfn main() {}\n```\n";
        let html = markdown_to_html(md, None);
        assert!(html.contains("<pre><code class=\"language-rust\">fn main() {}"));
    }

    #[test]
    fn stylesheet_injected_verbatim() {
        let css = "body { font-family: Arial; }\nh1 > span { color: #333; }";
        let html = markdown_to_html("# Test Heading", Some(css));

        let style_start = html.find("<style>").expect("style block");
        let head_end = html.find("</head>").expect("head end");
        assert!(style_start < head_end);
        assert!(html.contains(css));
    }

    #[test]
    fn document_shell_is_utf8() {
        let html = markdown_to_html("Zoë", None);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
        assert!(html.contains("<p>Zoë</p>"));
    }

    #[test]
    fn already_rendered_html_passes_through() {
        let fragment = markdown_to_fragment("# Title\n\n- one\n- two\n");
        let again = markdown_to_fragment(&fragment);

        let first = Html::parse_fragment(&fragment);
        let second = Html::parse_fragment(&again);
        for sel in ["h1", "ul", "li"] {
            assert_eq!(count(&first, sel), count(&second, sel), "selector {sel}");
        }
    }

    #[test]
    fn rendered_semantics_stable_across_documents() {
        let md = "# Jane Smith\n\n## Experience\n\n- Built things\n- Tested things\n";
        let first = Html::parse_document(&markdown_to_html(md, None));
        let second = Html::parse_document(&markdown_to_html(md, Some("p {}")));

        for sel in ["h1", "h2", "li"] {
            assert_eq!(count(&first, sel), count(&second, sel), "selector {sel}");
        }
    }
}
