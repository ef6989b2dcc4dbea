use std::collections::HashSet;

use linkify::{LinkFinder, LinkKind};

pub const EMPTY_BODY: &str = "(No text content)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText {
    pub text: String,
    pub links: Vec<String>,
}

/// Renders a message body for the terminal.
///
/// The plain text part wins when it has any content. Otherwise the HTML part
/// is sanitised and rendered at `width_cols`. Either way entities are decoded
/// and runs of blank lines collapse to one.
pub fn display_body(text: Option<&str>, html: Option<&str>, width_cols: usize) -> DisplayText {
    let plain = text.filter(|t| !t.trim().is_empty());
    let rendered = match (plain, html.filter(|h| !h.trim().is_empty())) {
        (Some(plain), _) => plain.to_string(),
        (None, Some(html)) => render_html(html, width_cols.max(20)),
        (None, None) => String::new(),
    };

    let decoded = html_escape::decode_html_entities(&rendered).to_string();
    let text = collapse_blank_lines(&decoded);
    if text.is_empty() {
        return DisplayText {
            text: EMPTY_BODY.to_string(),
            links: Vec::new(),
        };
    }
    let links = find_links(&text);
    DisplayText { text, links }
}

fn sanitize_html(html: &str) -> String {
    // script and style bodies are dropped, not unwrapped
    ammonia::Builder::default()
        .add_tags(["font"])
        .add_tag_attributes("font", ["color"])
        .clean(html)
        .to_string()
}

fn render_html(html: &str, width_cols: usize) -> String {
    let sanitized = sanitize_html(html);
    html2text::from_read(sanitized.as_bytes(), width_cols)
}

/// Unique URLs in order of first appearance.
pub fn find_links(text: &str) -> Vec<String> {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]);
    let mut seen = HashSet::new();
    finder
        .links(text)
        .map(|link| link.as_str().to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn collapse_blank_lines(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_blank = true;
    for line in text.split('\n') {
        let line = line.trim_end();
        let blank = line.is_empty();
        if blank && prev_blank {
            continue;
        }
        lines.push(line);
        prev_blank = blank;
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{EMPTY_BODY, collapse_blank_lines, display_body, find_links};

    #[test]
    fn plain_text_preferred_over_html() {
        let out = display_body(Some("Hello there"), Some("<p>ignored</p>"), 80);
        assert_eq!(out.text, "Hello there");
    }

    #[test]
    fn html_used_when_text_is_blank() {
        let out = display_body(Some("  \n"), Some("<p>Hi <b>Bob</b></p><script>x()</script>"), 80);
        assert!(out.text.contains("Hi"));
        assert!(out.text.contains("Bob"));
        assert!(!out.text.contains("x()"));
        assert!(!out.text.contains("<p>"));
    }

    #[test]
    fn empty_body_gets_placeholder() {
        assert_eq!(display_body(None, None, 80).text, EMPTY_BODY);
        assert_eq!(display_body(Some(""), Some("   "), 80).text, EMPTY_BODY);
    }

    #[test]
    fn entities_are_decoded() {
        let out = display_body(Some("Fish &amp; chips"), None, 80);
        assert_eq!(out.text, "Fish & chips");
    }

    #[test]
    fn blank_runs_collapse() {
        assert_eq!(collapse_blank_lines("a\r\n\r\n\r\n\nb  \n\n"), "a\n\nb");
        assert_eq!(collapse_blank_lines("\n\nstart"), "start");
    }

    #[test]
    fn links_are_unique_and_ordered() {
        let links = find_links("see https://a.example/x and https://b.example then https://a.example/x");
        assert_eq!(links, vec!["https://a.example/x", "https://b.example"]);
        let out = display_body(Some("Docs: https://resend.com/docs"), None, 80);
        assert_eq!(out.links, vec!["https://resend.com/docs"]);
    }
}
