//! Markdown extraction for entry ingestion.
//!
//! # Responsibility
//! - Render markdown bytes to HTML.
//! - Split rendered HTML into a title (first line) and content (the rest).
//!
//! # Invariants
//! - Extraction is pure and deterministic; the same bytes always yield the
//!   same `(title, content)` pair.
//! - Empty input yields empty title and content, never an error.

use pulldown_cmark::{html, Options, Parser};

/// Renders markdown text to HTML.
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Extracts `(title, content)` from raw markdown bytes.
///
/// Rules:
/// - `title`: first rendered HTML line with its wrapping tag removed, so
///   `# Title` becomes `Title`.
/// - `content`: rendered HTML after the first newline, trimmed.
/// - Output without any newline is a title-only document (`content` empty).
///
/// Invalid UTF-8 sequences are replaced before rendering.
pub fn extract_title_and_content(raw: &[u8]) -> (String, String) {
    if raw.is_empty() {
        return (String::new(), String::new());
    }

    let source = String::from_utf8_lossy(raw);
    let rendered = render_html(&source);
    let (first_line, rest) = match rendered.find('\n') {
        Some(idx) => rendered.split_at(idx),
        None => (rendered.as_str(), ""),
    };

    (
        strip_wrapping_tag(first_line).to_string(),
        rest.trim().to_string(),
    )
}

// Text between the first `>` and the last `<`. A line that only opens a tag
// (a paragraph continued on the next line) keeps everything after the `>`.
fn strip_wrapping_tag(line: &str) -> &str {
    let Some(open_idx) = line.find('>') else {
        return line.trim();
    };
    let inner_start = open_idx + 1;
    match line.rfind('<') {
        Some(close_idx) if close_idx >= inner_start => &line[inner_start..close_idx],
        _ => &line[inner_start..],
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_title_and_content, render_html, strip_wrapping_tag};

    #[test]
    fn heading_document_splits_title_and_content() {
        let (title, content) = extract_title_and_content(b"# title\n\n## content");
        assert_eq!(title, "title");
        assert_eq!(content, "<h2>content</h2>");
    }

    #[test]
    fn empty_input_yields_empty_pair() {
        assert_eq!(
            extract_title_and_content(b""),
            (String::new(), String::new())
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let source = b"# readme\n\n[link](https://example.com)\n\n- one\n- two\n";
        assert_eq!(
            extract_title_and_content(source),
            extract_title_and_content(source)
        );
    }

    #[test]
    fn content_keeps_multiple_blocks() {
        let (title, content) =
            extract_title_and_content(b"# readme\n\n[link](https://example.com)\n\n- one\n- two\n");
        assert_eq!(title, "readme");
        assert!(content.starts_with("<p><a href="));
        assert!(content.ends_with("</ul>"));
    }

    #[test]
    fn single_paragraph_is_title_only() {
        let (title, content) = extract_title_and_content(b"just one line");
        assert_eq!(title, "just one line");
        assert!(content.is_empty());
    }

    #[test]
    fn inline_markup_in_title_is_preserved() {
        let (title, _) = extract_title_and_content(b"# a *b* c\n\nbody");
        assert_eq!(title, "a <em>b</em> c");
    }

    #[test]
    fn wrapped_paragraph_keeps_text_after_opening_tag() {
        assert_eq!(strip_wrapping_tag("<p>line one"), "line one");
        assert_eq!(strip_wrapping_tag("plain"), "plain");
        assert_eq!(strip_wrapping_tag("<h1>Title</h1>"), "Title");
    }

    #[test]
    fn wrapped_first_paragraph_splits_at_first_newline() {
        let (title, content) = extract_title_and_content(b"line one\nline two\n\nbody");
        assert_eq!(title, "line one");
        assert_eq!(content, "line two</p>\n<p>body</p>");
    }

    #[test]
    fn render_supports_tables() {
        let html = render_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }
}
