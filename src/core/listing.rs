use std::fmt::Write;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::ports::file_system::DirEntry;

/// Characters escaped in listing hrefs so a file name is always read as a
/// single relative path segment.
const HREF_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn href(entry: &DirEntry) -> String {
    let mut href = utf8_percent_encode(&entry.name, HREF_ESCAPE).to_string();
    // "a:b" would otherwise be read as a URL scheme
    if entry.name.contains(':') {
        href.insert_str(0, "./");
    }
    if entry.is_dir {
        href.push('/');
    }
    escape_html(&href)
}

/// Render a minimal HTML listing, one link per entry, in the given order
pub fn render_listing(entries: &[DirEntry]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for entry in entries {
        let mut label = escape_html(&entry.name);
        if entry.is_dir {
            label.push('/');
        }
        // Writing into a String cannot fail
        let _ = writeln!(html, "<a href=\"{}\">{}</a>", href(entry), label);
    }
    html.push_str("</pre>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, is_dir: bool) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            is_dir,
        }
    }

    #[test]
    fn test_render_lists_entries_in_order() {
        let html = render_listing(&[entry("a.txt", false), entry("sub", true)]);
        let a = html.find("<a href=\"a.txt\">a.txt</a>").unwrap();
        let sub = html.find("<a href=\"sub/\">sub/</a>").unwrap();
        assert!(a < sub);
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.ends_with("</pre>\n"));
    }

    #[test]
    fn test_render_escapes_names() {
        let html = render_listing(&[entry("<b>&co?.txt", false)]);
        assert!(html.contains("href=\"%3Cb%3E&amp;co%3F.txt\""));
        assert!(html.contains(">&lt;b&gt;&amp;co?.txt</a>"));
    }

    #[test]
    fn test_colon_names_are_made_relative() {
        let html = render_listing(&[entry("c:d", false)]);
        assert!(html.contains("href=\"./c:d\""));
    }

    #[test]
    fn test_empty_directory() {
        let html = render_listing(&[]);
        assert!(!html.contains("<a "));
        assert!(html.contains("<pre>\n</pre>"));
    }
}
