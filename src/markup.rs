//! Inline markup: escaping, emphasis spans, code spans and autolinks.
//!
//! [`render_inline`] runs the full pipeline on a raw message body:
//!
//! 1. Escape `<`, `>`, `"` and `'` so user text cannot inject tags.
//! 2. If the body contains a ```` ``` ```` marker, turn marker pairs into
//!    `<code>`/`</code>` and skip step 3.
//! 3. Otherwise, for each toggle character (`_` → `em`, `*` → `strong`,
//!    `~` → `del`) independently: an even, non-zero count is replaced by
//!    alternating open/close tags; an odd count is left as literal text.
//! 4. Wrap link-shaped text in `<a href="..." target="_blank">`, adding an
//!    `http://` scheme to the `href` when the text has none.
//! 5. Turn embedded newlines into `<br>` followed by a newline.
//!
//! # Example
//!
//! ```rust
//! use chathtml::markup::render_inline;
//! use chathtml::parsing::Grammar;
//!
//! let grammar = Grammar::new()?;
//! assert_eq!(render_inline(&grammar, "Hello *world*!"), "Hello <strong>world</strong>!");
//! assert_eq!(render_inline(&grammar, "unterminated _em"), "unterminated _em");
//! # Ok::<(), chathtml::ChatHtmlError>(())
//! ```

use regex::Captures;

use crate::parsing::Grammar;

/// Toggle characters and the element each one maps to.
pub const FORMAT_SPANS: [(char, &str); 3] = [('_', "em"), ('*', "strong"), ('~', "del")];

/// Marker delimiting a code span.
pub const CODE_MARKER: &str = "```";

// Punctuation that usually ends a sentence rather than a URL
const LINK_TRAILING: &[char] = &['.', ',', '!', '?', ';', ':', ')'];

// Entities produced by `escape_html`; a link never runs into one
const ESCAPED_ENTITIES: [&str; 4] = ["&lt;", "&gt;", "&quot;", "&apos;"];

/// Runs the whole inline pipeline on a raw body.
pub fn render_inline(grammar: &Grammar, raw: &str) -> String {
    let escaped = escape_html(raw);

    let spanned = if escaped.contains(CODE_MARKER) {
        apply_code_spans(&escaped)
    } else {
        FORMAT_SPANS
            .iter()
            .fold(escaped, |text, &(marker, tag)| apply_toggle(&text, marker, tag))
    };

    let linked = autolink(grammar, &spanned);
    convert_line_breaks(&linked)
}

/// Escapes the four HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replaces pairs of code markers with `<code>`/`</code>`.
///
/// A final unpaired marker is kept as literal text.
pub fn apply_code_spans(text: &str) -> String {
    let parts: Vec<&str> = text.split(CODE_MARKER).collect();
    let markers = parts.len() - 1;
    let paired = markers - markers % 2;

    let mut out = String::with_capacity(text.len() + markers * 4);
    for (i, part) in parts.iter().enumerate() {
        out.push_str(part);
        if i < markers {
            if i >= paired {
                out.push_str(CODE_MARKER);
            } else if i % 2 == 0 {
                out.push_str("<code>");
            } else {
                out.push_str("</code>");
            }
        }
    }
    out
}

/// Replaces occurrences of `marker` with alternating `<tag>`/`</tag>`.
///
/// Text is returned unchanged unless the marker count is even and non-zero,
/// so an opening tag is never left without its closing tag.
pub fn apply_toggle(text: &str, marker: char, tag: &str) -> String {
    let count = text.chars().filter(|&c| c == marker).count();
    if count == 0 || count % 2 != 0 {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + count * (tag.len() + 3));
    let mut open = false;
    for c in text.chars() {
        if c == marker {
            out.push('<');
            if open {
                out.push('/');
            }
            out.push_str(tag);
            out.push('>');
            open = !open;
        } else {
            out.push(c);
        }
    }
    out
}

/// Wraps link-shaped substrings in anchors that open a new tab.
///
/// Matches are replaced left to right in one pass, so inserted markup is
/// never rescanned. A match is cut at the first escaped entity; the entity
/// and anything after it are written back unchanged.
pub fn autolink(grammar: &Grammar, text: &str) -> String {
    grammar
        .link()
        .replace_all(text, |caps: &Captures| {
            let matched = caps.get(0).map_or("", |m| m.as_str());
            let end = ESCAPED_ENTITIES
                .iter()
                .filter_map(|entity| matched.find(entity))
                .min()
                .unwrap_or(matched.len());
            let link = matched[..end].trim_end_matches(LINK_TRAILING);
            let trailing = &matched[link.len()..];
            format!(
                r#"<a href="{}" target="_blank">{link}</a>{trailing}"#,
                href_for(link)
            )
        })
        .into_owned()
}

fn href_for(link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("http://{link}")
    }
}

/// `\n` → `<br>\n`
pub fn convert_line_breaks(text: &str) -> String {
    text.replace('\n', "<br>\n")
}
