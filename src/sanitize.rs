//! Untrusted quote text to embeddable markup.
//!
//! Quote bodies are stored raw except for newlines, which are rewritten to the storage line-break
//! marker before insert. On the way out every tag-shaped span is escaped unless it is the display
//! line break, so a submitted `<script>` renders as text while line breaks survive.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Line-break marker written into stored text.
pub const STORAGE_BREAK: &str = "<br />";

/// The only tag allowed to pass through [`sanitize_for_display`].
pub const DISPLAY_BREAK: &str = "<br>";

/// Escaped-slash spelling found in older rows.
const ESCAPED_SLASH_BREAK: &str = r"<br \/>";

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<]+)>").expect("valid tag regex"));

/// Rewrites every newline in `raw` into [`STORAGE_BREAK`].
///
/// `\r\n` pairs collapse into one marker. The transform is one-way.
pub fn normalize_for_storage(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\n', STORAGE_BREAK)
}

/// Renders stored text as markup safe to embed in an HTML document.
///
/// Storage line breaks (`<br />`, `<br \/>`) become `<br>` and pass through. Every other span
/// matching `<[^<]+>` is HTML-escaped. A `<` that does not open such a span is escaped as well;
/// the rest of the text is copied untouched.
pub fn sanitize_for_display(stored: &str) -> String {
    let normalized = stored
        .replace(STORAGE_BREAK, DISPLAY_BREAK)
        .replace(ESCAPED_SLASH_BREAK, DISPLAY_BREAK);

    let mut out = String::with_capacity(normalized.len());
    let mut last = 0;
    for tag in TAG_RE.find_iter(&normalized) {
        push_untagged(&mut out, &normalized[last..tag.start()]);
        if tag.as_str() == DISPLAY_BREAK {
            out.push_str(DISPLAY_BREAK);
        } else {
            out.push_str(&html_escape(tag.as_str()));
        }
        last = tag.end();
    }
    push_untagged(&mut out, &normalized[last..]);
    out
}

// Text between matched spans can only hold an unterminated `<`.
fn push_untagged(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch == '<' {
            out.push_str("&lt;");
        } else {
            out.push(ch);
        }
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'`; NUL becomes U+FFFD.
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'', '\0']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
