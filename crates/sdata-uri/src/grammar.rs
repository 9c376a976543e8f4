//! Path segment grammar.
//!
//! A protocol path is a `/`-separated list of segments, each of the form
//! `text` or `text(predicate)`:
//!
//! ```text
//! product/contract/-/accounts('A&B (UK)')/$service/getBalance(id eq 5)
//! ```
//!
//! Predicates may contain single- or double-quoted literals (the quote
//! character is doubled to escape it). Inside a literal, `)` and `/` lose
//! their meaning. Parsing never fails: a predicate without a closing `)` is
//! kept as plain text.

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

const PREDICATE_OPEN: char = '(';
const PREDICATE_CLOSE: char = ')';

/// Parse a path into ordered `(text, predicate)` pairs.
///
/// Empty segments (leading, trailing or doubled slashes) are dropped.
pub fn parse_path(path: &str) -> Vec<(String, Option<String>)> {
    let chars: Vec<char> = path.chars().collect();
    let mut pairs = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        if chars[pos] == PATH_SEPARATOR {
            pos += 1;
            continue;
        }

        let (text, predicate, next) = scan_segment(&chars, pos);
        pos = next;

        if text.is_empty() && predicate.is_none() {
            continue;
        }
        pairs.push((text, predicate));
    }

    pairs
}

/// Split a single raw segment into its text and predicate.
///
/// Anything that does not parse as exactly one `text(predicate)` unit is
/// returned whole as text.
pub fn split_segment(raw: &str) -> (String, Option<String>) {
    let chars: Vec<char> = raw.chars().collect();
    let (text, predicate, next) = scan_segment(&chars, 0);

    if next == chars.len() {
        (text, predicate)
    } else {
        (raw.to_string(), None)
    }
}

/// Render one segment.
pub fn render_segment(text: &str, predicate: Option<&str>) -> String {
    match predicate {
        Some(predicate) => {
            let mut out = String::with_capacity(text.len() + predicate.len() + 2);
            out.push_str(text);
            out.push(PREDICATE_OPEN);
            out.push_str(predicate);
            out.push(PREDICATE_CLOSE);
            out
        }
        None => text.to_string(),
    }
}

/// Render segments joined with [`PATH_SEPARATOR`].
pub fn render_path<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    segments
        .into_iter()
        .map(|(text, predicate)| render_segment(text, predicate))
        .collect::<Vec<_>>()
        .join("/")
}

/// Characters percent-escaped when a decoded path is written into a URI.
const PATH_RESERVED: &[char] = &['%', '?', '#'];

/// Escape a decoded path for use inside a full URI.
///
/// Only `%`, `?` and `#` are escaped, which is exactly what parsing a URI
/// needs to recover the same path after percent-decoding.
pub fn encode_path(path: &str) -> String {
    crate::codec::percent_escape(path, PATH_RESERVED).into_owned()
}

/// Scan one `text[(predicate)]` unit starting at `start`.
///
/// Returns the text, the predicate and the index just past the unit. The
/// unit stops at a separator, or right after a closed predicate.
fn scan_segment(chars: &[char], start: usize) -> (String, Option<String>, usize) {
    let mut pos = start;
    while pos < chars.len() && chars[pos] != PATH_SEPARATOR && chars[pos] != PREDICATE_OPEN {
        pos += 1;
    }

    if pos < chars.len() && chars[pos] == PREDICATE_OPEN {
        if let Some(close) = find_predicate_close(chars, pos) {
            let text = chars[start..pos].iter().collect();
            let predicate = chars[pos + 1..close].iter().collect();
            return (text, Some(predicate), close + 1);
        }

        // Unterminated: the rest of the segment is plain text.
        while pos < chars.len() && chars[pos] != PATH_SEPARATOR {
            pos += 1;
        }
    }

    (chars[start..pos].iter().collect(), None, pos)
}

/// Find the `)` matching the `(` at `open`, skipping quoted literals and
/// balancing nested parentheses.
fn find_predicate_close(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut pos = open + 1;

    while pos < chars.len() {
        let c = chars[pos];
        match quote {
            Some(q) if c == q => {
                if chars.get(pos + 1) == Some(&q) {
                    pos += 1;
                } else {
                    quote = None;
                }
            }
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                PREDICATE_OPEN => depth += 1,
                PREDICATE_CLOSE if depth == 0 => return Some(pos),
                PREDICATE_CLOSE => depth -= 1,
                _ => {}
            },
        }
        pos += 1;
    }

    None
}
