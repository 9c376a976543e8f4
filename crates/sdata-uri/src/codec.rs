//! Query string codec.
//!
//! Parses and builds `name=value` pairs joined by a separator. Some
//! arguments (`where`, `search`) may carry values that contain the
//! separator; those are written in a quoted "complex" form:
//!
//! ```text
//! where="name eq 'A&B'"&count=10
//! ```

use std::borrow::Cow;

/// Default argument separator.
pub const DEFAULT_SEPARATOR: char = '&';

const COMPLEX_QUOTE: char = '"';
const COMPLEX_ESCAPE: char = '\\';

/// Characters that would end or corrupt a query value inside a full URI.
const VALUE_RESERVED: &[char] = &['%', '#'];

/// Ordered, case-insensitive query argument map.
///
/// Iteration follows the order in which names were first set; overwriting an
/// existing name keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    entries: Vec<(String, String)>,
}

impl QueryArgs {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Look up a value by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    /// Whether an argument with this name is present
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set a value, replacing any existing value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Remove an argument, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate `(name, value)` pairs in render order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for QueryArgs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut args = Self::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

/// Query string parser/builder for one separator and set of complex args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCodec {
    separator: char,
    complex_args: Vec<String>,
}

impl Default for QueryCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl QueryCodec {
    /// Codec with no complex arguments
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            complex_args: Vec::new(),
        }
    }

    /// Register argument names whose values may be quoted
    pub fn with_complex_args<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.complex_args = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn complex_args(&self) -> &[String] {
        &self.complex_args
    }

    fn is_complex(&self, name: &str) -> bool {
        self.complex_args
            .iter()
            .any(|complex| complex.eq_ignore_ascii_case(name))
    }

    /// Parse a query string, honouring complex arguments.
    pub fn parse(&self, query: &str) -> QueryArgs {
        let mut args = QueryArgs::new();
        self.parse_into(query, &mut args);
        args
    }

    fn parse_into(&self, query: &str, args: &mut QueryArgs) {
        let Some((name, name_start, value_start)) = self.find_complex(query) else {
            parse_simple_into(query, self.separator, args);
            return;
        };

        parse_simple_into(&query[..name_start], self.separator, args);

        let rest = &query[value_start..];
        let (value, consumed) = if rest.starts_with(COMPLEX_QUOTE) {
            match scan_quoted(rest) {
                Some((value, consumed)) => (decode(&value), consumed),
                None => {
                    let (raw, consumed) = scan_to_separator(rest, self.separator);
                    (decode(raw), consumed)
                }
            }
        } else {
            let (raw, consumed) = scan_to_separator(rest, self.separator);
            (decode(raw), consumed)
        };

        args.insert(name, value);
        self.parse_into(&rest[consumed..], args);
    }

    /// Earliest complex argument at an argument boundary.
    ///
    /// Returns the name as written, the byte offset of the name and the byte
    /// offset of its value.
    fn find_complex<'q>(&self, query: &'q str) -> Option<(&'q str, usize, usize)> {
        let lowered = query.to_ascii_lowercase();
        let mut best: Option<(&'q str, usize, usize)> = None;

        for complex in &self.complex_args {
            let needle = format!("{}=", complex.to_ascii_lowercase());
            let mut from = 0;
            while let Some(found) = lowered[from..].find(&needle) {
                let start = from + found;
                let at_boundary = start == 0
                    || query[..start].ends_with(self.separator);
                if at_boundary {
                    if best.map_or(true, |(_, best_start, _)| start < best_start) {
                        let name = &query[start..start + complex.len()];
                        best = Some((name, start, start + needle.len()));
                    }
                    break;
                }
                from = start + needle.len();
            }
        }

        best
    }

    /// Build a query string from arguments in order.
    ///
    /// Values are written verbatim apart from `%` and `#`, which are
    /// percent-escaped; only complex arguments that would not survive a
    /// re-parse are quoted.
    pub fn build(&self, args: &QueryArgs) -> String {
        let sep = self.separator.to_string();
        args.iter()
            .map(|(name, value)| {
                let value = percent_escape(value, VALUE_RESERVED);
                if self.is_complex(name) && needs_quoting(&value, self.separator) {
                    format!("{}={}", name, quote(&value))
                } else {
                    format!("{}={}", name, value)
                }
            })
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

/// Parse `query` with no complex arguments.
pub fn parse_simple(query: &str, separator: char) -> QueryArgs {
    let mut args = QueryArgs::new();
    parse_simple_into(query, separator, &mut args);
    args
}

fn parse_simple_into(query: &str, separator: char, args: &mut QueryArgs) {
    for piece in query.split(separator) {
        if piece.is_empty() {
            continue;
        }
        match piece.split_once('=') {
            Some((name, value)) => args.insert(name, decode(value)),
            None => args.insert(piece, String::new()),
        }
    }
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| value.to_string())
}

/// Scan a `"..."` value; returns the unescaped content and bytes consumed.
fn scan_quoted(rest: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = rest.char_indices().skip(1);

    while let Some((idx, c)) = chars.next() {
        match c {
            COMPLEX_ESCAPE
                if rest[idx + 1..].starts_with([COMPLEX_QUOTE, COMPLEX_ESCAPE]) =>
            {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            }
            COMPLEX_QUOTE => return Some((value, idx + 1)),
            _ => value.push(c),
        }
    }

    None
}

fn scan_to_separator(rest: &str, separator: char) -> (&str, usize) {
    match rest.find(separator) {
        Some(end) => (&rest[..end], end),
        None => (rest, rest.len()),
    }
}

fn needs_quoting(value: &str, separator: char) -> bool {
    value.contains(separator) || value.starts_with(COMPLEX_QUOTE)
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Percent-escape every character in `reserved`; everything else is kept.
pub(crate) fn percent_escape<'v>(value: &'v str, reserved: &[char]) -> Cow<'v, str> {
    if !value.contains(reserved) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 6);
    for c in value.chars() {
        if reserved.contains(&c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> QueryCodec {
        QueryCodec::default().with_complex_args(["where", "search"])
    }

    // =========================================================================
    // QueryArgs
    // =========================================================================

    #[test]
    fn test_args_case_insensitive_lookup() {
        let mut args = QueryArgs::new();
        args.insert("startIndex", "5");
        assert_eq!(args.get("STARTINDEX"), Some("5"));
        assert!(args.contains("startindex"));
    }

    #[test]
    fn test_args_overwrite_keeps_position() {
        let mut args = QueryArgs::new();
        args.insert("a", "1");
        args.insert("b", "2");
        args.insert("A", "3");

        let pairs: Vec<_> = args.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_args_remove() {
        let mut args: QueryArgs = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(args.remove("B"), Some("2".to_string()));
        assert_eq!(args.len(), 1);
        assert_eq!(args.remove("b"), None);
    }

    // =========================================================================
    // Simple parsing
    // =========================================================================

    #[test]
    fn test_parse_simple_pairs() {
        let args = parse_simple("count=10&startIndex=1", '&');
        assert_eq!(args.get("count"), Some("10"));
        assert_eq!(args.get("startIndex"), Some("1"));
    }

    #[test]
    fn test_parse_simple_decodes_values() {
        let args = parse_simple("where=name%20eq%20'x'", '&');
        assert_eq!(args.get("where"), Some("name eq 'x'"));
    }

    #[test]
    fn test_parse_simple_last_write_wins() {
        let args = parse_simple("count=1&COUNT=2", '&');
        assert_eq!(args.len(), 1);
        assert_eq!(args.get("count"), Some("2"));
    }

    #[test]
    fn test_parse_simple_splits_on_first_equals() {
        let args = parse_simple("where=a=b", '&');
        assert_eq!(args.get("where"), Some("a=b"));
    }

    #[test]
    fn test_parse_simple_name_without_value() {
        let args = parse_simple("includeSchema&count=1", '&');
        assert_eq!(args.get("includeSchema"), Some(""));
    }

    #[test]
    fn test_parse_simple_custom_separator() {
        let args = parse_simple("a=1;b=2", ';');
        assert_eq!(args.get("b"), Some("2"));
    }

    // =========================================================================
    // Complex parsing
    // =========================================================================

    #[test]
    fn test_parse_complex_quoted_value() {
        let args = codec().parse(r#"where="name eq 'A&B'"&count=10"#);
        assert_eq!(args.get("where"), Some("name eq 'A&B'"));
        assert_eq!(args.get("count"), Some("10"));
    }

    #[test]
    fn test_parse_complex_escaped_quote() {
        let args = codec().parse(r#"where="name eq \"x&y\""&count=1"#);
        assert_eq!(args.get("where"), Some(r#"name eq "x&y""#));
        assert_eq!(args.get("count"), Some("1"));
    }

    #[test]
    fn test_parse_complex_unquoted_value() {
        let args = codec().parse("count=5&where=a%20eq%201&startIndex=2");
        assert_eq!(args.get("where"), Some("a eq 1"));
        assert_eq!(args.get("startIndex"), Some("2"));
    }

    #[test]
    fn test_parse_complex_interleaved_preserves_order() {
        let args = codec().parse(r#"count=5&where="a&b"&format=atom&search="x&y"&select=Name"#);
        let names: Vec<_> = args.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["count", "where", "format", "search", "select"]);
        assert_eq!(args.get("search"), Some("x&y"));
    }

    #[test]
    fn test_parse_complex_requires_boundary() {
        let args = codec().parse("nowhere=1&where=2");
        assert_eq!(args.get("nowhere"), Some("1"));
        assert_eq!(args.get("where"), Some("2"));
    }

    #[test]
    fn test_parse_complex_unterminated_quote_falls_back() {
        let args = codec().parse(r#"where="abc&count=1"#);
        assert_eq!(args.get("where"), Some("\"abc"));
        assert_eq!(args.get("count"), Some("1"));
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn test_build_in_order_without_encoding() {
        let args: QueryArgs = [("where", "Name eq 'Bob'"), ("count", "5")]
            .into_iter()
            .collect();
        assert_eq!(codec().build(&args), "where=Name eq 'Bob'&count=5");
    }

    #[test]
    fn test_build_quotes_complex_value_with_separator() {
        let args: QueryArgs = [("where", "a eq 'x&y'")].into_iter().collect();
        let built = codec().build(&args);
        assert_eq!(built, r#"where="a eq 'x&y'""#);
        assert_eq!(codec().parse(&built), args);
    }

    #[test]
    fn test_build_escapes_trailing_backslash() {
        let args: QueryArgs = [("where", "x&\\"), ("count", "1")].into_iter().collect();
        let built = codec().build(&args);
        assert_eq!(built, r#"where="x&\\"&count=1"#);
        assert_eq!(codec().parse(&built), args);
    }

    #[test]
    fn test_parse_lone_backslash_is_literal() {
        let args = codec().parse(r#"where="a\b&c""#);
        assert_eq!(args.get("where"), Some(r"a\b&c"));
    }

    #[test]
    fn test_build_escapes_fragment_and_percent() {
        let args: QueryArgs = [("where", "Id eq 'C#1'"), ("search", "50%")].into_iter().collect();
        let built = codec().build(&args);
        assert_eq!(built, "where=Id eq 'C%231'&search=50%25");
        assert_eq!(codec().parse(&built), args);
    }

    #[test]
    fn test_build_empty() {
        assert_eq!(codec().build(&QueryArgs::new()), "");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_query_round_trip(
                pairs in proptest::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9 '%#]{0,12}"), 0..6),
            ) {
                let args: QueryArgs = pairs.into_iter().collect();
                let built = codec().build(&args);
                prop_assert_eq!(codec().parse(&built), args);
            }

            #[test]
            fn prop_complex_round_trip(
                value in "[a-zA-Z0-9 '&\"\\\\%#]{0,16}",
                count in 0u32..1000,
            ) {
                let args: QueryArgs = [
                    ("count".to_string(), count.to_string()),
                    ("where".to_string(), value),
                ]
                .into_iter()
                .collect();
                let built = codec().build(&args);
                prop_assert_eq!(codec().parse(&built), args);
            }
        }
    }
}
