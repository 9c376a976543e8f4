//! Lazy URI state machine.
//!
//! A [`UriState`] holds four mutually dependent representations of one URI:
//! the full URI string, the path string, the segment list and the query
//! argument map. Writing any one of them marks the others stale through four
//! dirty flags; reading resolves the flags in a fixed order:
//!
//! ```text
//! parse-uri -> parse-path -> rebuild-path -> rebuild-uri
//! ```
//!
//! | Write                          | Marks                                   |
//! |--------------------------------|-----------------------------------------|
//! | `set_uri`                      | needs-parse-uri, clears needs-rebuild-uri |
//! | scheme/host/port/prefix/server | needs-rebuild-uri                        |
//! | `set_path`                     | needs-parse-path, needs-rebuild-uri      |
//! | `set_segments`, segment edits  | needs-rebuild-path                       |
//! | query edits                    | needs-rebuild-uri                        |

use crate::codec::{QueryArgs, QueryCodec};
use crate::config::DialectConfig;
use crate::grammar::{self, PATH_SEPARATOR};
use crate::segment::PathSegment;
use std::borrow::Cow;
use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const SCHEME_SEPARATOR: &str = "://";

/// Staleness of the derived representations of a [`UriState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    /// The URI string was written; components must be parsed from it
    pub needs_parse_uri: bool,
    /// Components were written; the URI string must be rebuilt
    pub needs_rebuild_uri: bool,
    /// The path string was written; segments must be parsed from it
    pub needs_parse_path: bool,
    /// Segments were written; the path string must be rebuilt
    pub needs_rebuild_path: bool,
}

impl DirtyFlags {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct UriInner {
    uri: String,
    scheme: String,
    host: String,
    port: Option<u16>,
    path_prefix: String,
    server: String,
    path: String,
    segments: Vec<PathSegment>,
    query_args: QueryArgs,
    fragment: String,
    flags: DirtyFlags,
}

impl UriInner {
    fn check_parse_uri(&mut self, codec: &QueryCodec) {
        if !self.flags.needs_parse_uri {
            return;
        }
        self.flags.needs_parse_uri = false;
        self.parse_uri(codec);
        self.flags.needs_parse_path = true;
        self.flags.needs_rebuild_path = false;
    }

    fn check_parse_path(&mut self, codec: &QueryCodec) {
        self.check_parse_uri(codec);
        if !self.flags.needs_parse_path {
            return;
        }
        self.flags.needs_parse_path = false;
        self.segments = grammar::parse_path(&self.path)
            .into_iter()
            .map(|(text, predicate)| PathSegment::with_predicate(text, predicate))
            .collect();
    }

    fn check_rebuild_path(&mut self) {
        if !self.flags.needs_rebuild_path {
            return;
        }
        self.flags.needs_rebuild_path = false;
        self.path = self
            .segments
            .iter()
            .map(PathSegment::raw)
            .collect::<Vec<_>>()
            .join("/");
        self.flags.needs_rebuild_uri = true;
    }

    fn check_rebuild_uri(&mut self, codec: &QueryCodec) {
        self.check_rebuild_path();
        if !self.flags.needs_rebuild_uri {
            return;
        }
        self.flags.needs_rebuild_uri = false;
        self.uri = self.build_uri(codec);
    }

    /// Resolve everything a full-URI read depends on.
    fn resolve(&mut self, codec: &QueryCodec) {
        self.check_parse_uri(codec);
        self.check_rebuild_uri(codec);
    }

    fn parse_uri(&mut self, codec: &QueryCodec) {
        let mut rest = self.uri.as_str();

        self.fragment = match rest.split_once('#') {
            Some((before, fragment)) => {
                rest = before;
                fragment.to_string()
            }
            None => String::new(),
        };

        self.query_args = match rest.split_once('?') {
            Some((before, query)) => {
                rest = before;
                codec.parse(query)
            }
            None => QueryArgs::new(),
        };

        let absolute = match rest.split_once(SCHEME_SEPARATOR) {
            Some((scheme, after)) => {
                self.scheme = scheme.to_string();
                rest = after;
                true
            }
            None => {
                self.scheme.clear();
                match rest.strip_prefix("//") {
                    Some(after) => {
                        rest = after;
                        true
                    }
                    None => false,
                }
            }
        };

        if absolute {
            let (authority, path) = rest.split_once(PATH_SEPARATOR).unwrap_or((rest, ""));
            let (host, port) = split_authority(authority);
            self.host = host;
            self.port = port;
            rest = path;
        } else {
            self.host.clear();
            self.port = None;
        }

        let decoded = urlencoding::decode(rest)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| rest.to_string());
        let mut path = decoded.trim_matches(PATH_SEPARATOR);

        if let Some(stripped) = strip_path_prefix(path, &self.path_prefix) {
            path = stripped;
        }

        if absolute {
            let (server, remainder) = path.split_once(PATH_SEPARATOR).unwrap_or((path, ""));
            self.server = server.to_string();
            self.path = remainder.trim_matches(PATH_SEPARATOR).to_string();
        } else {
            self.server.clear();
            self.path = path.to_string();
        }
    }

    fn build_uri(&self, codec: &QueryCodec) -> String {
        let mut uri = String::new();

        if !self.host.is_empty() {
            if self.scheme.is_empty() {
                uri.push_str("//");
            } else {
                uri.push_str(&self.scheme);
                uri.push_str(SCHEME_SEPARATOR);
            }
            uri.push_str(&self.host);
            if let Some(port) = self.port {
                uri.push(':');
                uri.push_str(&port.to_string());
            }
        }

        let path = grammar::encode_path(&self.absolute_path());
        if !(self.host.is_empty() && path == "/") {
            uri.push_str(&path);
        }

        if !self.query_args.is_empty() {
            uri.push('?');
            uri.push_str(&codec.build(&self.query_args));
        }

        if !self.fragment.is_empty() {
            uri.push('#');
            uri.push_str(&self.fragment);
        }

        uri
    }

    fn absolute_path(&self) -> String {
        let parts: Vec<&str> = [
            self.path_prefix.as_str(),
            self.server.as_str(),
            self.path.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
        format!("/{}", parts.join("/"))
    }
}

fn split_authority(authority: &str) -> (String, Option<u16>) {
    if let Some((host, port)) = authority.rsplit_once(':') {
        if let Ok(port) = port.parse::<u16>() {
            return (host.to_string(), Some(port));
        }
    }
    (authority.to_string(), None)
}

fn strip_path_prefix<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    if prefix.is_empty() {
        return None;
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(PATH_SEPARATOR)
    }
}

/// A URI whose string, path, segments and query stay mutually consistent.
///
/// Reads take `&self` and resolve stale representations on demand, so the
/// type is `!Sync`; keep each instance with a single owner.
pub struct UriState {
    inner: RefCell<UriInner>,
    codec: QueryCodec,
}

impl Default for UriState {
    fn default() -> Self {
        Self::with_codec(DialectConfig::shared().query_codec())
    }
}

impl UriState {
    /// Empty URI using the shared dialect
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty URI with a custom query codec
    pub fn with_codec(codec: QueryCodec) -> Self {
        Self {
            inner: RefCell::new(UriInner::default()),
            codec,
        }
    }

    /// Parse `uri` lazily using the shared dialect
    pub fn parse(uri: &str) -> Self {
        let mut state = Self::new();
        state.set_uri(uri);
        state
    }

    pub fn codec(&self) -> &QueryCodec {
        &self.codec
    }

    /// Current dirty flags, without resolving anything
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.inner.borrow().flags
    }

    fn read<T>(&self, f: impl FnOnce(&mut UriInner, &QueryCodec) -> T) -> T {
        let mut inner = self.inner.borrow_mut();
        f(&mut *inner, &self.codec)
    }

    /// Write a component that lives in the URI string's parse result.
    fn write_component(&mut self, f: impl FnOnce(&mut UriInner)) {
        let inner = self.inner.get_mut();
        inner.check_parse_uri(&self.codec);
        f(inner);
        inner.flags.needs_rebuild_uri = true;
    }

    /// Write the segment list.
    fn write_segments<T>(&mut self, f: impl FnOnce(&mut Vec<PathSegment>) -> T) -> T {
        let inner = self.inner.get_mut();
        inner.check_parse_path(&self.codec);
        let result = f(&mut inner.segments);
        inner.flags.needs_rebuild_path = true;
        result
    }

    // ------------------------------------------------------------------
    // Full URI
    // ------------------------------------------------------------------

    pub fn uri(&self) -> String {
        self.read(|inner, codec| {
            inner.resolve(codec);
            inner.uri.clone()
        })
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) {
        let inner = self.inner.get_mut();
        inner.uri = uri.into();
        inner.flags.needs_parse_uri = true;
        inner.flags.needs_rebuild_uri = false;
        inner.flags.needs_rebuild_path = false;
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    pub fn scheme(&self) -> String {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.scheme.clone()
        })
    }

    pub fn set_scheme(&mut self, scheme: impl Into<String>) {
        let scheme = scheme.into();
        self.write_component(|inner| inner.scheme = scheme);
    }

    pub fn host(&self) -> String {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.host.clone()
        })
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        let host = host.into();
        self.write_component(|inner| inner.host = host);
    }

    pub fn port(&self) -> Option<u16> {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.port
        })
    }

    pub fn set_port(&mut self, port: Option<u16>) {
        self.write_component(|inner| inner.port = port);
    }

    /// Virtual-directory prefix placed before the server element.
    pub fn path_prefix(&self) -> String {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.path_prefix.clone()
        })
    }

    pub fn set_path_prefix(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into().trim_matches(PATH_SEPARATOR).to_string();
        self.write_component(|inner| inner.path_prefix = prefix);
    }

    /// First path element of an absolute URI
    pub fn server(&self) -> String {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.server.clone()
        })
    }

    pub fn set_server(&mut self, server: impl Into<String>) {
        let server = server.into().trim_matches(PATH_SEPARATOR).to_string();
        self.write_component(|inner| inner.server = server);
    }

    pub fn fragment(&self) -> String {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.fragment.clone()
        })
    }

    pub fn set_fragment(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        self.write_component(|inner| inner.fragment = fragment);
    }

    // ------------------------------------------------------------------
    // Path
    // ------------------------------------------------------------------

    /// Path after the server element, without leading slash
    pub fn path(&self) -> String {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.check_rebuild_path();
            inner.path.clone()
        })
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        let path = path.into().trim_matches(PATH_SEPARATOR).to_string();
        let inner = self.inner.get_mut();
        inner.check_parse_uri(&self.codec);
        inner.path = path;
        inner.flags.needs_parse_path = true;
        inner.flags.needs_rebuild_path = false;
        inner.flags.needs_rebuild_uri = true;
    }

    /// Rooted path including prefix and server
    pub fn absolute_path(&self) -> String {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.check_rebuild_path();
            inner.absolute_path()
        })
    }

    // ------------------------------------------------------------------
    // Segments
    // ------------------------------------------------------------------

    pub fn segments(&self) -> Vec<PathSegment> {
        self.read(|inner, codec| {
            inner.check_parse_path(codec);
            inner.segments.clone()
        })
    }

    pub fn segment(&self, index: usize) -> Option<PathSegment> {
        self.read(|inner, codec| {
            inner.check_parse_path(codec);
            inner.segments.get(index).cloned()
        })
    }

    pub fn segment_count(&self) -> usize {
        self.read(|inner, codec| {
            inner.check_parse_path(codec);
            inner.segments.len()
        })
    }

    pub fn set_segments(&mut self, segments: Vec<PathSegment>) {
        self.write_segments(|current| *current = segments);
    }

    /// Mutable handle to one segment; edits mark this state's path stale.
    pub fn segment_mut(&mut self, index: usize) -> Option<SegmentMut<'_>> {
        let inner = self.inner.get_mut();
        inner.check_parse_path(&self.codec);
        if index < inner.segments.len() {
            Some(SegmentMut { inner, index })
        } else {
            None
        }
    }

    pub fn push_segment(&mut self, segment: PathSegment) {
        self.write_segments(|segments| segments.push(segment));
    }

    pub fn insert_segment(&mut self, index: usize, segment: PathSegment) {
        self.write_segments(|segments| {
            let index = index.min(segments.len());
            segments.insert(index, segment);
        });
    }

    pub fn remove_segment(&mut self, index: usize) -> Option<PathSegment> {
        self.write_segments(|segments| {
            (index < segments.len()).then(|| segments.remove(index))
        })
    }

    /// Grow the segment list with placeholders until it has `len` entries.
    pub fn ensure_segments(&mut self, len: usize) {
        if self.segment_count() >= len {
            return;
        }
        self.write_segments(|segments| {
            segments.resize_with(len, PathSegment::placeholder);
        });
    }

    // ------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------

    pub fn query(&self) -> String {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            codec.build(&inner.query_args)
        })
    }

    pub fn set_query(&mut self, query: &str) {
        let args = self.codec.parse(query.trim_start_matches('?'));
        self.write_component(|inner| inner.query_args = args);
    }

    pub fn query_args(&self) -> QueryArgs {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.query_args.clone()
        })
    }

    pub fn set_query_args(&mut self, args: QueryArgs) {
        self.write_component(|inner| inner.query_args = args);
    }

    pub fn query_arg(&self, name: &str) -> Option<String> {
        self.read(|inner, codec| {
            inner.check_parse_uri(codec);
            inner.query_args.get(name).map(str::to_string)
        })
    }

    pub fn set_query_arg(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.write_component(|inner| inner.query_args.insert(name, value));
    }

    pub fn remove_query_arg(&mut self, name: &str) -> Option<String> {
        let mut removed = None;
        self.write_component(|inner| removed = inner.query_args.remove(name));
        removed
    }
}

/// Write handle to one segment of a [`UriState`].
///
/// Holding the handle borrows the owner mutably; every edit marks the
/// owner's path for rebuild.
pub struct SegmentMut<'a> {
    inner: &'a mut UriInner,
    index: usize,
}

impl SegmentMut<'_> {
    fn segment(&self) -> &PathSegment {
        &self.inner.segments[self.index]
    }

    fn edit(&mut self, f: impl FnOnce(&mut PathSegment)) {
        f(&mut self.inner.segments[self.index]);
        self.inner.flags.needs_rebuild_path = true;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> String {
        self.segment().text()
    }

    pub fn predicate(&self) -> Option<String> {
        self.segment().predicate()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.edit(|segment| segment.set_text(text));
    }

    pub fn set_predicate(&mut self, predicate: Option<impl Into<String>>) {
        let predicate: Option<String> = predicate.map(Into::into);
        self.edit(|segment| segment.set_predicate(predicate));
    }

    pub fn set_raw(&mut self, raw: impl Into<String>) {
        let raw = raw.into();
        self.edit(|segment| segment.set_raw(raw));
    }
}

impl Clone for UriState {
    fn clone(&self) -> Self {
        Self {
            inner: RefCell::new(self.inner.borrow().clone()),
            codec: self.codec.clone(),
        }
    }
}

impl PartialEq for UriState {
    fn eq(&self, other: &Self) -> bool {
        self.uri() == other.uri()
    }
}

impl Eq for UriState {}

impl fmt::Debug for UriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriState").field("uri", &self.uri()).finish()
    }
}

impl fmt::Display for UriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl FromStr for UriState {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for UriState {
    fn from(uri: &str) -> Self {
        Self::parse(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "http://localhost:5493/sdata/aw/dynamic/-/accounts('A1')?count=10&where=name%20eq%20'x'#top";

    fn flags(parse_uri: bool, rebuild_uri: bool, parse_path: bool, rebuild_path: bool) -> DirtyFlags {
        DirtyFlags {
            needs_parse_uri: parse_uri,
            needs_rebuild_uri: rebuild_uri,
            needs_parse_path: parse_path,
            needs_rebuild_path: rebuild_path,
        }
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn test_parse_components() {
        let state = UriState::parse(SAMPLE);

        assert_eq!(state.scheme(), "http");
        assert_eq!(state.host(), "localhost");
        assert_eq!(state.port(), Some(5493));
        assert_eq!(state.server(), "sdata");
        assert_eq!(state.path(), "aw/dynamic/-/accounts('A1')");
        assert_eq!(state.fragment(), "top");
        assert_eq!(state.query_arg("count").as_deref(), Some("10"));
        assert_eq!(state.query_arg("where").as_deref(), Some("name eq 'x'"));
    }

    #[test]
    fn test_parse_segments() {
        let state = UriState::parse(SAMPLE);
        let segments = state.segments();

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3].text(), "accounts");
        assert_eq!(segments[3].predicate().as_deref(), Some("'A1'"));
    }

    #[test]
    fn test_parse_decodes_path() {
        let state = UriState::parse("http://host/sdata/a/def(1%20eq%201)");
        assert_eq!(state.path(), "a/def(1 eq 1)");
    }

    #[test]
    fn test_parse_relative_uri_has_no_server() {
        let state = UriState::parse("/Accounts(123)?count=5");
        assert_eq!(state.host(), "");
        assert_eq!(state.server(), "");
        assert_eq!(state.path(), "Accounts(123)");
        assert_eq!(state.uri(), "/Accounts(123)?count=5");
    }

    #[test]
    fn test_parse_strips_path_prefix() {
        let mut state = UriState::new();
        state.set_path_prefix("virtual/dir");
        state.set_uri("http://host/virtual/dir/sdata/app/contract/-/accounts");

        assert_eq!(state.path_prefix(), "virtual/dir");
        assert_eq!(state.server(), "sdata");
        assert_eq!(state.path(), "app/contract/-/accounts");
    }

    #[test]
    fn test_parse_unparsable_port_stays_in_host() {
        let state = UriState::parse("http://host:abc/sdata");
        assert_eq!(state.host(), "host:abc");
        assert_eq!(state.port(), None);
    }

    #[test]
    fn test_empty_state_renders_empty() {
        assert_eq!(UriState::new().uri(), "");
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    #[test]
    fn test_set_uri_marks_parse_and_clears_rebuild() {
        let mut state = UriState::new();
        state.set_host("a");
        assert!(state.dirty_flags().needs_rebuild_uri);

        state.set_uri(SAMPLE);
        assert_eq!(state.dirty_flags(), flags(true, false, false, false));
    }

    #[test]
    fn test_set_host_forces_parse_then_marks_rebuild() {
        let mut state = UriState::parse(SAMPLE);
        state.set_host("example.com");

        let dirty = state.dirty_flags();
        assert!(!dirty.needs_parse_uri);
        assert!(dirty.needs_rebuild_uri);
        assert_eq!(
            state.uri(),
            "http://example.com:5493/sdata/aw/dynamic/-/accounts('A1')?count=10&where=name eq 'x'#top"
        );
    }

    #[test]
    fn test_set_scheme_port_server_mark_rebuild() {
        let mut state = UriState::parse("http://host/sdata/a");
        state.set_scheme("https");
        state.set_port(Some(8443));
        state.set_server("api");
        assert_eq!(state.dirty_flags(), flags(false, true, true, false));
        assert_eq!(state.uri(), "https://host:8443/api/a");
    }

    #[test]
    fn test_set_path_marks_parse_path_and_rebuild_uri() {
        let mut state = UriState::parse("http://host/sdata/a");
        state.set_path("x/y(1)");

        assert_eq!(state.dirty_flags(), flags(false, true, true, false));
        assert_eq!(state.segment_count(), 2);
        assert_eq!(state.uri(), "http://host/sdata/x/y(1)");
    }

    #[test]
    fn test_set_segments_marks_rebuild_path() {
        let mut state = UriState::parse("http://host/sdata/a");
        state.set_segments(vec![PathSegment::new("b"), PathSegment::with_predicate("c", Some("2"))]);

        assert_eq!(state.dirty_flags(), flags(false, false, false, true));
        assert_eq!(state.path(), "b/c(2)");
        assert!(state.dirty_flags().needs_rebuild_uri);
        assert_eq!(state.uri(), "http://host/sdata/b/c(2)");
        assert!(state.dirty_flags().is_clean());
    }

    #[test]
    fn test_segment_edit_marks_owner_rebuild_path() {
        let mut state = UriState::parse("http://host/sdata/a/accounts");
        assert_eq!(state.uri(), "http://host/sdata/a/accounts");

        {
            let mut segment = state.segment_mut(1).unwrap();
            segment.set_predicate(Some("'X'"));
        }

        assert_eq!(state.dirty_flags(), flags(false, false, false, true));
        assert_eq!(state.uri(), "http://host/sdata/a/accounts('X')");
    }

    #[test]
    fn test_segment_mut_out_of_range() {
        let mut state = UriState::parse("/a");
        assert!(state.segment_mut(3).is_none());
    }

    #[test]
    fn test_query_edit_marks_rebuild_uri() {
        let mut state = UriState::parse("http://host/sdata/a?count=1");
        assert_eq!(state.uri(), "http://host/sdata/a?count=1");

        state.set_query_arg("startIndex", "3");
        assert_eq!(state.dirty_flags(), flags(false, true, true, false));
        assert_eq!(state.uri(), "http://host/sdata/a?count=1&startIndex=3");

        state.remove_query_arg("count");
        state.set_query("format=json");
        assert_eq!(state.uri(), "http://host/sdata/a?format=json");
    }

    #[test]
    fn test_reads_never_expose_stale_values() {
        let mut state = UriState::parse("http://host/sdata/a/b");
        state.set_path("c");
        {
            let mut segment = state.segment_mut(0).unwrap();
            segment.set_text("d");
        }
        assert_eq!(state.path(), "d");
        assert_eq!(state.absolute_path(), "/sdata/d");
        assert_eq!(state.uri(), "http://host/sdata/d");
    }

    #[test]
    fn test_set_uri_discards_pending_component_edits() {
        let mut state = UriState::parse("http://host/sdata/a");
        state.set_host("other");
        state.set_uri("http://third/sdata/b");
        assert_eq!(state.host(), "third");
        assert_eq!(state.uri(), "http://third/sdata/b");
    }

    #[test]
    fn test_ensure_segments_never_shrinks() {
        let mut state = UriState::parse("/a/b/c");
        state.ensure_segments(2);
        assert_eq!(state.segment_count(), 3);
        state.ensure_segments(5);
        assert_eq!(state.segment_count(), 5);
        assert_eq!(state.segment(4).unwrap().text(), "-");
        assert_eq!(state.uri(), "/a/b/c/-/-");
    }

    #[test]
    fn test_insert_and_remove_segments() {
        let mut state = UriState::parse("/a/c");
        state.insert_segment(1, PathSegment::new("b"));
        assert_eq!(state.path(), "a/b/c");
        assert_eq!(state.remove_segment(0).unwrap().text(), "a");
        assert_eq!(state.uri(), "/b/c");
        assert!(state.remove_segment(9).is_none());
    }

    #[test]
    fn test_clone_and_equality() {
        let state = UriState::parse(SAMPLE);
        let copy = state.clone();
        assert_eq!(state, copy);
        assert_eq!(copy.to_string(), state.uri());
    }

    #[test]
    fn test_rebuilt_uri_keeps_decoded_reserved_characters() {
        let mut state = UriState::parse("http://host/sdata/a/b/-/accounts('x%3Fy')");
        assert_eq!(state.segment(3).unwrap().predicate().as_deref(), Some("'x?y'"));

        state.set_fragment("f");
        let rebuilt = state.uri();
        assert_eq!(rebuilt, "http://host/sdata/a/b/-/accounts('x%3Fy')#f");

        let reparsed = UriState::parse(&rebuilt);
        assert_eq!(reparsed.segments(), state.segments());
        assert!(reparsed.query_args().is_empty());
        assert_eq!(reparsed.fragment(), "f");
    }

    #[test]
    fn test_segment_with_hash_and_percent_round_trips() {
        let mut state = UriState::parse("http://host/sdata");
        state.push_segment(PathSegment::with_predicate("notes", Some("'50% #1'")));
        assert_eq!(state.uri(), "http://host/sdata/notes('50%25 %231')");

        let reparsed = UriState::parse(&state.uri());
        assert_eq!(reparsed.segment(0).unwrap().predicate().as_deref(), Some("'50% #1'"));
        assert_eq!(reparsed.path(), "notes('50% #1')");
    }

    #[test]
    fn test_from_str() {
        let state: UriState = "http://host/sdata".parse().unwrap();
        assert_eq!(state.server(), "sdata");
    }
}
