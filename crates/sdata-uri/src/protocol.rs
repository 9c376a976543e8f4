//! Protocol view over a [`UriState`].
//!
//! Protocol paths have a fixed shape:
//!
//! ```text
//! /product/contract/company-dataset/collectionType(predicate)[/.../$service/method(predicate)]
//! ```
//!
//! and a known set of query arguments. [`ProtocolUri`] gives both names and
//! types without ever failing on malformed input: a bad value reads as
//! `None` (or `false`).

use crate::config::DialectConfig;
use crate::segment::PathSegment;
use crate::state::UriState;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// Query argument wire names.
pub mod args {
    pub const ORDER_BY: &str = "orderby";
    pub const WHERE: &str = "where";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const COUNT: &str = "count";
    pub const START_INDEX: &str = "startIndex";
    pub const LANGUAGE: &str = "language";
    pub const FORMAT: &str = "format";
    pub const PRECEDENCE: &str = "precedence";
    pub const INCLUDE: &str = "include";
    pub const EXCLUDE: &str = "exclude";
    pub const INCLUDE_SCHEMA: &str = "includeSchema";
    pub const TRACKING_ID: &str = "trackingId";
    pub const SEARCH: &str = "search";
    pub const INCLUDE_CONTENT: &str = "includeContent";
    pub const RETURN_DELTA: &str = "returnDelta";
    pub const SELECT: &str = "select";
    pub const RUN_NAME: &str = "runName";
    pub const RUN_STAMP: &str = "runStamp";
}

/// Wire format for date-time arguments: `yyyy-MM-ddTHH:mm:ss±HH:mm`
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

const PRODUCT_INDEX: usize = 0;
const CONTRACT_INDEX: usize = 1;
const COMPANY_DATASET_INDEX: usize = 2;
const COLLECTION_TYPE_INDEX: usize = 3;

/// Render a boolean the way the protocol expects (`True`/`False`)
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// One `orderby` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortProperty {
    pub name: String,
    pub descending: bool,
}

impl SortProperty {
    pub fn ascending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: false,
        }
    }

    pub fn descending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: true,
        }
    }
}

impl fmt::Display for SortProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{} desc", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Parse `"prop1 dir1,prop2 dir2"`; `DESC` in any case is descending.
pub fn parse_order_by(value: &str) -> Vec<SortProperty> {
    value
        .split(',')
        .filter_map(|item| {
            let mut tokens = item.split_whitespace();
            let name = tokens.next()?;
            let descending = tokens
                .next()
                .is_some_and(|direction| direction.eq_ignore_ascii_case("desc"));
            Some(SortProperty {
                name: name.to_string(),
                descending,
            })
        })
        .collect()
}

/// Representation requested by, or implied for, a protocol URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFormat {
    AtomFeed,
    AtomEntry,
    Xml,
    Json,
    Html,
    Text,
    Other(String),
}

impl MediaFormat {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AtomFeed => "atom",
            Self::AtomEntry => "atomentry",
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Html => "html",
            Self::Text => "text",
            Self::Other(value) => value,
        }
    }
}

impl FromStr for MediaFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "atom" | "atomfeed" | "application/atom+xml" | "application/atom+xml;type=feed" => {
                Self::AtomFeed
            }
            "atomentry" | "application/atom+xml;type=entry" => Self::AtomEntry,
            "xml" | "application/xml" | "text/xml" => Self::Xml,
            "json" | "application/json" => Self::Json,
            "html" | "text/html" => Self::Html,
            "text" | "text/plain" => Self::Text,
            _ => Self::Other(s.trim().to_string()),
        };
        Ok(format)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`UriState`] addressed through protocol names.
#[derive(Clone, PartialEq, Eq)]
pub struct ProtocolUri {
    state: UriState,
    service_sentinel: String,
}

impl Default for ProtocolUri {
    fn default() -> Self {
        Self::from_state(UriState::new())
    }
}

impl Deref for ProtocolUri {
    type Target = UriState;

    fn deref(&self) -> &UriState {
        &self.state
    }
}

impl DerefMut for ProtocolUri {
    fn deref_mut(&mut self) -> &mut UriState {
        &mut self.state
    }
}

impl ProtocolUri {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `uri` lazily using the shared dialect
    pub fn parse(uri: &str) -> Self {
        Self::from_state(UriState::parse(uri))
    }

    pub fn from_state(state: UriState) -> Self {
        Self {
            state,
            service_sentinel: DialectConfig::shared().service_sentinel.clone(),
        }
    }

    /// Use a custom dialect for both the query codec and the sentinel
    pub fn with_dialect(uri: &str, dialect: &DialectConfig) -> Self {
        let mut state = UriState::with_codec(dialect.query_codec());
        state.set_uri(uri);
        Self {
            state,
            service_sentinel: dialect.service_sentinel.clone(),
        }
    }

    pub fn into_state(self) -> UriState {
        self.state
    }

    // ------------------------------------------------------------------
    // Positional segments
    // ------------------------------------------------------------------

    fn segment_text(&self, index: usize) -> Option<String> {
        self.state.segment(index).map(|segment| segment.text())
    }

    fn set_segment_text(&mut self, index: usize, text: impl Into<String>) {
        self.state.ensure_segments(index + 1);
        if let Some(mut segment) = self.state.segment_mut(index) {
            segment.set_text(text);
        }
    }

    pub fn product(&self) -> Option<String> {
        self.segment_text(PRODUCT_INDEX)
    }

    pub fn set_product(&mut self, product: impl Into<String>) {
        self.set_segment_text(PRODUCT_INDEX, product);
    }

    pub fn contract(&self) -> Option<String> {
        self.segment_text(CONTRACT_INDEX)
    }

    pub fn set_contract(&mut self, contract: impl Into<String>) {
        self.set_segment_text(CONTRACT_INDEX, contract);
    }

    pub fn company_dataset(&self) -> Option<String> {
        self.segment_text(COMPANY_DATASET_INDEX)
    }

    pub fn set_company_dataset(&mut self, dataset: impl Into<String>) {
        self.set_segment_text(COMPANY_DATASET_INDEX, dataset);
    }

    pub fn collection_type(&self) -> Option<String> {
        self.segment_text(COLLECTION_TYPE_INDEX)
    }

    pub fn set_collection_type(&mut self, collection: impl Into<String>) {
        self.set_segment_text(COLLECTION_TYPE_INDEX, collection);
    }

    /// Resource selector attached to the collection-type segment
    pub fn collection_predicate(&self) -> Option<String> {
        self.state
            .segment(COLLECTION_TYPE_INDEX)
            .and_then(|segment| segment.predicate())
    }

    pub fn set_collection_predicate(&mut self, predicate: Option<impl Into<String>>) {
        self.state.ensure_segments(COLLECTION_TYPE_INDEX + 1);
        if let Some(mut segment) = self.state.segment_mut(COLLECTION_TYPE_INDEX) {
            segment.set_predicate(predicate);
        }
    }

    /// Predicate of the last segment, if any
    pub fn last_predicate(&self) -> Option<String> {
        self.state.segments().last().and_then(PathSegment::predicate)
    }

    // ------------------------------------------------------------------
    // Service methods
    // ------------------------------------------------------------------

    fn service_index(&self) -> Option<usize> {
        self.state
            .segments()
            .iter()
            .enumerate()
            .skip(COLLECTION_TYPE_INDEX)
            .find(|(_, segment)| segment.is(&self.service_sentinel))
            .map(|(index, _)| index)
    }

    pub fn is_service(&self) -> bool {
        self.service_index().is_some()
    }

    /// Method segment following the `$service` sentinel
    pub fn service_method(&self) -> Option<String> {
        let index = self.service_index()?;
        self.segment_text(index + 1)
    }

    pub fn service_method_predicate(&self) -> Option<String> {
        let index = self.service_index()?;
        self.state.segment(index + 1).and_then(|segment| segment.predicate())
    }

    /// Point the URI at a service method, adding the sentinel if needed.
    pub fn set_service_method(&mut self, method: impl Into<String>, predicate: Option<impl Into<String>>) {
        let method = PathSegment::with_predicate(method, predicate);
        match self.service_index() {
            Some(index) => {
                if index + 1 < self.state.segment_count() {
                    self.state.remove_segment(index + 1);
                }
                self.state.insert_segment(index + 1, method);
            }
            None => {
                self.state.ensure_segments(COLLECTION_TYPE_INDEX + 1);
                self.state
                    .push_segment(PathSegment::new(self.service_sentinel.clone()));
                self.state.push_segment(method);
            }
        }
    }

    // ------------------------------------------------------------------
    // Typed query arguments
    // ------------------------------------------------------------------

    fn int_arg<T: FromStr>(&self, name: &str) -> Option<T> {
        self.state
            .query_arg(name)
            .and_then(|value| value.trim().parse().ok())
    }

    fn bool_arg(&self, name: &str) -> Option<bool> {
        self.state
            .query_arg(name)
            .and_then(|value| parse_bool(&value))
    }

    fn set_optional_arg(&mut self, name: &str, value: Option<String>) {
        match value {
            Some(value) => self.state.set_query_arg(name, value),
            None => {
                self.state.remove_query_arg(name);
            }
        }
    }

    fn list_arg(&self, name: &str) -> Vec<String> {
        self.state
            .query_arg(name)
            .map(|value| split_list(&value))
            .unwrap_or_default()
    }

    fn set_list_arg(&mut self, name: &str, items: &[String]) {
        let value = (!items.is_empty()).then(|| items.join(","));
        self.set_optional_arg(name, value);
    }

    pub fn count(&self) -> Option<i64> {
        self.int_arg(args::COUNT)
    }

    pub fn set_count(&mut self, count: Option<i64>) {
        self.set_optional_arg(args::COUNT, count.map(|v| v.to_string()));
    }

    pub fn start_index(&self) -> Option<i64> {
        self.int_arg(args::START_INDEX)
    }

    pub fn set_start_index(&mut self, start_index: Option<i64>) {
        self.set_optional_arg(args::START_INDEX, start_index.map(|v| v.to_string()));
    }

    pub fn precedence(&self) -> Option<i32> {
        self.int_arg(args::PRECEDENCE)
    }

    pub fn set_precedence(&mut self, precedence: Option<i32>) {
        self.set_optional_arg(args::PRECEDENCE, precedence.map(|v| v.to_string()));
    }

    pub fn thumbnail(&self) -> bool {
        self.bool_arg(args::THUMBNAIL).unwrap_or(false)
    }

    pub fn set_thumbnail(&mut self, value: bool) {
        self.state.set_query_arg(args::THUMBNAIL, format_bool(value));
    }

    pub fn include_schema(&self) -> bool {
        self.bool_arg(args::INCLUDE_SCHEMA).unwrap_or(false)
    }

    pub fn set_include_schema(&mut self, value: bool) {
        self.state.set_query_arg(args::INCLUDE_SCHEMA, format_bool(value));
    }

    pub fn return_delta(&self) -> bool {
        self.bool_arg(args::RETURN_DELTA).unwrap_or(false)
    }

    pub fn set_return_delta(&mut self, value: bool) {
        self.state.set_query_arg(args::RETURN_DELTA, format_bool(value));
    }

    pub fn include_content(&self) -> Option<bool> {
        self.bool_arg(args::INCLUDE_CONTENT)
    }

    pub fn set_include_content(&mut self, value: Option<bool>) {
        self.set_optional_arg(
            args::INCLUDE_CONTENT,
            value.map(|v| format_bool(v).to_string()),
        );
    }

    pub fn order_by(&self) -> Vec<SortProperty> {
        self.state
            .query_arg(args::ORDER_BY)
            .map(|value| parse_order_by(&value))
            .unwrap_or_default()
    }

    pub fn set_order_by(&mut self, properties: &[SortProperty]) {
        let value = (!properties.is_empty()).then(|| {
            properties
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        });
        self.set_optional_arg(args::ORDER_BY, value);
    }

    /// Requested format; defaults to entry for a selected resource, feed otherwise.
    pub fn format(&self) -> MediaFormat {
        if let Some(explicit) = self.state.query_arg(args::FORMAT) {
            if !explicit.trim().is_empty() {
                if let Ok(format) = explicit.parse() {
                    return format;
                }
            }
        }
        if self.last_predicate().is_some() {
            MediaFormat::AtomEntry
        } else {
            MediaFormat::AtomFeed
        }
    }

    pub fn set_format(&mut self, format: Option<MediaFormat>) {
        self.set_optional_arg(args::FORMAT, format.map(|f| f.to_string()));
    }

    pub fn where_clause(&self) -> Option<String> {
        self.state.query_arg(args::WHERE)
    }

    pub fn set_where_clause(&mut self, clause: Option<impl Into<String>>) {
        self.set_optional_arg(args::WHERE, clause.map(Into::into));
    }

    pub fn search(&self) -> Option<String> {
        self.state.query_arg(args::SEARCH)
    }

    pub fn set_search(&mut self, search: Option<impl Into<String>>) {
        self.set_optional_arg(args::SEARCH, search.map(Into::into));
    }

    pub fn language(&self) -> Option<String> {
        self.state.query_arg(args::LANGUAGE)
    }

    pub fn set_language(&mut self, language: Option<impl Into<String>>) {
        self.set_optional_arg(args::LANGUAGE, language.map(Into::into));
    }

    pub fn include(&self) -> Vec<String> {
        self.list_arg(args::INCLUDE)
    }

    pub fn set_include(&mut self, items: &[String]) {
        self.set_list_arg(args::INCLUDE, items);
    }

    pub fn exclude(&self) -> Vec<String> {
        self.list_arg(args::EXCLUDE)
    }

    pub fn set_exclude(&mut self, items: &[String]) {
        self.set_list_arg(args::EXCLUDE, items);
    }

    pub fn select(&self) -> Vec<String> {
        self.list_arg(args::SELECT)
    }

    pub fn set_select(&mut self, columns: &[String]) {
        self.set_list_arg(args::SELECT, columns);
    }

    pub fn tracking_id(&self) -> Option<String> {
        self.state.query_arg(args::TRACKING_ID)
    }

    pub fn set_tracking_id(&mut self, tracking_id: Option<impl Into<String>>) {
        self.set_optional_arg(args::TRACKING_ID, tracking_id.map(Into::into));
    }

    pub fn run_name(&self) -> Option<String> {
        self.state.query_arg(args::RUN_NAME)
    }

    pub fn set_run_name(&mut self, run_name: Option<impl Into<String>>) {
        self.set_optional_arg(args::RUN_NAME, run_name.map(Into::into));
    }

    pub fn run_stamp(&self) -> Option<DateTime<FixedOffset>> {
        self.state
            .query_arg(args::RUN_STAMP)
            .and_then(|value| DateTime::parse_from_rfc3339(value.trim()).ok())
    }

    pub fn set_run_stamp(&mut self, stamp: Option<DateTime<FixedOffset>>) {
        self.set_optional_arg(
            args::RUN_STAMP,
            stamp.map(|s| s.format(DATE_TIME_FORMAT).to_string()),
        );
    }
}

impl fmt::Debug for ProtocolUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolUri")
            .field("uri", &self.state.uri())
            .finish()
    }
}

impl fmt::Display for ProtocolUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.state, f)
    }
}

impl FromStr for ProtocolUri {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<UriState> for ProtocolUri {
    fn from(state: UriState) -> Self {
        Self::from_state(state)
    }
}
