//! SData URI dialect
//!
//! Read and write the logical parts of a protocol URI without ever holding
//! an inconsistent representation:
//! - [`grammar`]: `text(predicate)` path segment grammar
//! - [`codec`]: query string parsing/building with quoted complex arguments
//! - [`UriState`]: lazily synchronized URI / path / segments / query
//! - [`ProtocolUri`]: product, contract, dataset and collection positions
//!   plus typed query arguments
//! - [`DialectConfig`]: separator, sentinel and key-column settings

pub mod codec;
pub mod config;
pub mod grammar;
pub mod protocol;
pub mod segment;
pub mod state;

pub use codec::{QueryArgs, QueryCodec};
pub use config::{ConfigError, ConfigResult, DialectConfig};
pub use protocol::{args, format_bool, parse_order_by, MediaFormat, ProtocolUri, SortProperty};
pub use segment::PathSegment;
pub use state::{DirtyFlags, SegmentMut, UriState};
