//! Target renderers for command trees.
//!
//! Renderers turn a validated [`Command`] into a verb plus a protocol URI
//! built on top of a caller-supplied base.

mod literal;
mod sdata;

pub use literal::render_literal;
pub use sdata::SDataRenderer;

use crate::ast::Command;
use crate::error::RenderError;
use sdata_uri::{grammar, ProtocolUri};
use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP verb of a translated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output from rendering
#[derive(Debug, Clone)]
pub struct TranslatedRequest {
    pub verb: HttpVerb,
    pub uri: ProtocolUri,
}

impl TranslatedRequest {
    /// Absolute path, e.g. `/sdata/app/crm/-/Accounts(123)`
    pub fn path(&self) -> String {
        self.uri.absolute_path()
    }

    /// Query string without the leading `?`
    pub fn query(&self) -> String {
        self.uri.query()
    }

    /// Request target as sent on the wire, with the path escaped
    pub fn path_and_query(&self) -> String {
        let path = grammar::encode_path(&self.path());
        let query = self.query();
        if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        }
    }
}

impl fmt::Display for TranslatedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.uri)
    }
}

/// Trait for rendering a command tree to a protocol request.
pub trait CommandRenderer: Send + Sync {
    /// Unique name for this renderer
    fn name(&self) -> &str;

    /// Render `command` by extending a copy of `base`
    fn render(&self, command: &Command, base: &ProtocolUri)
        -> Result<TranslatedRequest, RenderError>;
}
