//! Command tree to SData request translation
//!
//! Pipeline: command tree -> transforms -> renderer -> verb + protocol URI
//!
//! - [`ast`]: tables, columns, literals, operators and commands
//! - [`transform`]: `CompareTo`/`Compare` rewriting and up-front validation
//! - [`render`]: the SData renderer with key folding, `where`, ordering,
//!   projection and paging
//! - [`Translator`]: ties the stages to a base URI and dialect

pub mod ast;
pub mod error;
pub mod render;
pub mod transform;
mod translator;

pub use ast::{Command, Expr, Literal, NodeKind};
pub use error::{RenderError, TransformError, TranslateError, TranslateResult};
pub use render::{CommandRenderer, HttpVerb, SDataRenderer, TranslatedRequest};
pub use transform::QueryTransform;
pub use translator::Translator;
