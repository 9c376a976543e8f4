//! Command tree transforms applied before rendering.
//!
//! Transforms run in order; each takes ownership of the command and returns
//! the rewritten tree or an error that aborts translation.

mod compare;
mod validate;

pub use compare::CompareRewrite;
pub use validate::ValidateTransform;

use crate::ast::Command;
use crate::error::TransformError;

/// A single rewriting or checking pass over a [`Command`].
pub trait QueryTransform: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    fn transform(&self, command: Command) -> Result<Command, TransformError>;
}

/// Default pipeline: comparison rewriting, then validation
pub fn default_transforms() -> Vec<Box<dyn QueryTransform>> {
    vec![Box::new(CompareRewrite), Box::new(ValidateTransform)]
}
