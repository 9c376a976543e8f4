//! Error types for the translation pipeline.

use crate::ast::NodeKind;
use thiserror::Error;

/// Errors raised by a [`QueryTransform`](crate::transform::QueryTransform)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("unsupported {kind}: {detail}")]
    Unsupported { kind: NodeKind, detail: String },

    #[error("transform '{transform}' failed: {message}")]
    Failed {
        transform: &'static str,
        message: String,
    },
}

/// Errors raised while rendering a command into a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unsupported {kind}: {detail}")]
    Unsupported { kind: NodeKind, detail: String },

    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    #[error("invalid {clause} value: {detail}")]
    InvalidPaging {
        clause: &'static str,
        detail: String,
    },
}

impl RenderError {
    pub(crate) fn unsupported(kind: NodeKind, detail: impl Into<String>) -> Self {
        Self::Unsupported {
            kind,
            detail: detail.into(),
        }
    }
}

/// Any failure translating a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl TranslateError {
    /// Node kind of an unsupported construct, if that is what failed
    pub fn unsupported_kind(&self) -> Option<NodeKind> {
        match self {
            Self::Transform(TransformError::Unsupported { kind, .. })
            | Self::Render(RenderError::Unsupported { kind, .. }) => Some(*kind),
            _ => None,
        }
    }
}

pub type TranslateResult<T> = Result<T, TranslateError>;
