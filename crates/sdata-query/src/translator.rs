//! Translation pipeline: transforms, then a renderer, on top of a base URI.

use crate::ast::Command;
use crate::error::TranslateResult;
use crate::render::{CommandRenderer, SDataRenderer, TranslatedRequest};
use crate::transform::{default_transforms, QueryTransform};
use sdata_uri::{DialectConfig, ProtocolUri};
use std::sync::LazyLock;
use tracing::debug;

static SHARED: LazyLock<Translator> = LazyLock::new(Translator::new);

/// Turns command trees into protocol requests.
///
/// Holds only immutable configuration, so one instance can serve many
/// threads; each call builds its own [`ProtocolUri`].
pub struct Translator {
    transforms: Vec<Box<dyn QueryTransform>>,
    renderer: Box<dyn CommandRenderer>,
    dialect: DialectConfig,
    base_uri: String,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    /// Default pipeline with the shared dialect and a relative base
    pub fn new() -> Self {
        Self::with_dialect(DialectConfig::shared().clone())
    }

    pub fn with_dialect(dialect: DialectConfig) -> Self {
        Self {
            transforms: default_transforms(),
            renderer: Box::new(SDataRenderer::from_dialect(&dialect)),
            dialect,
            base_uri: String::new(),
        }
    }

    /// Process-wide translator with default settings
    pub fn shared() -> &'static Translator {
        &SHARED
    }

    /// URI the collection segment is appended to
    pub fn with_base_uri(mut self, base: impl Into<String>) -> Self {
        self.base_uri = base.into();
        self
    }

    pub fn with_renderer(mut self, renderer: impl CommandRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Append a transform after the default ones
    pub fn with_transform(mut self, transform: impl QueryTransform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn dialect(&self) -> &DialectConfig {
        &self.dialect
    }

    pub fn translate(&self, command: &Command) -> TranslateResult<TranslatedRequest> {
        let mut command = command.clone();
        for transform in &self.transforms {
            command = transform.transform(command)?;
        }

        let base = ProtocolUri::with_dialect(&self.base_uri, &self.dialect);
        let request = self.renderer.render(&command, &base)?;
        debug!(
            renderer = self.renderer.name(),
            verb = %request.verb,
            uri = %request.uri,
            "translated command"
        );
        Ok(request)
    }
}
