use anyhow::{Context, Result};
use sdata_uri::DialectConfig;
use std::path::Path;
use tracing::debug;

/// Load the dialect from `path`, or fall back to the built-in default.
pub fn load_dialect(path: Option<&Path>) -> Result<DialectConfig> {
    match path {
        Some(path) => {
            let dialect = DialectConfig::load(path)
                .with_context(|| format!("failed to load dialect config from {}", path.display()))?;
            debug!(path = %path.display(), "loaded dialect config");
            Ok(dialect)
        }
        None => Ok(DialectConfig::shared().clone()),
    }
}
