use anyhow::{bail, Context, Result};
use sdata_query::{Command, SDataRenderer, Translator};
use sdata_uri::DialectConfig;
use std::path::Path;

/// Parse `TABLE=RESOURCE` mappings
fn parse_resources(resources: &[String]) -> Result<Vec<(String, String)>> {
    resources
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((table, resource)) if !table.is_empty() && !resource.is_empty() => {
                Ok((table.to_string(), resource.to_string()))
            }
            _ => bail!("invalid resource mapping '{}', expected TABLE=RESOURCE", entry),
        })
        .collect()
}

/// Translate a JSON-encoded command into `VERB uri`
pub fn translate_json(
    dialect: &DialectConfig,
    json: &str,
    base: Option<&str>,
    resources: &[String],
) -> Result<String> {
    let command: Command = serde_json::from_str(json).context("failed to parse command JSON")?;

    let mut renderer = SDataRenderer::from_dialect(dialect);
    for (table, resource) in parse_resources(resources)? {
        renderer = renderer.with_resource_name(table, resource);
    }

    let translator = Translator::with_dialect(dialect.clone())
        .with_renderer(renderer)
        .with_base_uri(base.unwrap_or_default());
    let request = translator
        .translate(&command)
        .context("failed to translate command")?;
    Ok(request.to_string())
}

pub fn execute(
    dialect: &DialectConfig,
    file: &Path,
    base: Option<&str>,
    resources: &[String],
) -> Result<String> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    translate_json(dialect, &json, base, resources)
}
