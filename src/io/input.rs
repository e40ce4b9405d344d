use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::DocumentFormat;

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).context("failed to parse JSON document")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(contents).context("failed to parse YAML document")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => contents
            .parse::<toml::Value>()
            .context("failed to parse TOML document")
            .and_then(|value| {
                serde_json::to_value(value).context("failed to convert TOML to JSON")
            }),
    }
}

/// Tries `preferred` first, then every other compiled-in format.
pub fn parse_document_any(contents: &str, preferred: DocumentFormat) -> Result<Value> {
    let primary = match parse_document_str(contents, preferred) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    DocumentFormat::available_formats()
        .into_iter()
        .filter(|candidate| *candidate != preferred)
        .find_map(|candidate| parse_document_str(contents, candidate).ok())
        .ok_or_else(|| {
            let tried = DocumentFormat::available_formats()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!("tried {tried} (first error: {primary:#})")
        })
}

/// Parses a document straight into a typed value, e.g. a block definition.
pub fn parse_typed<T: DeserializeOwned>(contents: &str, format: DocumentFormat) -> Result<T> {
    let value = parse_document_any(contents, format)?;
    serde_json::from_value(value).context("document does not have the expected shape")
}
