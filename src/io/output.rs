use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use super::DocumentFormat;

/// Where a rendered blueprint or edited document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDestination {
    Stdout,
    File(PathBuf),
}

impl OutputDestination {
    pub fn file(path: impl AsRef<Path>) -> Self {
        OutputDestination::File(path.as_ref().to_path_buf())
    }

    /// `-` means stdout; anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            OutputDestination::Stdout
        } else {
            OutputDestination::file(raw)
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: DocumentFormat,
    pub pretty: bool,
    pub destinations: Vec<OutputDestination>,
}

impl OutputOptions {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            pretty: true,
            destinations: vec![OutputDestination::Stdout],
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_destinations(mut self, destinations: Vec<OutputDestination>) -> Self {
        self.destinations = destinations;
        self
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::new(DocumentFormat::Json)
    }
}

pub fn serialize_document(value: &Value, format: DocumentFormat, pretty: bool) -> Result<String> {
    match format {
        DocumentFormat::Json if pretty => {
            serde_json::to_string_pretty(value).context("failed to serialize JSON")
        }
        DocumentFormat::Json => serde_json::to_string(value).context("failed to serialize JSON"),
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::to_string(value).context("failed to serialize YAML"),
        #[cfg(feature = "toml")]
        DocumentFormat::Toml if pretty => {
            toml::to_string_pretty(value).context("failed to serialize TOML")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => toml::to_string(value).context("failed to serialize TOML"),
    }
}

/// Serializes once and writes the payload to every destination.
pub fn emit(value: &Value, options: &OutputOptions) -> Result<()> {
    if options.destinations.is_empty() {
        return Ok(());
    }
    let payload = serialize_document(value, options.format, options.pretty)?;
    for destination in &options.destinations {
        write_payload(destination, &payload).with_context(|| match destination {
            OutputDestination::Stdout => "failed to write to stdout".to_string(),
            OutputDestination::File(path) => {
                format!("failed to write to file {}", path.display())
            }
        })?;
    }
    Ok(())
}

fn write_payload(destination: &OutputDestination, payload: &str) -> Result<()> {
    let mut writer: Box<dyn Write> = match destination {
        OutputDestination::Stdout => Box::new(io::stdout().lock()),
        OutputDestination::File(path) => Box::new(File::create(path)?),
    };
    writer.write_all(payload.as_bytes())?;
    if !payload.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
