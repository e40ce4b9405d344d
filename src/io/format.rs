use std::fmt;
use std::path::Path;

/// Supported document formats for schemas, data and block definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Formats compiled into this build, JSON first.
    pub fn available_formats() -> Vec<DocumentFormat> {
        let mut formats = vec![DocumentFormat::Json];
        #[cfg(feature = "yaml")]
        formats.push(DocumentFormat::Yaml);
        #[cfg(feature = "toml")]
        formats.push(DocumentFormat::Toml);
        formats
    }

    /// `None` for unknown extensions and for formats this build lacks.
    pub fn from_extension(path: &Path) -> Option<DocumentFormat> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DocumentFormat::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            #[cfg(feature = "toml")]
            "toml" => Some(DocumentFormat::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => write!(f, "yaml"),
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => write!(f, "toml"),
        }
    }
}
