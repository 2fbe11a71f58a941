//! Manifest serialization
//!
//! The encoder is built once by the caller and passed to whatever needs to
//! render manifests; there is no process-wide codec registry.

use std::fmt;
use std::str::FromStr;

use super::Manifest;
use crate::error::Result;

/// Document format for rendered manifests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EncodeFormat {
    /// A single YAML sequence holding every manifest
    #[default]
    Yaml,
    /// A pretty-printed JSON array
    Json,
}

impl FromStr for EncodeFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(EncodeFormat::Yaml),
            "json" => Ok(EncodeFormat::Json),
            other => Err(format!("unsupported output format '{}'", other)),
        }
    }
}

impl fmt::Display for EncodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeFormat::Yaml => write!(f, "yaml"),
            EncodeFormat::Json => write!(f, "json"),
        }
    }
}

/// Renders an ordered manifest sequence as one document
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestEncoder {
    format: EncodeFormat,
}

impl ManifestEncoder {
    pub fn new(format: EncodeFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> EncodeFormat {
        self.format
    }

    pub fn encode(&self, manifests: &[Manifest]) -> Result<String> {
        let rendered = match self.format {
            EncodeFormat::Yaml => serde_yaml::to_string(manifests)?,
            EncodeFormat::Json => serde_json::to_string_pretty(manifests)?,
        };
        Ok(rendered)
    }
}
