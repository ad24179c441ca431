//! Format-agnostic configuration loading and saving

use crate::{Error, IdentityPath, Result, io};
use serde::{Serialize, de::DeserializeOwned};

/// Format-agnostic configuration store.
///
/// Detects the format from the file extension and handles
/// serialization/deserialization transparently.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    /// Create a new ConfigStore.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load<T: DeserializeOwned>(&self, path: &IdentityPath) -> Result<T> {
        let extension = extension_of(path);
        let format = Format::from_extension(&extension)?;
        let content = io::read_text(path)?;

        let parsed = match format {
            Format::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })
    }

    /// Save configuration to a file.
    ///
    /// Format is determined from file extension.
    /// Uses atomic write to prevent corruption.
    pub fn save<T: Serialize>(&self, path: &IdentityPath, value: &T) -> Result<()> {
        let extension = extension_of(path);
        let format = Format::from_extension(&extension)?;

        let content = match format {
            Format::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Format::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        }
        .map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })?;

        io::write_atomic(path, content.as_bytes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    fn from_extension(extension: &str) -> Result<Self> {
        match extension.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

fn extension_of(path: &IdentityPath) -> String {
    path.segments()
        .last()
        .and_then(|name| {
            let idx = name.rfind('.')?;
            (idx > 0).then(|| name[idx + 1..].to_string())
        })
        .unwrap_or_default()
}
