//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::error::Category;
use thiserror::Error;

use crate::config::preprocess::{line_of_offset, offset_of, preprocess};
use crate::config::schema::{Route, ServerConfig};
use crate::config::validation::ValidationError;
use crate::routing::RouteTable;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON. `line` counts lines of the file as written.
    #[error("Syntax error in {source_name}\nLine: {line} - {message}")]
    Syntax {
        source_name: String,
        line: usize,
        message: String,
    },

    /// Well-formed JSON that does not describe a list of routes.
    #[error("Error parsing {source_name}\n{message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Invalid settings in {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Validation failed:\n{}", render(.0))]
    Validation(Vec<ValidationError>),
}

fn render(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a route document. `source_name` only appears in error messages.
pub fn parse_routes(source_name: &str, raw: &[u8]) -> Result<RouteTable, ConfigError> {
    let cleaned = preprocess(raw);

    let routes: Vec<Route> = serde_json::from_slice(&cleaned).map_err(|e| match e.classify() {
        Category::Syntax | Category::Eof => {
            let offset = offset_of(&cleaned, e.line(), e.column());
            ConfigError::Syntax {
                source_name: source_name.to_string(),
                line: line_of_offset(raw, offset),
                message: message_of(&e),
            }
        }
        Category::Data | Category::Io => ConfigError::Parse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        },
    })?;

    RouteTable::new(routes).map_err(ConfigError::Validation)
}

/// serde_json appends its own "at line X column Y", which would name the
/// wrong line once comments and multi-line strings are involved.
fn message_of(e: &serde_json::Error) -> String {
    let full = e.to_string();
    match full.rfind(" at line ") {
        Some(pos) => full[..pos].to_string(),
        None => full,
    }
}

/// Read and parse the route file at `path`.
pub fn load_routes(path: &Path) -> Result<RouteTable, ConfigError> {
    let raw = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_routes(&path.display().to_string(), &raw)
}

/// Load server settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Settings {
        path: path.to_path_buf(),
        source,
    })
}
