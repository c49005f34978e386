use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Environment;
use crate::template::Template;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unable to serialize the template: {0}")]
    Serialization(String),

    #[error("Unable to write {path}: {reason}")]
    Io { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

/// Renders the template with every mapping key sorted, so equal templates give equal bytes.
pub fn render(template: &Template, format: Format) -> Result<String, Error> {
    // serde_json::Value keeps object keys in a BTreeMap.
    let value = serde_json::to_value(template).map_err(|e| Error::Serialization(e.to_string()))?;

    match format {
        Format::Json => render_json(&value),
        Format::Yaml => serde_yaml::to_string(&value).map_err(|e| Error::Serialization(e.to_string())),
    }
}

fn render_json(value: &serde_json::Value) -> Result<String, Error> {
    let mut contents = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut contents, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| Error::Serialization(e.to_string()))?;

    String::from_utf8(contents).map_err(|e| Error::Serialization(e.to_string()))
}

/// A rendered template waiting to be written.
#[derive(Debug)]
pub struct PendingTemplate {
    pub environment: Environment,
    pub format: Format,
    pub output_dir: PathBuf,
    pub contents: String,
}

impl PendingTemplate {
    pub fn write(&self) -> Result<PathBuf, Error> {
        write(&self.output_dir, &self.environment, self.format, &self.contents)
    }
}

pub fn output_path(dir: &Path, environment: &Environment, format: Format) -> PathBuf {
    dir.join(format!(
        "template_{}.{}",
        environment.as_str().to_lowercase(),
        format.extension()
    ))
}

/// Writes the rendered template next to its final location and renames it into place.
pub fn write(
    dir: &Path,
    environment: &Environment,
    format: Format,
    contents: &str,
) -> Result<PathBuf, Error> {
    let path = output_path(dir, environment, format);
    let io_error = |reason: String| Error::Io {
        path: path.display().to_string(),
        reason,
    };

    fs::create_dir_all(dir).map_err(|e| io_error(e.to_string()))?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_error(e.to_string()))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| io_error(e.to_string()))?;
    file.flush().map_err(|e| io_error(e.to_string()))?;
    file.persist(&path)
        .map_err(|e| io_error(e.error.to_string()))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "template written");
    return Ok(path);
}
