use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, fs, io, path::PathBuf};
use validator::{Validate, ValidationError};

use crate::writer::{self, Format};

// CloudFormation caps stack names at 128 characters.
const MAX_STACK_NAME_LEN: usize = 128;
const STACK_NAME_SUFFIX: &str = "-VPC";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Validation errors: {0}")]
    ValidationError(String),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

/// Generate the Service VPC CloudFormation template for one or more environments.
#[derive(Debug, Parser)]
#[command(name = "vpc-template-generator", version)]
#[command(group(
    clap::ArgGroup::new("source")
        .required(true)
        .args(["env", "config"])
))]
pub struct Args {
    /// Environment to which the template is being created. Ex: Experimental, Development, Production
    #[arg(short, long)]
    pub env: Option<String>,

    /// YAML file listing several environments to generate
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format of the template
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Directory the template files are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Submit each generated template to CloudFormation ValidateTemplate
    #[arg(long)]
    pub validate: bool,

    /// AWS region used by --validate, defaults to the provider chain
    #[arg(long)]
    pub region: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Entries to generate, with command line values filling whatever an entry leaves unset.
    pub fn entries(&self) -> Result<Vec<ConfigEntry>, Error> {
        let entries = match &self.config {
            Some(path) => parse(path)?,
            None => {
                let entry = ConfigEntry {
                    environment: self.env.clone(),
                    region: None,
                    format: None,
                    output_dir: None,
                };
                entry
                    .validate()
                    .map_err(|error| Error::ValidationError(error.to_string()))?;
                vec![entry]
            }
        };

        let entries: Vec<ConfigEntry> = entries
            .into_iter()
            .map(|entry| ConfigEntry {
                region: entry.region.or_else(|| self.region.clone()),
                format: entry.format.or(Some(self.format)),
                output_dir: entry.output_dir.or_else(|| Some(self.output_dir.clone())),
                ..entry
            })
            .collect();

        ensure_distinct_outputs(&entries)?;
        return Ok(entries);
    }
}

/// Environment name a template is generated for.
///
/// Guaranteed non-empty and shaped so that `"{environment}-VPC"` is a valid
/// CloudFormation stack name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match validate_environment(raw) {
            Ok(_) => Ok(Self(raw.to_string())),
            Err(error) => Err(Error::ValidationError(error.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn stack_name(&self) -> String {
        format!("{}{}", self.0, STACK_NAME_SUFFIX)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ConfigEntry {
    #[validate(required, custom = "validate_environment")]
    pub environment: Option<String>,

    pub region: Option<String>,

    pub format: Option<Format>,

    pub output_dir: Option<PathBuf>,
}

impl ConfigEntry {
    pub fn environment(&self) -> Result<Environment, Error> {
        match &self.environment {
            Some(environment) => Environment::parse(environment),
            None => Err(Error::ValidationError(String::from(
                "environment: The environment name is required",
            ))),
        }
    }
}

type Config = Vec<ConfigEntry>;
pub fn parse(path: &PathBuf) -> Result<Config, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    let config: Config = match serde_yaml::from_str(&contents) {
        Ok(data) => Ok(data),
        Err(error) => Err(Error::ParsingError(error.to_string())),
    }?;

    if config.is_empty() {
        return Err(Error::ValidationError(format!(
            "{} does not list any environment",
            path.display()
        )));
    }

    for config_entry in &config {
        match config_entry.validate() {
            Ok(_) => (),
            Err(error) => return Err(Error::ValidationError(error.to_string())),
        }
    }

    tracing::debug!(path = %path.display(), entries = config.len(), "parsed config file");
    return Ok(config);
}

// Output file names lowercase the environment, so `Dev` and `dev` would collide.
fn ensure_distinct_outputs(entries: &[ConfigEntry]) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for entry in entries {
        let environment = entry.environment()?;
        let output_dir = entry.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let path = writer::output_path(&output_dir, &environment, entry.format.unwrap_or_default());
        if !seen.insert(path.clone()) {
            return Err(Error::ValidationError(format!(
                "environment {} would overwrite {}",
                environment,
                path.display()
            )));
        }
    }

    return Ok(());
}

fn validate_environment(environment: &str) -> Result<(), ValidationError> {
    let mut chars = environment.chars();
    let first = match chars.next() {
        Some(first) => first,
        None => return Err(ValidationError::new("The environment name cannot be empty")),
    };
    if !first.is_ascii_alphabetic() {
        return Err(ValidationError::new(
            "The environment name has to start with a letter",
        ));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::new(
            "The environment name may only contain letters, digits and `-`",
        ));
    }
    if environment.len() + STACK_NAME_SUFFIX.len() > MAX_STACK_NAME_LEN {
        return Err(ValidationError::new(
            "The environment name is too long for a CloudFormation stack name",
        ));
    }

    return Ok(());
}
