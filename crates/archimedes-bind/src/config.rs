//! Binder configuration.
//!
//! [`BindConfig`] is loaded in layers: built-in defaults, then an optional TOML
//! file, then environment variables of the form `PREFIX__KEY`.
//!
//! ```toml
//! max_body_size = 1048576
//! max_multipart_fields = 100
//! weakly_typed_input = false
//! reject_unknown_keys = true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BindOptions;

/// Default maximum body size accepted by body collectors (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default maximum number of multipart parts.
pub const DEFAULT_MAX_MULTIPART_FIELDS: usize = 100;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error, including unknown keys.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// A value is out of range.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Why it is invalid.
        reason: String,
    },
}

/// Size limits enforced by the body collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimits {
    /// Largest body, in bytes, a body collector will parse.
    pub max_body_size: usize,
    /// Largest number of parts read from a multipart body.
    pub max_multipart_fields: usize,
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_multipart_fields: DEFAULT_MAX_MULTIPART_FIELDS,
        }
    }
}

/// Limits and default options applied by a [`Binder`](crate::Binder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BindConfig {
    /// Largest body, in bytes, a body collector will parse.
    pub max_body_size: usize,
    /// Largest number of parts read from a multipart body.
    pub max_multipart_fields: usize,
    /// Default for [`BindOptions::weakly_typed_input`].
    pub weakly_typed_input: bool,
    /// Default for [`BindOptions::reject_unknown_keys`].
    pub reject_unknown_keys: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        let options = BindOptions::default();
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_multipart_fields: DEFAULT_MAX_MULTIPART_FIELDS,
            weakly_typed_input: options.weakly_typed_input,
            reject_unknown_keys: options.reject_unknown_keys,
        }
    }
}

impl BindConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `PREFIX__MAX_BODY_SIZE`, `PREFIX__MAX_MULTIPART_FIELDS`,
    /// `PREFIX__WEAKLY_TYPED_INPUT` and `PREFIX__REJECT_UNKNOWN_KEYS`.
    pub fn apply_env_prefix(self, prefix: &str) -> Result<Self, ConfigError> {
        self.apply_vars(prefix, |name| env::var(name).ok())
    }

    fn apply_vars(
        mut self,
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| format!("{prefix}__{key}");

        if let Some(value) = lookup(&var("MAX_BODY_SIZE")) {
            self.max_body_size = parse_env(&var("MAX_BODY_SIZE"), &value)?;
        }
        if let Some(value) = lookup(&var("MAX_MULTIPART_FIELDS")) {
            self.max_multipart_fields = parse_env(&var("MAX_MULTIPART_FIELDS"), &value)?;
        }
        if let Some(value) = lookup(&var("WEAKLY_TYPED_INPUT")) {
            self.weakly_typed_input = parse_env(&var("WEAKLY_TYPED_INPUT"), &value)?;
        }
        if let Some(value) = lookup(&var("REJECT_UNKNOWN_KEYS")) {
            self.reject_unknown_keys = parse_env(&var("REJECT_UNKNOWN_KEYS"), &value)?;
        }

        Ok(self)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_body_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_multipart_fields == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_multipart_fields".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the body limits this configuration describes.
    #[must_use]
    pub fn limits(&self) -> BodyLimits {
        BodyLimits {
            max_body_size: self.max_body_size,
            max_multipart_fields: self.max_multipart_fields,
        }
    }

    /// Returns the default binding options this configuration describes.
    #[must_use]
    pub fn options(&self) -> BindOptions {
        BindOptions::new()
            .weakly_typed_input(self.weakly_typed_input)
            .reject_unknown_keys(self.reject_unknown_keys)
    }
}

fn parse_env<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvParseError {
        var: var.to_string(),
        reason: e.to_string(),
    })
}
