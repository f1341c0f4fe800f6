use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

pub const DEFAULT_TEXT_PRECISION: u8 = 3;
pub const MAX_TEXT_PRECISION: u8 = 15;
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid geometry config: {0}")]
    Parse(String),

    #[error("failed to read geometry config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("geometry config rejected: {0}")]
    Invalid(String),
}

///
/// IncompatibleOrdering
///
/// What `compare_to` does when the operands come from different backends.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompatibleOrdering {
    /// Return `IncompatibleBackend`.
    #[default]
    Fail,

    /// Order by backend id, then by canonical bytes.
    ByBackendId,
}

///
/// CacheConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Number of interning slots, rounded up to a power of two. 0 disables
    /// interning.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

///
/// GeometryConfig
///
/// Process-level geometry settings, normally read once at startup from TOML.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    /// Provider name to select. `None` picks the first registered provider.
    pub backend: Option<String>,

    /// Fractional digits written by the text form.
    pub text_precision: u8,

    pub ordering: IncompatibleOrdering,

    pub cache: CacheConfig,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            backend: None,
            text_precision: DEFAULT_TEXT_PRECISION,
            ordering: IncompatibleOrdering::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl GeometryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.text_precision > MAX_TEXT_PRECISION {
            return Err(ConfigError::Invalid(format!(
                "text_precision {} exceeds maximum {MAX_TEXT_PRECISION}",
                self.text_precision
            )));
        }

        if let Some(name) = &self.backend
            && name.trim().is_empty()
        {
            return Err(ConfigError::Invalid("backend name is empty".to_string()));
        }

        Ok(())
    }

    #[must_use]
    pub fn with_backend(mut self, name: impl Into<String>) -> Self {
        self.backend = Some(name.into());
        self
    }

    #[must_use]
    pub const fn with_ordering(mut self, ordering: IncompatibleOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache.capacity = capacity;
        self
    }
}

///
/// TESTS
///
