use std::path::{Path, PathBuf};
use thiserror::Error;

const SAMPLE_CONFIG: &str = include_str!("../config/sample.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing config key `{0}`")]
    MissingKey(String),

    #[error("config key `{key}` should be a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("config key `{key}` has malformed value `{value}`")]
    Malformed { key: String, value: String },

    #[error("config key `{key}` is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

/// Key-value configuration store addressed by dotted paths
/// such as `detection.min_area_heated_area`
#[derive(Debug, Clone)]
pub struct Config {
    table: toml::Table,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(text)?;
        Ok(Self { table })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The configuration shipped with the crate
    pub fn sample() -> Result<Self, ConfigError> {
        Self::from_toml_str(SAMPLE_CONFIG)
    }

    fn lookup(&self, key: &str) -> Result<&toml::Value, ConfigError> {
        let mut parts = key.split('.');
        let first = parts.next().unwrap_or_default();
        let mut value = self
            .table
            .get(first)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;

        for part in parts {
            value = value
                .get(part)
                .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
        }

        Ok(value)
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        self.lookup(key)?
            .as_integer()
            .ok_or_else(|| ConfigError::WrongType {
                key: key.to_string(),
                expected: "integer",
            })
    }

    /// Integers are accepted and widened
    pub fn get_float(&self, key: &str) -> Result<f64, ConfigError> {
        match self.lookup(key)? {
            toml::Value::Float(v) => Ok(*v),
            toml::Value::Integer(v) => Ok(*v as f64),
            _ => Err(ConfigError::WrongType {
                key: key.to_string(),
                expected: "number",
            }),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.lookup(key)?
            .as_str()
            .ok_or_else(|| ConfigError::WrongType {
                key: key.to_string(),
                expected: "string",
            })
    }
}
