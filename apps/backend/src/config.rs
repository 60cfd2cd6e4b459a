//! Service configuration from environment variables.

use std::sync::Arc;

use thiserror::Error;
use vocab_core::{get_algorithm, ReviewSettings, SpacedRepetitionAlgorithm};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration.
///
/// Env vars (all optional):
/// - HOST: bind address (default "0.0.0.0")
/// - PORT: bind port (default 3000)
/// - RUST_LOG: tracing filter (default "info")
/// - REVIEW_BATCH_CAP: maximum words per review session (default 10)
/// - REVIEW_ALGORITHM: scheduling algorithm name (default "sm2")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_filter: String,
    pub review: ReviewSettings,
    pub algorithm: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns the raw value for a key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 3000)?;
        let log_filter = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let batch_cap = parse_or(&lookup, "REVIEW_BATCH_CAP", ReviewSettings::default().batch_cap)?;

        let algorithm = lookup("REVIEW_ALGORITHM").unwrap_or_else(|| "sm2".to_string());
        if get_algorithm(algorithm.trim()).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "REVIEW_ALGORITHM",
                value: algorithm,
            });
        }

        Ok(Self {
            host,
            port,
            log_filter,
            review: ReviewSettings { batch_cap },
            algorithm: algorithm.trim().to_string(),
        })
    }

    /// The configured scheduling algorithm.
    pub fn scheduler(&self) -> Result<Arc<dyn SpacedRepetitionAlgorithm>, ConfigError> {
        get_algorithm(&self.algorithm)
            .map(Arc::<dyn SpacedRepetitionAlgorithm>::from)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "REVIEW_ALGORITHM",
                value: self.algorithm.clone(),
            })
    }

    /// Socket address to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
