// src/config.rs
use serde::Deserialize;
use std::ops::RangeInclusive;

use crate::errors::FreightError;

/// Work factors bcrypt accepts.
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

fn def_http_port() -> u16 {
    3000
}

fn def_bcrypt_cost() -> u32 {
    10
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    /// http port the api listens on
    #[serde(default = "def_http_port")]
    pub http_port: u16,

    /// redis connection url, the in-memory store is used when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// work factor for password hashes
    #[serde(default = "def_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// single origin allowed by CORS, any origin when unset
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_port: def_http_port(),
            redis_url: None,
            bcrypt_cost: def_bcrypt_cost(),
            allowed_origin: None,
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, FreightError> {
        if let Err(error) = dotenv::dotenv() {
            tracing::debug!("No .env file loaded: {}", error);
        }
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, FreightError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: AppConfig = envy::from_iter(vars)
            .map_err(|e| FreightError::Configuration(e.to_string()))?;
        config.validate()
    }

    fn validate(self) -> Result<Self, FreightError> {
        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            return Err(FreightError::Configuration(format!(
                "BCRYPT_COST must be between {} and {}",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            )));
        }
        Ok(Self {
            redis_url: self.redis_url.filter(|url| !url.trim().is_empty()),
            allowed_origin: self.allowed_origin.filter(|origin| !origin.trim().is_empty()),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.bcrypt_cost, 10);
        assert!(config.redis_url.is_none());
        assert!(config.allowed_origin.is_none());
    }

    #[test]
    fn test_reads_environment_names() {
        let config = AppConfig::from_vars(vars(&[
            ("HTTP_PORT", "8080"),
            ("REDIS_URL", "redis://127.0.0.1:6379"),
            ("BCRYPT_COST", "6"),
            ("ALLOWED_ORIGIN", ""),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(config.bcrypt_cost, 6);
        assert!(config.allowed_origin.is_none());
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(matches!(
            AppConfig::from_vars(vars(&[("HTTP_PORT", "not-a-port")])),
            Err(FreightError::Configuration(_))
        ));
        assert!(matches!(
            AppConfig::from_vars(vars(&[("BCRYPT_COST", "99")])),
            Err(FreightError::Configuration(_))
        ));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        assert!(AppConfig::from_vars(vars(&[("BCRYPT_COST", "4")])).is_ok());
        assert!(AppConfig::from_vars(vars(&[("BCRYPT_COST", "31")])).is_ok());
        assert!(AppConfig::from_vars(vars(&[("BCRYPT_COST", "3")])).is_err());
        assert!(AppConfig::from_vars(vars(&[("BCRYPT_COST", "32")])).is_err());
    }
}
