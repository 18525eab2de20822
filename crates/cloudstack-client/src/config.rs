//! Client configuration
//!
//! Credentials come from a Kubernetes secret (`api-url`, `api-key`, `secret-key`,
//! optional `verify-ssl`). A shared config map may overlay transport settings
//! such as `timeout` (seconds).

use crate::error::CloudStackError;
use std::collections::BTreeMap;
use std::time::Duration;

pub const API_URL_KEY: &str = "api-url";
pub const API_KEY_KEY: &str = "api-key";
pub const SECRET_KEY_KEY: &str = "secret-key";
pub const VERIFY_SSL_KEY: &str = "verify-ssl";
pub const TIMEOUT_KEY: &str = "timeout";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a CloudStack endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub verify_ssl: bool,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            verify_ssl: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parse the credential keys of an endpoint secret.
    pub fn from_secret_data(data: &BTreeMap<String, String>) -> Result<Self, CloudStackError> {
        let required = |key: &str| {
            data.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CloudStackError::Configuration(format!("missing key '{}'", key)))
        };

        let mut config = Self::new(required(API_URL_KEY)?, required(API_KEY_KEY)?, required(SECRET_KEY_KEY)?);
        if let Some(verify) = data.get(VERIFY_SSL_KEY) {
            config.verify_ssl = parse_bool(VERIFY_SSL_KEY, verify)?;
        }
        Ok(config)
    }

    /// Apply settings from the shared client config map.
    pub fn with_overlay(mut self, overlay: &BTreeMap<String, String>) -> Result<Self, CloudStackError> {
        if let Some(timeout) = overlay.get(TIMEOUT_KEY) {
            let secs: u64 = timeout.trim().parse().map_err(|_| {
                CloudStackError::Configuration(format!("invalid '{}' value '{}'", TIMEOUT_KEY, timeout))
            })?;
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(verify) = overlay.get(VERIFY_SSL_KEY) {
            self.verify_ssl = parse_bool(VERIFY_SSL_KEY, verify)?;
        }
        Ok(self)
    }

    /// Same endpoint, different key pair
    pub fn with_keys(&self, api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            ..self.clone()
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CloudStackError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(CloudStackError::Configuration(format!(
            "invalid '{}' value '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> BTreeMap<String, String> {
        BTreeMap::from([
            (API_URL_KEY.to_string(), "https://cloud.example.com/client/api/".to_string()),
            (API_KEY_KEY.to_string(), "key".to_string()),
            (SECRET_KEY_KEY.to_string(), "secret".to_string()),
            (VERIFY_SSL_KEY.to_string(), "false".to_string()),
        ])
    }

    #[test]
    fn test_from_secret_data() {
        let config = ClientConfig::from_secret_data(&secret()).unwrap();
        assert_eq!(config.api_url, "https://cloud.example.com/client/api");
        assert_eq!(config.api_key, "key");
        assert!(!config.verify_ssl);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_missing_key_is_a_configuration_error() {
        let mut data = secret();
        data.remove(SECRET_KEY_KEY);
        let err = ClientConfig::from_secret_data(&data).unwrap_err();
        assert!(matches!(err, CloudStackError::Configuration(msg) if msg.contains("secret-key")));
    }

    #[test]
    fn test_overlay_sets_timeout() {
        let overlay = BTreeMap::from([(TIMEOUT_KEY.to_string(), "90".to_string())]);
        let config = ClientConfig::from_secret_data(&secret())
            .unwrap()
            .with_overlay(&overlay)
            .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(90));

        let bad = BTreeMap::from([(TIMEOUT_KEY.to_string(), "soon".to_string())]);
        assert!(config.with_overlay(&bad).is_err());
    }
}
