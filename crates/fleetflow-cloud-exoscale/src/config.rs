//! Provider configuration

use crate::error::{ExoscaleError, Result};
use std::time::Duration;

pub const DEFAULT_ENVIRONMENT: &str = "api";
pub const DEFAULT_ZONE: &str = "ch-gva-2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection settings for the Exoscale API
#[derive(Debug, Clone)]
pub struct ExoscaleConfig {
    pub api_key: String,
    pub api_secret: String,
    /// API environment, the first label of the endpoint host
    pub environment: String,
    /// Full endpoint override, mostly for tests and private deployments
    pub endpoint: Option<String>,
    /// Zone used for zone-less lookups such as DNS domains
    pub default_zone: String,
    /// Bound of every lifecycle operation
    pub timeout: Duration,
}

impl ExoscaleConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            endpoint: None,
            default_zone: DEFAULT_ZONE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create ExoscaleConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("EXOSCALE_API_KEY")
            .map_err(|_| ExoscaleError::MissingEnvVar("EXOSCALE_API_KEY".to_string()))?;
        let api_secret = std::env::var("EXOSCALE_API_SECRET")
            .map_err(|_| ExoscaleError::MissingEnvVar("EXOSCALE_API_SECRET".to_string()))?;

        let mut config = Self::new(api_key, api_secret);

        if let Ok(environment) = std::env::var("EXOSCALE_ENVIRONMENT") {
            config.environment = environment;
        }
        if let Ok(endpoint) = std::env::var("EXOSCALE_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Ok(zone) = std::env::var("EXOSCALE_ZONE") {
            config.default_zone = zone;
        }
        if let Ok(timeout) = std::env::var("EXOSCALE_TIMEOUT") {
            let secs = timeout.parse::<u64>().map_err(|_| {
                ExoscaleError::InvalidConfig(format!(
                    "EXOSCALE_TIMEOUT must be a number of seconds, got {:?}",
                    timeout
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_default_zone(mut self, zone: impl Into<String>) -> Self {
        self.default_zone = zone.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(ExoscaleError::InvalidConfig(
                "API key and secret must not be empty".to_string(),
            ));
        }
        if self.environment.is_empty() {
            return Err(ExoscaleError::InvalidConfig(
                "environment must not be empty".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ExoscaleError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL of the v2 API
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.exoscale.com/v2", self.environment),
        }
    }
}
