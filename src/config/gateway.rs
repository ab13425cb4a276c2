//! Gateway configuration (Flutterwave credentials and webhook settings)

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use super::error::ValidationError;
use crate::application::handlers::webhook::{
    WebhookGateConfig, DEFAULT_MAX_BODY_SIZE, DEFAULT_RATE_LIMIT_PER_MINUTE,
};
use crate::domain::gateway::{ApiVersion, Credential, GatewayEnvironment, GatewayError};
use crate::domain::webhook::IpAllowList;

/// Gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Public key (OAuth client id for v4)
    pub public_key: Option<SecretString>,

    /// Secret key (v3 bearer, OAuth client secret for v4)
    pub secret_key: Option<SecretString>,

    pub encryption_key: Option<SecretString>,

    /// Expected value of the `verif-hash` webhook header
    pub webhook_secret_hash: Option<SecretString>,

    #[serde(default)]
    pub environment: GatewayEnvironment,

    #[serde(default)]
    pub api_version: ApiVersion,

    /// Overrides the versioned default base URL
    pub base_url: Option<String>,

    #[serde(default = "default_currency")]
    pub default_currency: String,

    #[serde(default = "default_country")]
    pub default_country: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub log_requests: bool,

    /// IPs or CIDR ranges allowed to call the webhook; empty allows all
    #[serde(default, deserialize_with = "string_or_list")]
    pub webhook_allowed_ips: Vec<String>,

    /// Requests per minute per source IP; 0 disables
    #[serde(default = "default_rate_limit")]
    pub webhook_rate_limit: u32,

    /// Maximum webhook body size in bytes
    #[serde(default = "default_max_size")]
    pub webhook_max_size: u64,

    #[serde(default = "default_true")]
    pub webhook_validate_timestamp: bool,

    /// Take the source IP from `X-Forwarded-For` / `X-Real-IP`
    #[serde(default)]
    pub webhook_trust_proxy_headers: bool,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_live(&self) -> bool {
        self.environment == GatewayEnvironment::Live
    }

    /// Parses the webhook allow-list.
    pub fn allowed_ips(&self) -> Result<IpAllowList, ValidationError> {
        IpAllowList::parse(&self.webhook_allowed_ips)
            .map_err(|e| ValidationError::InvalidAllowedIp(e.to_string()))
    }

    /// Builds validated API credentials.
    pub fn credential(&self) -> Result<Credential, GatewayError> {
        let public_key = exposed(&self.public_key);
        let secret_key = exposed(&self.secret_key);

        let mut credential = Credential::new(public_key, secret_key)?
            .with_api_version(self.api_version)
            .with_environment(self.environment)
            .with_timeout(self.timeout())
            .with_regional_defaults(&self.default_currency, &self.default_country);

        if let Some(key) = &self.encryption_key {
            credential = credential.with_encryption_key(key.expose_secret().as_str());
        }
        if let Some(base_url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            credential = credential.with_base_url(base_url.trim())?;
        }

        Ok(credential)
    }

    /// Settings for the webhook admission gate.
    pub fn webhook_gate_config(&self) -> Result<WebhookGateConfig, ValidationError> {
        let secret_hash = self
            .webhook_secret_hash
            .as_ref()
            .filter(|hash| !hash.expose_secret().trim().is_empty())
            .cloned();

        Ok(WebhookGateConfig {
            max_body_size: self.webhook_max_size,
            allowed_ips: self.allowed_ips()?,
            rate_limit_per_minute: self.webhook_rate_limit,
            validate_timestamp: self.webhook_validate_timestamp,
            secret_hash,
        })
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if exposed(&self.secret_key).trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__SECRET_KEY"));
        }
        if exposed(&self.public_key).trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__PUBLIC_KEY"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.webhook_max_size == 0 {
            return Err(ValidationError::InvalidMaxSize);
        }
        self.allowed_ips()?;
        self.credential().map_err(|e| match e {
            GatewayError::Config(msg) => ValidationError::InvalidBaseUrl(msg),
            other => ValidationError::InvalidBaseUrl(other.to_string()),
        })?;
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            secret_key: None,
            encryption_key: None,
            webhook_secret_hash: None,
            environment: GatewayEnvironment::default(),
            api_version: ApiVersion::default(),
            base_url: None,
            default_currency: default_currency(),
            default_country: default_country(),
            timeout_secs: default_timeout(),
            log_requests: false,
            webhook_allowed_ips: Vec::new(),
            webhook_rate_limit: default_rate_limit(),
            webhook_max_size: default_max_size(),
            webhook_validate_timestamp: true,
            webhook_trust_proxy_headers: false,
        }
    }
}

fn exposed(secret: &Option<SecretString>) -> &str {
    secret.as_ref().map(|s| s.expose_secret().as_str()).unwrap_or_default()
}

/// Accepts `"a, b"` or `["a", "b"]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        String(String),
        List(Vec<String>),
    }

    let entries = match StringOrList::deserialize(deserializer)? {
        StringOrList::String(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        StringOrList::List(list) => list,
    };

    Ok(entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect())
}

fn default_currency() -> String {
    "NGN".to_string()
}

fn default_country() -> String {
    "NG".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT_PER_MINUTE
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_BODY_SIZE
}

fn default_true() -> bool {
    true
}
