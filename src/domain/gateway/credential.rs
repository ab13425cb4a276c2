//! Gateway credentials and the settings that travel with them.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use super::errors::GatewayError;

/// Hosts an operator-supplied base URL may point at (exact or subdomain).
pub const ALLOWED_HOST_SUFFIXES: [&str; 1] = ["flutterwave.com"];

/// Default total request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Currency applied to payment requests that do not name one.
pub const DEFAULT_CURRENCY: &str = "NGN";

/// Country used for bank listings when none is given.
pub const DEFAULT_COUNTRY: &str = "NG";

/// Gateway API generation; decides how requests authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Static bearer secret key.
    #[default]
    V3,
    /// OAuth client-credentials bearer token.
    V4,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V3 => "v3",
            ApiVersion::V4 => "v4",
        }
    }

    /// True when calls must present an OAuth access token.
    pub fn uses_oauth(&self) -> bool {
        matches!(self, ApiVersion::V4)
    }
}

impl FromStr for ApiVersion {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v3" => Ok(ApiVersion::V3),
            "v4" => Ok(ApiVersion::V4),
            other => Err(GatewayError::config(format!(
                "Unsupported API version '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gateway account mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    #[default]
    Test,
    Live,
}

/// Immutable, validated gateway credentials.
///
/// Keys are trimmed on construction and never appear in `Debug` output.
#[derive(Clone)]
pub struct Credential {
    public_key: SecretString,
    secret_key: SecretString,
    encryption_key: Option<SecretString>,
    base_url: Option<String>,
    api_version: ApiVersion,
    environment: GatewayEnvironment,
    timeout: Duration,
    default_currency: String,
    default_country: String,
}

impl Credential {
    /// Creates credentials from the public and secret keys.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if either key is empty.
    pub fn new(
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let public_key = public_key.into().trim().to_string();
        let secret_key = secret_key.into().trim().to_string();

        if secret_key.is_empty() {
            return Err(GatewayError::config("Flutterwave secret key is required"));
        }
        if public_key.is_empty() {
            return Err(GatewayError::config("Flutterwave public key is required"));
        }

        Ok(Self {
            public_key: SecretString::new(public_key),
            secret_key: SecretString::new(secret_key),
            encryption_key: None,
            base_url: None,
            api_version: ApiVersion::default(),
            environment: GatewayEnvironment::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_currency: DEFAULT_CURRENCY.to_string(),
            default_country: DEFAULT_COUNTRY.to_string(),
        })
    }

    /// Overrides the API base URL.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` unless the URL is HTTPS and its host is
    /// one of [`ALLOWED_HOST_SUFFIXES`] or a subdomain of one.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, GatewayError> {
        validate_base_url(base_url)?;
        self.base_url = Some(base_url.to_string());
        Ok(self)
    }

    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_environment(mut self, environment: GatewayEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the currency and country used when a request leaves them out.
    /// Blank values keep the current setting; both are upper-cased.
    pub fn with_regional_defaults(mut self, currency: &str, country: &str) -> Self {
        if !currency.trim().is_empty() {
            self.default_currency = currency.trim().to_ascii_uppercase();
        }
        if !country.trim().is_empty() {
            self.default_country = country.trim().to_ascii_uppercase();
        }
        self
    }

    pub fn with_encryption_key(mut self, encryption_key: impl Into<String>) -> Self {
        let key = encryption_key.into();
        self.encryption_key = (!key.trim().is_empty()).then(|| SecretString::new(key));
        self
    }

    /// Exposes the public key (OAuth client id).
    pub fn public_key(&self) -> &str {
        self.public_key.expose_secret()
    }

    /// Exposes the secret key (v3 bearer, OAuth client secret).
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    /// Exposes the encryption key, when configured.
    pub fn encryption_key(&self) -> Option<&str> {
        self.encryption_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn environment(&self) -> GatewayEnvironment {
        self.environment
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    pub fn default_country(&self) -> &str {
        &self.default_country
    }

    /// Resolved API base URL: the validated override, else the versioned default.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => format!("https://api.flutterwave.com/{}/", self.api_version),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("public_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url())
            .field("api_version", &self.api_version)
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .field("default_currency", &self.default_currency)
            .field("default_country", &self.default_country)
            .finish()
    }
}

fn validate_base_url(base_url: &str) -> Result<(), GatewayError> {
    let url = Url::parse(base_url)
        .map_err(|e| GatewayError::config(format!("Invalid base URL: {}", e)))?;

    if url.scheme() != "https" {
        return Err(GatewayError::config("Base URL must use HTTPS"));
    }

    let host = url
        .host_str()
        .ok_or_else(|| GatewayError::config("Base URL has no host"))?
        .to_ascii_lowercase();

    let allowed = ALLOWED_HOST_SUFFIXES
        .iter()
        .any(|suffix| host == *suffix || host.ends_with(&format!(".{}", suffix)));

    if !allowed {
        return Err(GatewayError::config(format!(
            "Base URL host '{}' is not an allowed gateway domain",
            host
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential::new("FLWPUBK_TEST-abc", "FLWSECK_TEST-xyz").unwrap()
    }

    #[test]
    fn requires_both_keys() {
        assert!(matches!(
            Credential::new("pub", "  "),
            Err(GatewayError::Config(msg)) if msg.contains("secret key")
        ));
        assert!(matches!(
            Credential::new("", "sec"),
            Err(GatewayError::Config(msg)) if msg.contains("public key")
        ));
    }

    #[test]
    fn keys_are_trimmed() {
        let cred = Credential::new("  pub \n", "\tsec ").unwrap();
        assert_eq!(cred.public_key(), "pub");
        assert_eq!(cred.secret_key(), "sec");
    }

    #[test]
    fn default_base_url_follows_api_version() {
        assert_eq!(credential().base_url(), "https://api.flutterwave.com/v3/");
        assert_eq!(
            credential().with_api_version(ApiVersion::V4).base_url(),
            "https://api.flutterwave.com/v4/"
        );
    }

    #[test]
    fn explicit_base_url_wins_when_allowed() {
        let cred = credential()
            .with_base_url("https://developersandbox-api.flutterwave.com/")
            .unwrap();
        assert_eq!(cred.base_url(), "https://developersandbox-api.flutterwave.com/");

        assert!(credential().with_base_url("https://flutterwave.com/v3/").is_ok());
    }

    #[test]
    fn rejects_non_https_base_url() {
        let err = credential()
            .with_base_url("http://api.flutterwave.com/v3/")
            .unwrap_err();
        assert!(err.to_string().contains("HTTPS"));
    }

    #[test]
    fn rejects_foreign_and_lookalike_hosts() {
        assert!(credential().with_base_url("https://evil.example/v3/").is_err());
        assert!(credential().with_base_url("https://notflutterwave.com/v3/").is_err());
        assert!(credential()
            .with_base_url("https://api.flutterwave.com.evil.example/")
            .is_err());
    }

    #[test]
    fn debug_output_hides_keys() {
        let debug = format!("{:?}", credential().with_encryption_key("FLWENC-123"));
        assert!(!debug.contains("FLWSECK"));
        assert!(!debug.contains("FLWPUBK"));
        assert!(!debug.contains("FLWENC"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn regional_defaults_fall_back_when_blank() {
        let cred = credential();
        assert_eq!(cred.default_currency(), DEFAULT_CURRENCY);
        assert_eq!(cred.default_country(), DEFAULT_COUNTRY);

        let cred = credential().with_regional_defaults(" usd ", "gh");
        assert_eq!(cred.default_currency(), "USD");
        assert_eq!(cred.default_country(), "GH");

        let cred = credential().with_regional_defaults("", "  ");
        assert_eq!(cred.default_currency(), DEFAULT_CURRENCY);
        assert_eq!(cred.default_country(), DEFAULT_COUNTRY);
    }

    #[test]
    fn api_version_parses_case_insensitively() {
        assert_eq!("V4".parse::<ApiVersion>().unwrap(), ApiVersion::V4);
        assert_eq!(" v3 ".parse::<ApiVersion>().unwrap(), ApiVersion::V3);
        assert!("v5".parse::<ApiVersion>().is_err());
    }
}
