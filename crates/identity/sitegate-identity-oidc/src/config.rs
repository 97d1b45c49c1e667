//! OIDC client configuration types.

use serde::{Deserialize, Serialize};

/// Issuer URL used when no override is configured. `{region}` and
/// `{pool_id}` are substituted per verification.
pub const DEFAULT_ISSUER_URL_TEMPLATE: &str = "https://cognito-idp.{region}.amazonaws.com/{pool_id}";

/// Scopes requested on every login redirect.
pub const LOGIN_SCOPES: [&str; 2] = ["openid", "email"];

/// Identity-provider client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OidcConfig {
    /// Template for the token issuer URL
    pub issuer_url_template: String,
    /// Timeout applied to every call to the identity provider
    pub http_timeout_seconds: u64,
    /// Clock skew tolerated when checking `exp`
    pub leeway_seconds: u64,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            issuer_url_template: DEFAULT_ISSUER_URL_TEMPLATE.to_string(),
            http_timeout_seconds: 5,
            leeway_seconds: 60,
        }
    }
}

impl OidcConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issuer_url_template(mut self, template: impl Into<String>) -> Self {
        self.issuer_url_template = template.into();
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    /// Issuer URL for a user pool, e.g.
    /// `https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_AbCdEf`.
    pub fn issuer_url(&self, pool_id: &str, region: &str) -> String {
        self.issuer_url_template
            .replace("{region}", region)
            .replace("{pool_id}", pool_id)
            .trim_end_matches('/')
            .to_string()
    }
}
