//! Error types for configuration loading.

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure to produce a configuration bundle.
///
/// Both variants are infrastructure-level: the gate answers them with a
/// synthesized error page and never retries inside the request.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The secret store could not be reached or holds no value for the name.
    #[error("configuration '{name}' unavailable: {detail}")]
    Unavailable { name: String, detail: String },

    /// The stored value does not parse into a [`ConfigBundle`](crate::ConfigBundle).
    #[error("configuration '{name}' malformed: {detail}")]
    Malformed { name: String, detail: String },
}

impl ConfigError {
    /// Short class name suitable for error pages and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::Unavailable { .. } => "ConfigUnavailable",
            ConfigError::Malformed { .. } => "ConfigMalformed",
        }
    }
}

/// Reasons a stored value is not a usable [`ConfigBundle`](crate::ConfigBundle).
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("no region given and none derivable from user_pool_id '{0}'")]
    NoRegion(String),

    #[error("redirect_uri is not an absolute URL: {0}")]
    InvalidRedirectUri(#[from] url::ParseError),

    #[error("redirect_uri has no host")]
    RedirectUriWithoutHost,
}

/// Errors raised by [`SecretStore`](crate::SecretStore) implementations.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parameter store returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid parameter store response: {0}")]
    InvalidResponse(String),

    #[error("invalid parameter store endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}
