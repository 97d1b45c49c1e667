//! OIDC error types.

use jsonwebtoken::Algorithm;
use thiserror::Error;

pub type OidcResult<T> = Result<T, OidcError>;

#[derive(Debug, Error)]
pub enum OidcError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid identity provider domain: {0}")]
    InvalidDomain(String),

    #[error("Unsupported token algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),

    #[error("Token header carries no key id")]
    MissingKeyId,

    #[error("No signing key with id '{0}'")]
    UnknownKeyId(String),

    #[error("Signing key set unavailable: {0}")]
    KeySetUnavailable(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),
}
