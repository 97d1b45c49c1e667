//! OIDC building blocks for the sitegate edge gate.
//!
//! This crate provides the confidential-client half of the OAuth2
//! authorization-code flow (login URL, code exchange), verification of the
//! identity tokens the gate keeps in its session cookie, and the codec that
//! carries a caller's original destination through the `state` parameter.

mod client;
mod config;
mod error;
mod state;
mod types;
mod verifier;

#[cfg(test)]
mod tests;

pub use client::{OidcClient, build_login_url, build_logout_url, idp_base_url};
pub use config::{DEFAULT_ISSUER_URL_TEMPLATE, LOGIN_SCOPES, OidcConfig};
pub use error::{OidcError, OidcResult};
pub use state::{RedirectState, RedirectStateCodec, STATE_DELIMITER};
pub use types::{IdTokenClaims, TokenResponse};
pub use verifier::JwksSessionVerifier;

// Re-export common types for convenience
pub use sitegate_core::{CodeExchanger, SessionVerifier, TokenSet};
