//! Identity-provider collaborator traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens returned by a successful authorization-code exchange.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSet {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("id_token", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Validates session tokens against the identity provider's signing keys.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Returns `true` only if signature, issuer, audience and expiry all
    /// check out. Every failure collapses to `false`.
    async fn verify(&self, token: &str, pool_id: &str, region: &str, client_id: &str) -> bool;
}

/// Exchanges an authorization code for tokens at the identity provider.
#[async_trait]
pub trait CodeExchanger: Send + Sync {
    /// Returns `None` on any failure: non-success status, network error or
    /// an unexpected response shape.
    async fn exchange_code(
        &self,
        code: &str,
        callback_url: &str,
        idp_domain: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Option<TokenSet>;
}

/// A verifier that accepts exactly one token value.
pub struct StaticSessionVerifier {
    accepted: String,
}

impl StaticSessionVerifier {
    pub fn new(accepted: impl Into<String>) -> Self {
        Self {
            accepted: accepted.into(),
        }
    }
}

#[async_trait]
impl SessionVerifier for StaticSessionVerifier {
    async fn verify(&self, token: &str, _pool_id: &str, _region: &str, _client_id: &str) -> bool {
        token == self.accepted
    }
}
