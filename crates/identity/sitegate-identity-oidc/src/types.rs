//! OIDC protocol types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}

/// Claims read from a verified identity token.
///
/// Issuer, audience and expiry are enforced by the validator; only the
/// fields useful for logging are kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub exp: i64,
    pub email: Option<String>,
    pub token_use: Option<String>,
    #[serde(flatten)]
    pub additional_claims: HashMap<String, serde_json::Value>,
}
