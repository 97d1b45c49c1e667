//! Identity-token verification against the issuer's published signing keys.

use crate::config::OidcConfig;
use crate::error::{OidcError, OidcResult};
use crate::types::IdTokenClaims;
use async_trait::async_trait;
use dashmap::DashMap;
use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use sitegate_core::SessionVerifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Verifies RS256 identity tokens and caches each issuer's key set.
///
/// A key set is cached for the life of the process once fetched
/// successfully. Failed fetches are not cached, so the next request retries.
#[derive(Debug, Clone)]
pub struct JwksSessionVerifier {
    config: OidcConfig,
    http_client: Client,
    jwks_cache: Arc<DashMap<String, Arc<JwkSet>>>,
}

impl JwksSessionVerifier {
    pub fn new(config: &OidcConfig) -> OidcResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        Ok(Self {
            config: config.clone(),
            http_client,
            jwks_cache: Arc::new(DashMap::new()),
        })
    }

    /// Number of issuers whose key set is currently cached.
    pub fn cached_issuers(&self) -> usize {
        self.jwks_cache.len()
    }

    /// Fully validate `token` and return its claims.
    pub async fn validate(
        &self,
        token: &str,
        pool_id: &str,
        region: &str,
        client_id: &str,
    ) -> OidcResult<IdTokenClaims> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(OidcError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header.kid.as_deref().ok_or(OidcError::MissingKeyId)?;

        let issuer = self.config.issuer_url(pool_id, region);
        let jwks = self.key_set(&issuer).await?;
        let jwk = jwks
            .find(kid)
            .ok_or_else(|| OidcError::UnknownKeyId(kid.to_string()))?;
        if !matches!(jwk.algorithm, AlgorithmParameters::RSA(_)) {
            return Err(OidcError::UnsupportedAlgorithm(header.alg));
        }
        let decoding_key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&[client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = self.config.leeway_seconds;

        let data = decode::<IdTokenClaims>(token, &decoding_key, &validation)?;
        Ok(data.claims)
    }

    async fn key_set(&self, issuer: &str) -> OidcResult<Arc<JwkSet>> {
        if let Some(entry) = self.jwks_cache.get(issuer) {
            return Ok(entry.value().clone());
        }

        let jwks_url = format!("{issuer}/.well-known/jwks.json");
        let response = self.http_client.get(&jwks_url).send().await?;
        if !response.status().is_success() {
            return Err(OidcError::KeySetUnavailable(format!(
                "{jwks_url} answered {}",
                response.status()
            )));
        }
        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| OidcError::KeySetUnavailable(e.to_string()))?;

        info!(issuer, keys = jwks.keys.len(), "Fetched signing key set");
        let jwks = Arc::new(jwks);
        self.jwks_cache.insert(issuer.to_string(), jwks.clone());
        Ok(jwks)
    }
}

#[async_trait]
impl SessionVerifier for JwksSessionVerifier {
    async fn verify(&self, token: &str, pool_id: &str, region: &str, client_id: &str) -> bool {
        match self.validate(token, pool_id, region, client_id).await {
            Ok(claims) => {
                debug!(sub = %claims.sub, "Session token verified");
                true
            }
            Err(e) => {
                debug!(error = %e, "Session token rejected");
                false
            }
        }
    }
}
