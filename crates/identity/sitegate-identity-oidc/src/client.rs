//! Authorization-code flow against the identity provider's hosted UI.

use crate::config::{LOGIN_SCOPES, OidcConfig};
use crate::error::{OidcError, OidcResult};
use crate::types::TokenResponse;
use async_trait::async_trait;
use reqwest::Client;
use sitegate_core::{CodeExchanger, TokenSet};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Base URL of the identity provider.
///
/// A bare domain such as `auth.example.com` is served over HTTPS; a value
/// that already carries a scheme is used as given.
pub fn idp_base_url(idp_domain: &str) -> OidcResult<Url> {
    let domain = idp_domain.trim().trim_end_matches('/');
    if domain.is_empty() {
        return Err(OidcError::InvalidDomain(idp_domain.to_string()));
    }

    let url = if domain.contains("://") {
        Url::parse(domain)?
    } else {
        Url::parse(&format!("https://{domain}"))?
    };

    if url.host_str().is_none() {
        return Err(OidcError::InvalidDomain(idp_domain.to_string()));
    }
    Ok(url)
}

/// Hosted-login URL for the authorization-code flow.
///
/// No PKCE: the client secret stays on the server and the code is exchanged
/// server-side.
pub fn build_login_url(
    idp_domain: &str,
    client_id: &str,
    callback_url: &str,
    state: &str,
) -> OidcResult<Url> {
    let mut url = idp_base_url(idp_domain)?.join("/oauth2/authorize")?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", callback_url)
        .append_pair("scope", &LOGIN_SCOPES.join(" "))
        .append_pair("state", state);
    Ok(url)
}

/// Hosted-UI logout URL that returns the browser to `logout_uri`.
pub fn build_logout_url(idp_domain: &str, client_id: &str, logout_uri: &str) -> OidcResult<Url> {
    let mut url = idp_base_url(idp_domain)?.join("/logout")?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("logout_uri", logout_uri);
    Ok(url)
}

/// Confidential OIDC client for the token endpoint
#[derive(Clone)]
pub struct OidcClient {
    http_client: Client,
}

impl OidcClient {
    pub fn new(config: &OidcConfig) -> OidcResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        Ok(Self { http_client })
    }

    /// Exchange an authorization code for tokens, reporting why it failed.
    pub async fn request_tokens(
        &self,
        code: &str,
        callback_url: &str,
        idp_domain: &str,
        client_id: &str,
        client_secret: &str,
    ) -> OidcResult<TokenSet> {
        let token_endpoint = idp_base_url(idp_domain)?.join("/oauth2/token")?;

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("code", code),
            ("redirect_uri", callback_url),
        ];

        let response = self
            .http_client
            .post(token_endpoint)
            .basic_auth(client_id, Some(client_secret))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(OidcError::TokenExchangeFailed(format!(
                "status {status}: {error_text}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| OidcError::InvalidTokenResponse(e.to_string()))?;

        let id_token = token_response
            .id_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| OidcError::InvalidTokenResponse("missing id_token".to_string()))?;

        debug!(
            expires_in = ?token_response.expires_in,
            has_refresh_token = token_response.refresh_token.is_some(),
            "Token endpoint answered"
        );

        Ok(TokenSet {
            id_token,
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
        })
    }
}

#[async_trait]
impl CodeExchanger for OidcClient {
    async fn exchange_code(
        &self,
        code: &str,
        callback_url: &str,
        idp_domain: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Option<TokenSet> {
        match self
            .request_tokens(code, callback_url, idp_domain, client_id, client_secret)
            .await
        {
            Ok(tokens) => {
                info!("Successfully exchanged code for tokens");
                Some(tokens)
            }
            Err(e) => {
                warn!(error = %e, idp_domain, "Authorization code exchange failed");
                None
            }
        }
    }
}
