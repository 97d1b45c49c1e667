//! Parameter store reached over a local HTTP endpoint.
//!
//! Speaks the protocol of the AWS Parameters and Secrets extension: a GET to
//! `/systemsmanager/parameters/get` authenticated by a session token header,
//! answered with `{"Parameter": {"Value": "..."}}`.

use crate::error::SecretStoreError;
use crate::store::SecretStore;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the session token expected by the parameter endpoint.
pub const PARAMETERS_SECRETS_TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";

#[derive(Debug, Deserialize)]
struct ParameterResponse {
    #[serde(rename = "Parameter")]
    parameter: ParameterValue,
}

#[derive(Debug, Deserialize)]
struct ParameterValue {
    #[serde(rename = "Value")]
    value: String,
}

/// HTTP-backed secret store.
#[derive(Clone)]
pub struct HttpParameterStore {
    http_client: Client,
    endpoint: Url,
    session_token: Option<String>,
}

impl HttpParameterStore {
    pub fn new(
        endpoint: &str,
        session_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SecretStoreError> {
        let endpoint = Url::parse(endpoint)?;
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint,
            session_token,
        })
    }

    fn parameter_url(&self, name: &str) -> Result<Url, SecretStoreError> {
        let mut url = self.endpoint.join("/systemsmanager/parameters/get")?;
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_pair("withDecryption", "true");
        Ok(url)
    }
}

#[async_trait]
impl SecretStore for HttpParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        let url = self.parameter_url(name)?;
        debug!(parameter = name, "Fetching parameter from HTTP parameter store");

        let mut request = self.http_client.get(url);
        if let Some(token) = &self.session_token {
            request = request.header(PARAMETERS_SECRETS_TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(parameter = name, status = status.as_u16(), "Parameter store request failed");
            return Err(SecretStoreError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ParameterResponse = response
            .json()
            .await
            .map_err(|e| SecretStoreError::InvalidResponse(e.to_string()))?;

        Ok(Some(parsed.parameter.value))
    }
}
