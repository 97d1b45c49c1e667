//! The secret configuration bundle.

use crate::error::BundleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Identity-provider settings fetched from the secret store.
///
/// Immutable once loaded. The JSON shape is:
///
/// ```json
/// {
///   "idp_domain": "auth.example.com",
///   "client_id": "abc",
///   "client_secret": "xyz",
///   "user_pool_id": "eu-west-1_AbCdEf",
///   "redirect_uri": "https://example.com/_callback"
/// }
/// ```
///
/// `region` may be given explicitly; otherwise it is taken from the
/// `<region>_<id>` form of `user_pool_id`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigBundle {
    pub idp_domain: String,
    pub client_id: String,
    pub client_secret: String,
    pub user_pool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub redirect_uri: String,
}

impl ConfigBundle {
    /// Parse and validate a bundle from its stored JSON form.
    pub fn from_json(raw: &str) -> Result<Self, BundleError> {
        let bundle: ConfigBundle = serde_json::from_str(raw)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Region the token issuer lives in.
    pub fn region(&self) -> Option<&str> {
        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            return Some(region);
        }
        self.user_pool_id
            .split_once('_')
            .map(|(region, _)| region)
            .filter(|region| !region.is_empty())
    }

    /// Path component of the fixed callback URL.
    pub fn callback_path(&self) -> String {
        Url::parse(&self.redirect_uri)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }

    fn validate(&self) -> Result<(), BundleError> {
        for (field, value) in [
            ("idp_domain", &self.idp_domain),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("user_pool_id", &self.user_pool_id),
            ("redirect_uri", &self.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(BundleError::EmptyField(field));
            }
        }

        if self.region().is_none() {
            return Err(BundleError::NoRegion(self.user_pool_id.clone()));
        }

        let redirect = Url::parse(&self.redirect_uri)?;
        if redirect.host_str().is_none() {
            return Err(BundleError::RedirectUriWithoutHost);
        }

        Ok(())
    }
}

impl fmt::Debug for ConfigBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBundle")
            .field("idp_domain", &self.idp_domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_pool_id", &self.user_pool_id)
            .field("region", &self.region)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}
