//! Memoized configuration loader.

use crate::bundle::ConfigBundle;
use crate::error::{ConfigError, ConfigResult};
use crate::store::SecretStore;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Loads the [`ConfigBundle`] once per loader and serves it from memory
/// afterwards.
///
/// A failed load leaves the cell empty so the next request tries again; a
/// successful load is never invalidated for the lifetime of the loader.
pub struct ConfigLoader {
    store: Arc<dyn SecretStore>,
    parameter_name: String,
    cell: OnceCell<Arc<ConfigBundle>>,
}

impl ConfigLoader {
    pub fn new(store: Arc<dyn SecretStore>, parameter_name: impl Into<String>) -> Self {
        Self {
            store,
            parameter_name: parameter_name.into(),
            cell: OnceCell::new(),
        }
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    /// Whether a bundle has already been cached.
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the cached bundle, fetching it from the secret store on first use.
    pub async fn load(&self) -> ConfigResult<Arc<ConfigBundle>> {
        self.cell
            .get_or_try_init(|| self.fetch())
            .await
            .cloned()
    }

    async fn fetch(&self) -> ConfigResult<Arc<ConfigBundle>> {
        let name = self.parameter_name.as_str();

        let raw = self
            .store
            .get_parameter(name)
            .await
            .map_err(|e| {
                error!(parameter = name, error = %e, "Secret store request failed");
                ConfigError::Unavailable {
                    name: name.to_string(),
                    detail: e.to_string(),
                }
            })?
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                error!(parameter = name, "Secret store returned no value");
                ConfigError::Unavailable {
                    name: name.to_string(),
                    detail: "no value stored".to_string(),
                }
            })?;

        let bundle = ConfigBundle::from_json(&raw).map_err(|e| {
            error!(parameter = name, error = %e, "Stored configuration is malformed");
            ConfigError::Malformed {
                name: name.to_string(),
                detail: e.to_string(),
            }
        })?;

        info!(
            parameter = name,
            idp_domain = %bundle.idp_domain,
            user_pool_id = %bundle.user_pool_id,
            "Loaded identity configuration"
        );

        Ok(Arc::new(bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecretStoreError;
    use crate::store::StaticSecretStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NAME: &str = "/sitegate/config";

    fn bundle_json() -> String {
        serde_json::json!({
            "idp_domain": "auth.example.com",
            "client_id": "client-123",
            "client_secret": "s3cret",
            "user_pool_id": "eu-west-1_AbCdEf",
            "redirect_uri": "https://example.com/_callback"
        })
        .to_string()
    }

    struct CountingStore {
        inner: StaticSecretStore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SecretStore for CountingStore {
        async fn get_parameter(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_parameter(name).await
        }
    }

    struct UnreachableStore;

    #[async_trait]
    impl SecretStore for UnreachableStore {
        async fn get_parameter(&self, _name: &str) -> Result<Option<String>, SecretStoreError> {
            Err(SecretStoreError::UnexpectedStatus {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_loads_once_and_caches() {
        let store = Arc::new(CountingStore {
            inner: StaticSecretStore::new().with_parameter(NAME, bundle_json()),
            calls: AtomicUsize::new(0),
        });
        let loader = ConfigLoader::new(store.clone(), NAME);

        assert!(!loader.is_loaded());
        let first = loader.load().await.unwrap();
        let second = loader.load().await.unwrap();

        assert!(loader.is_loaded());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.client_id, "client-123");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_value_is_unavailable() {
        let loader = ConfigLoader::new(Arc::new(StaticSecretStore::new()), NAME);
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Unavailable { .. }));
        assert!(!loader.is_loaded());
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let loader = ConfigLoader::new(Arc::new(UnreachableStore), NAME);
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_bad_json_is_malformed() {
        let store = StaticSecretStore::new().with_parameter(NAME, "{not json");
        let loader = ConfigLoader::new(Arc::new(store), NAME);
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let store = Arc::new(CountingStore {
            inner: StaticSecretStore::new(),
            calls: AtomicUsize::new(0),
        });
        let loader = ConfigLoader::new(store.clone(), NAME);

        assert!(loader.load().await.is_err());
        assert!(loader.load().await.is_err());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }
}
