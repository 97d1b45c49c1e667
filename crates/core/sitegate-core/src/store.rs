//! Secret store abstraction and local providers.

use crate::error::SecretStoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Read-only key-value parameter fetch by name.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a parameter value. `Ok(None)` means the store answered but has
    /// no value under this name.
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, SecretStoreError>;
}

/// In-memory implementation of SecretStore
#[derive(Debug, Default, Clone)]
pub struct StaticSecretStore {
    values: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self.values.get(name).cloned())
    }
}

/// Reads parameters from environment variables.
///
/// `/sitegate/config` with prefix `SITEGATE_PARAM` maps to
/// `SITEGATE_PARAM_SITEGATE_CONFIG`.
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, name: &str) -> String {
        let key: String = name
            .trim_start_matches('/')
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();

        if self.prefix.is_empty() {
            key
        } else {
            format!("{}_{}", self.prefix, key)
        }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        let variable = self.variable_name(name);
        debug!(variable = %variable, "Reading parameter from environment");
        Ok(std::env::var(&variable).ok().filter(|v| !v.is_empty()))
    }
}

/// Reads parameters from files below a directory.
///
/// The parameter name, without its leading `/`, is the relative file path.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    directory: PathBuf,
}

impl FileSecretStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        let relative = name.trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|segment| segment == "..") {
            return None;
        }
        Some(self.directory.join(relative))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SecretStoreError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_store() {
        let store = StaticSecretStore::new().with_parameter("/sitegate/config", "{}");

        assert_eq!(
            store.get_parameter("/sitegate/config").await.unwrap(),
            Some("{}".to_string())
        );
        assert_eq!(store.get_parameter("/other").await.unwrap(), None);
    }

    #[test]
    fn test_env_variable_name() {
        let store = EnvSecretStore::new("SITEGATE_PARAM");
        assert_eq!(
            store.variable_name("/sitegate/config"),
            "SITEGATE_PARAM_SITEGATE_CONFIG"
        );
        assert_eq!(
            EnvSecretStore::new("").variable_name("edge-config.v2"),
            "EDGE_CONFIG_V2"
        );
    }

    #[tokio::test]
    async fn test_env_store_reads_variable() {
        let store = EnvSecretStore::new("SITEGATE_STORE_TEST");
        // SAFETY: the variable name is unique to this test.
        unsafe {
            std::env::set_var("SITEGATE_STORE_TEST_BUNDLE", "{\"a\":1}");
        }

        assert_eq!(
            store.get_parameter("/bundle").await.unwrap(),
            Some("{\"a\":1}".to_string())
        );
        assert_eq!(store.get_parameter("/absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sitegate")).unwrap();
        std::fs::write(dir.path().join("sitegate/config"), "{\"k\":\"v\"}").unwrap();

        let store = FileSecretStore::new(dir.path());
        assert_eq!(
            store.get_parameter("/sitegate/config").await.unwrap(),
            Some("{\"k\":\"v\"}".to_string())
        );
        assert_eq!(store.get_parameter("/sitegate/missing").await.unwrap(), None);
        assert_eq!(store.get_parameter("/../etc/passwd").await.unwrap(), None);
    }
}
