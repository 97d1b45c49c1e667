//! Process settings for the edge server
//!
//! Settings are non-secret and come from, in increasing precedence:
//! - Default values
//! - Configuration file (`sitegate.toml`, or `SITEGATE_CONFIG_FILE`)
//! - Environment variables with the `SITEGATE__` prefix,
//!   e.g. `SITEGATE__GATE__APEX_DOMAIN=example.com`
//!
//! Identity-provider credentials are not settings; they are fetched at
//! request time from the configured secret store.

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use sitegate_core::{EnvSecretStore, FileSecretStore, HttpParameterStore, SecretStore};
use sitegate_identity_oidc::OidcConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "sitegate.toml";
pub const CONFIG_FILE_ENV: &str = "SITEGATE_CONFIG_FILE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub gate: GateSettings,
    pub identity: OidcConfig,
    pub secrets: SecretsSettings,
    pub logging: LoggingSettings,
}

/// Listener and content origin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
    /// Base URL of the static-content origin
    pub origin_url: String,
    pub origin_timeout_seconds: u64,
}

/// Request gate behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// Base domain; tenants are its first-level subdomains
    pub apex_domain: String,
    pub cookie_name: String,
    pub cookie_max_age_seconds: i64,
    /// Origin path served for hosts and paths that map to no tenant
    pub not_found_path: String,
    pub logout_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretProvider {
    Env,
    File,
    Http,
}

/// Where the identity-provider bundle is read from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsSettings {
    /// Name of the bundle in the store, e.g. `/sitegate/config`
    pub parameter_name: String,
    pub provider: SecretProvider,
    /// `env` provider: variable prefix
    pub env_prefix: String,
    /// `file` provider: directory holding one file per parameter
    pub directory: PathBuf,
    /// `http` provider: parameter-store endpoint
    pub endpoint: String,
    /// `http` provider: environment variable holding the session token
    pub session_token_env: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error) or a full filter string
    pub level: String,
    /// Log format (pretty, json, compact)
    pub format: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            origin_url: "http://127.0.0.1:9000".to_string(),
            origin_timeout_seconds: 5,
        }
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            apex_domain: String::new(),
            cookie_name: "sitegate_session".to_string(),
            cookie_max_age_seconds: 3600,
            not_found_path: "/404.html".to_string(),
            logout_path: "/_logout".to_string(),
        }
    }
}

impl Default for SecretsSettings {
    fn default() -> Self {
        Self {
            parameter_name: "/sitegate/config".to_string(),
            provider: SecretProvider::Env,
            env_prefix: "SITEGATE_SECRET".to_string(),
            directory: PathBuf::from("./secrets"),
            endpoint: "http://localhost:2773".to_string(),
            session_token_env: "AWS_SESSION_TOKEN".to_string(),
            timeout_seconds: 5,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => std::env::var(CONFIG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };

        if config_path.exists() {
            info!("Loading settings from {}", config_path.display());
            builder = builder.add_source(File::from(config_path.as_path()));
        } else {
            debug!("No settings file at {}, using defaults", config_path.display());
        }

        builder = builder.add_source(
            Environment::with_prefix("SITEGATE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build settings")?;
        let settings: Settings = config
            .try_deserialize()
            .context("Failed to deserialize settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        Url::parse(&self.server.origin_url)
            .with_context(|| format!("Invalid origin URL '{}'", self.server.origin_url))?;

        if self.gate.apex_domain.trim().is_empty() {
            anyhow::bail!("gate.apex_domain must be set");
        }
        if self.gate.apex_domain.contains(['/', ':']) || self.gate.apex_domain.starts_with('.') {
            anyhow::bail!(
                "gate.apex_domain must be a bare domain name, got '{}'",
                self.gate.apex_domain
            );
        }

        if self.gate.cookie_name.is_empty() {
            anyhow::bail!("gate.cookie_name cannot be empty");
        }
        if self.gate.cookie_max_age_seconds <= 0 {
            anyhow::bail!("gate.cookie_max_age_seconds must be positive");
        }

        for (name, path) in [
            ("gate.not_found_path", &self.gate.not_found_path),
            ("gate.logout_path", &self.gate.logout_path),
        ] {
            if !path.starts_with('/') {
                anyhow::bail!("{name} must start with '/', got '{path}'");
            }
        }

        if !self.identity.issuer_url_template.contains("{pool_id}") {
            anyhow::bail!("identity.issuer_url_template must contain '{{pool_id}}'");
        }
        if self.identity.http_timeout_seconds == 0 {
            anyhow::bail!("identity.http_timeout_seconds must be greater than 0");
        }

        if self.secrets.parameter_name.trim().is_empty() {
            anyhow::bail!("secrets.parameter_name cannot be empty");
        }
        if self.secrets.provider == SecretProvider::Http {
            Url::parse(&self.secrets.endpoint).with_context(|| {
                format!("Invalid secrets endpoint '{}'", self.secrets.endpoint)
            })?;
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        let is_filter = level_lower.contains('=') || level_lower.contains(',');
        if !is_filter && !valid_levels.contains(&level_lower.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        let valid_formats = ["pretty", "json", "compact"];
        let format_lower = self.logging.format.to_lowercase();
        if !valid_formats.contains(&format_lower.as_str()) {
            anyhow::bail!(
                "Invalid log format '{}'. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            );
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.server.host, self.server.port))
    }

    /// Filter string for the tracing subscriber
    pub fn log_filter(&self) -> String {
        let level = &self.logging.level;
        if level.contains('=') || level.contains(',') {
            level.clone()
        } else {
            format!(
                "sitegate={level},sitegate_edge={level},sitegate_core={level},sitegate_identity_oidc={level},tower_http={level},{level}"
            )
        }
    }

    /// Secret store selected by `secrets.provider`.
    pub fn secret_store(&self) -> Result<Arc<dyn SecretStore>> {
        let store: Arc<dyn SecretStore> = match self.secrets.provider {
            SecretProvider::Env => Arc::new(EnvSecretStore::new(self.secrets.env_prefix.clone())),
            SecretProvider::File => Arc::new(FileSecretStore::new(self.secrets.directory.clone())),
            SecretProvider::Http => {
                let session_token = std::env::var(&self.secrets.session_token_env).ok();
                Arc::new(
                    HttpParameterStore::new(
                        &self.secrets.endpoint,
                        session_token,
                        Duration::from_secs(self.secrets.timeout_seconds),
                    )
                    .context("Failed to create HTTP parameter store")?,
                )
            }
        };
        Ok(store)
    }
}
