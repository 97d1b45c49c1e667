//! Core types and traits for the sitegate edge gate.
//!
//! This crate owns the configuration bundle and the process-wide loader that
//! fetches it from a secret store, together with the traits the gate uses to
//! talk to the identity provider. Concrete identity-provider implementations
//! live in `sitegate-identity-oidc`.

mod bundle;
mod error;
mod http_store;
mod identity;
mod loader;
mod store;

pub use bundle::ConfigBundle;
pub use error::{BundleError, ConfigError, ConfigResult, SecretStoreError};
pub use http_store::{HttpParameterStore, PARAMETERS_SECRETS_TOKEN_HEADER};
pub use identity::{CodeExchanger, SessionVerifier, StaticSessionVerifier, TokenSet};
pub use loader::ConfigLoader;
pub use store::{EnvSecretStore, FileSecretStore, SecretStore, StaticSecretStore};
