//! Redirect state carried through the authorization flow.
//!
//! The state parameter is self-contained: it holds the caller's original
//! host and path+query, so nothing is stored between the login redirect and
//! the callback.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::{DecodePaddingMode, Engine};
use tracing::debug;

/// Separates host from path inside the encoded state. Never valid in a
/// hostname; decoding splits on the first occurrence so the path keeps any
/// literal `|` it contains.
pub const STATE_DELIMITER: char = '|';

const STATE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A caller's pre-authentication destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectState {
    pub host: String,
    pub path: String,
}

impl RedirectState {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }

    /// URL-safe base64 of `host|path`; safe as a single query value.
    pub fn encode(&self) -> String {
        let raw = format!("{}{}{}", self.host, STATE_DELIMITER, self.path);
        STATE_ENGINE.encode(raw.as_bytes())
    }

    /// Strict decoding; `None` for anything that is not a valid state.
    pub fn decode(state: &str) -> Option<Self> {
        let bytes = STATE_ENGINE.decode(state.trim()).ok()?;
        let raw = String::from_utf8(bytes).ok()?;
        let (host, path) = raw.split_once(STATE_DELIMITER)?;
        Some(Self::new(host, path))
    }
}

/// Encodes destinations into state values and decodes them back, falling
/// back to the apex root for anything malformed.
#[derive(Debug, Clone)]
pub struct RedirectStateCodec {
    default_host: String,
}

impl RedirectStateCodec {
    pub fn new(default_host: impl Into<String>) -> Self {
        Self {
            default_host: default_host.into(),
        }
    }

    pub fn default_state(&self) -> RedirectState {
        RedirectState::new(self.default_host.clone(), "/")
    }

    pub fn encode(&self, host: &str, path: &str) -> String {
        RedirectState::new(host, path).encode()
    }

    /// Never fails: a broken state lands the user on the homepage.
    pub fn decode(&self, state: &str) -> RedirectState {
        RedirectState::decode(state).unwrap_or_else(|| {
            debug!("Malformed redirect state, using default destination");
            self.default_state()
        })
    }
}
