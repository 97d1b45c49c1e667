//! Per-request authentication and routing decision.
//!
//! ```text
//! START
//!  ├─ path == callback path ─► CALLBACK
//!  ├─ path == logout path   ─► LOGOUT
//!  ├─ host == apex / none   ─► not found
//!  └─ else                  ─► CHECK_SESSION
//! CHECK_SESSION
//!  ├─ cookie verifies ─► ROUTE (forward to origin)
//!  └─ else            ─► redirect to hosted login with encoded state
//! CALLBACK
//!  ├─ error param, no code, failed exchange ─► redirect to apex root
//!  └─ tokens ─► redirect to original URL, set session cookie
//! LOGOUT ─► clear cookie, redirect to hosted logout
//! ```

use crate::request::EdgeRequest;
use crate::router::{PathRouter, RoutedPath};
use crate::session::SessionCookie;
use crate::settings::GateSettings;
use sitegate_core::{CodeExchanger, ConfigBundle, ConfigError, ConfigLoader, SessionVerifier};
use sitegate_identity_oidc::{RedirectState, RedirectStateCodec, build_login_url, build_logout_url};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the edge host should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// Fetch `path` (plus the original query) from the content origin.
    Forward { path: String, query: Option<String> },
    /// Serve the origin's not-found page at `path` with a 404 status.
    NotFound { path: String },
    /// Answer with a 302.
    Redirect {
        location: String,
        set_cookie: Option<String>,
    },
    /// Answer with the synthesized error page.
    Failure { kind: &'static str },
}

impl GateAction {
    fn redirect(location: impl Into<String>) -> Self {
        GateAction::Redirect {
            location: location.into(),
            set_cookie: None,
        }
    }
}

enum Step {
    Start,
    CheckSession { host: String },
    Callback,
    Logout,
    Route { host: String },
    Done(GateAction),
}

/// The authentication and routing gate.
pub struct Gate {
    settings: GateSettings,
    loader: Arc<ConfigLoader>,
    verifier: Arc<dyn SessionVerifier>,
    exchanger: Arc<dyn CodeExchanger>,
    router: PathRouter,
    codec: RedirectStateCodec,
    cookie: SessionCookie,
}

impl Gate {
    pub fn new(
        settings: GateSettings,
        loader: Arc<ConfigLoader>,
        verifier: Arc<dyn SessionVerifier>,
        exchanger: Arc<dyn CodeExchanger>,
    ) -> Self {
        let apex = settings.apex_domain.trim().to_ascii_lowercase();
        let router = PathRouter::new(apex.clone());
        let codec = RedirectStateCodec::new(apex.clone());
        let cookie = SessionCookie::new(
            settings.cookie_name.clone(),
            apex,
            settings.cookie_max_age_seconds,
        );

        Self {
            settings,
            loader,
            verifier,
            exchanger,
            router,
            codec,
            cookie,
        }
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    fn apex_root(&self) -> String {
        format!("https://{}/", self.router.apex_domain())
    }

    /// Decide the fate of one request. Always produces an action.
    pub async fn handle(&self, request: &EdgeRequest) -> GateAction {
        let bundle = match self.loader.load().await {
            Ok(bundle) => bundle,
            Err(e) => return self.config_failure(&e),
        };

        let mut step = Step::Start;
        loop {
            step = match step {
                Step::Start => self.start(request, &bundle),
                Step::CheckSession { host } => self.check_session(request, &bundle, host).await,
                Step::Callback => self.callback(request, &bundle).await,
                Step::Logout => self.logout(&bundle),
                Step::Route { host } => self.route(request, &host),
                Step::Done(action) => return action,
            };
        }
    }

    fn config_failure(&self, error: &ConfigError) -> GateAction {
        warn!(kind = error.kind(), "Answering with configuration failure page");
        GateAction::Failure { kind: error.kind() }
    }

    fn start(&self, request: &EdgeRequest, bundle: &ConfigBundle) -> Step {
        let path = request.path();
        if path == bundle.callback_path() {
            return Step::Callback;
        }
        if path == self.settings.logout_path {
            return Step::Logout;
        }

        match request.host() {
            Some(host) if !self.router.is_apex(&host) => Step::CheckSession { host },
            host => {
                debug!(?host, path, "No tenant for host");
                Step::Done(self.not_found())
            }
        }
    }

    async fn check_session(
        &self,
        request: &EdgeRequest,
        bundle: &ConfigBundle,
        host: String,
    ) -> Step {
        if let Some(token) = self.cookie.read(request) {
            let region = bundle.region().unwrap_or_default();
            if self
                .verifier
                .verify(&token, &bundle.user_pool_id, region, &bundle.client_id)
                .await
            {
                return Step::Route { host };
            }
            debug!(%host, "Session cookie rejected");
        }

        Step::Done(self.login_redirect(request, bundle, &host))
    }

    fn login_redirect(
        &self,
        request: &EdgeRequest,
        bundle: &ConfigBundle,
        host: &str,
    ) -> GateAction {
        let state = self.codec.encode(host, &request.path_and_query());
        match build_login_url(
            &bundle.idp_domain,
            &bundle.client_id,
            &bundle.redirect_uri,
            &state,
        ) {
            Ok(url) => {
                debug!(host, path = request.path(), "Redirecting to hosted login");
                GateAction::redirect(url)
            }
            Err(e) => {
                warn!(error = %e, "Cannot build login URL");
                GateAction::Failure {
                    kind: "ConfigMalformed",
                }
            }
        }
    }

    async fn callback(&self, request: &EdgeRequest, bundle: &ConfigBundle) -> Step {
        if let Some(error) = request.query_param("error") {
            let description = request.query_param("error_description").unwrap_or_default();
            warn!(%error, %description, "Identity provider returned an error");
            return Step::Done(GateAction::redirect(self.apex_root()));
        }

        let Some(code) = request.query_param("code").filter(|c| !c.is_empty()) else {
            debug!("Callback without authorization code");
            return Step::Done(GateAction::redirect(self.apex_root()));
        };

        let Some(tokens) = self
            .exchanger
            .exchange_code(
                &code,
                &bundle.redirect_uri,
                &bundle.idp_domain,
                &bundle.client_id,
                &bundle.client_secret,
            )
            .await
        else {
            return Step::Done(GateAction::redirect(self.apex_root()));
        };

        let destination = self.destination(request.query_param("state").as_deref());
        info!(host = %destination.host, "Login completed");

        Step::Done(GateAction::Redirect {
            location: format!("https://{}{}", destination.host, destination.path),
            set_cookie: Some(self.cookie.issue(&tokens.id_token)),
        })
    }

    /// Decoded post-login destination, or the apex root when the state is
    /// missing, malformed or points somewhere this gate does not serve.
    fn destination(&self, state: Option<&str>) -> RedirectState {
        let Some(state) = state else {
            return self.codec.default_state();
        };

        let decoded = self.codec.decode(state);
        let host = decoded.host.to_ascii_lowercase();
        let host_ok = self.router.is_apex(&host) || self.router.tenant_prefix(&host).is_some();
        if host_ok && is_safe_redirect_path(&decoded.path) {
            RedirectState::new(host, decoded.path)
        } else {
            warn!(host = %decoded.host, "Discarding unsafe redirect destination");
            self.codec.default_state()
        }
    }

    fn logout(&self, bundle: &ConfigBundle) -> Step {
        let logout_url =
            build_logout_url(&bundle.idp_domain, &bundle.client_id, &self.apex_root());
        let action = match logout_url {
            Ok(url) => GateAction::Redirect {
                location: url.to_string(),
                set_cookie: Some(self.cookie.clear()),
            },
            Err(e) => {
                warn!(error = %e, "Cannot build logout URL");
                GateAction::Failure {
                    kind: "ConfigMalformed",
                }
            }
        };
        Step::Done(action)
    }

    fn route(&self, request: &EdgeRequest, host: &str) -> Step {
        let action = match self.router.route(request.path(), host) {
            RoutedPath::Rewritten(path) => GateAction::Forward {
                path,
                query: request.query().map(str::to_string),
            },
            RoutedPath::NotFound => self.not_found(),
        };
        Step::Done(action)
    }

    fn not_found(&self) -> GateAction {
        GateAction::NotFound {
            path: self.settings.not_found_path.clone(),
        }
    }
}

/// Local absolute path that cannot be turned into another origin.
fn is_safe_redirect_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && path.is_ascii()
        && !path.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect_paths() {
        for path in ["/", "/dashboard", "/search?q=a|b&c=%2F", "/a/b/"] {
            assert!(is_safe_redirect_path(path), "{path:?} should be safe");
        }
        for path in [
            "",
            "dashboard",
            "//evil.com/x",
            "/\\evil.com",
            "/a\r\nSet-Cookie: x=1",
            "/ü",
            "https://evil.com/",
        ] {
            assert!(!is_safe_redirect_path(path), "{path:?} should be unsafe");
        }
    }
}
