//! The session cookie carrying the identity token.

use crate::request::EdgeRequest;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

/// Builds and reads the session cookie.
///
/// The cookie is scoped to the apex domain so one login covers every tenant
/// subdomain.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    domain: String,
    max_age_seconds: i64,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, domain: impl Into<String>, max_age_seconds: i64) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            max_age_seconds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session token presented with the request, if any.
    pub fn read(&self, request: &EdgeRequest) -> Option<String> {
        request.cookie(&self.name).filter(|value| !value.is_empty())
    }

    /// `Set-Cookie` value carrying `id_token`.
    pub fn issue(&self, id_token: &str) -> String {
        self.build(id_token.to_string(), self.max_age_seconds)
            .to_string()
    }

    /// `Set-Cookie` value that removes the session.
    pub fn clear(&self) -> String {
        self.build(String::new(), 0).to_string()
    }

    fn build(&self, value: String, max_age_seconds: i64) -> Cookie<'static> {
        Cookie::build((self.name.clone(), value))
            .domain(self.domain.clone())
            .path("/")
            .secure(true)
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(max_age_seconds))
            .build()
    }
}
