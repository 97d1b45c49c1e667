//! The inbound request as the gate sees it.

use cookie::Cookie;
use http::header::{COOKIE, HOST};
use http::{HeaderMap, HeaderValue, Method};
use tracing::debug;
use url::form_urlencoded;

/// Method, path, query and headers of one inbound request.
///
/// Headers form a multimap; the accessors return the first value.
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
}

impl EdgeRequest {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Option<String>,
        headers: HeaderMap,
    ) -> Self {
        let path = path.into();
        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path },
            query: query.filter(|q| !q.is_empty()),
            headers,
        }
    }

    /// Build from the head of an HTTP request. A missing `Host` header is
    /// filled in from the URI authority, as HTTP/2 requests carry it there.
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        let mut headers = parts.headers.clone();
        if !headers.contains_key(HOST)
            && let Some(authority) = parts.uri.authority()
            && let Ok(value) = HeaderValue::from_str(authority.as_str())
        {
            headers.insert(HOST, value);
        }

        Self::new(
            parts.method.clone(),
            parts.uri.path(),
            parts.uri.query().map(str::to_string),
            headers,
        )
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Path plus `?query` when a query is present.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Normalized host: lower-cased, without port or trailing dot.
    pub fn host(&self) -> Option<String> {
        let raw = self.headers.get(HOST)?.to_str().ok()?;
        let host = normalize_host(raw);
        (!host.is_empty()).then_some(host)
    }

    /// Value of the named cookie across every `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<String> {
        for header in self.headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse(header) {
                match cookie {
                    Ok(c) if c.name() == name => return Some(c.value().to_string()),
                    Ok(_) => {}
                    Err(e) => debug!("ignoring malformed cookie: {e}"),
                }
            }
        }
        None
    }

    /// First value of a query parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Lower-case a `Host` value and drop any `:port` and trailing dot.
pub fn normalize_host(raw: &str) -> String {
    let host = raw.trim().to_ascii_lowercase();
    let without_port = match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host.as_str(),
    };
    without_port.trim_end_matches('.').to_string()
}
