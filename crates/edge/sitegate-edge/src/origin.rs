//! Client for the static-content origin.

use axum::body::Body;
use axum::response::Response;
use http::header::{CACHE_CONTROL, CONTENT_ENCODING, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use http::{HeaderName, Method, StatusCode};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Response headers copied from the origin.
const RELAYED_HEADERS: [HeaderName; 5] =
    [CONTENT_TYPE, CACHE_CONTROL, ETAG, LAST_MODIFIED, CONTENT_ENCODING];

#[derive(Debug, Error)]
pub enum OriginError {
    #[error("invalid origin URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("origin request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("path {0} resolves outside its origin directory")]
    PathEscape(String),
}

#[derive(Debug, Clone)]
pub struct OriginClient {
    http_client: Client,
    base: Url,
}

impl OriginClient {
    pub fn new(origin_url: &str, timeout: Duration) -> Result<Self, OriginError> {
        let base = Url::parse(origin_url)?;
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, base })
    }

    /// Absolute origin URL for a rewritten path, keeping any base path the
    /// origin URL carries. The resolved URL must stay under the first segment
    /// of `path`.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> Result<Url, OriginError> {
        let base = self.base.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))?;

        let root = match path.get(1..).and_then(|rest| rest.find('/')) {
            Some(index) => &path[..index + 2],
            None => path,
        };
        let expected = format!("{}{root}", self.base.path().trim_end_matches('/'));
        if !url.path().starts_with(&expected) {
            return Err(OriginError::PathEscape(path.to_string()));
        }

        url.set_query(query);
        Ok(url)
    }

    /// Fetch `path` and relay it. `status` overrides the origin's status,
    /// used to serve the not-found page as a 404.
    pub async fn relay(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        status: Option<StatusCode>,
    ) -> Result<Response, OriginError> {
        let url = self.target_url(path, query)?;
        let method = if *method == Method::HEAD {
            Method::HEAD
        } else {
            Method::GET
        };

        let upstream = self.http_client.request(method, url).send().await?;
        let upstream_status = upstream.status();
        debug!(path, status = %upstream_status, "Origin answered");

        let mut builder = Response::builder().status(status.unwrap_or(upstream_status));
        for name in RELAYED_HEADERS {
            if let Some(value) = upstream.headers().get(&name) {
                builder = builder.header(name, value.clone());
            }
        }

        let body = upstream.bytes().await?;
        Ok(builder
            .body(Body::from(body))
            .unwrap_or_else(|_| Response::new(Body::empty())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(origin_url: &str) -> OriginClient {
        OriginClient::new(origin_url, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_target_url() {
        let origin = client("http://origin.internal:9000");
        assert_eq!(
            origin.target_url("/app/index.html", None).unwrap().as_str(),
            "http://origin.internal:9000/app/index.html"
        );
        assert_eq!(
            origin
                .target_url("/app/search/index.html", Some("q=a%20b"))
                .unwrap()
                .as_str(),
            "http://origin.internal:9000/app/search/index.html?q=a%20b"
        );
        assert_eq!(
            origin.target_url("/404.html", None).unwrap().as_str(),
            "http://origin.internal:9000/404.html"
        );

        let prefixed = client("https://cdn.example.net/sites/");
        assert_eq!(
            prefixed.target_url("/app/app.js", None).unwrap().as_str(),
            "https://cdn.example.net/sites/app/app.js"
        );
    }

    #[test]
    fn test_target_url_rejects_paths_leaving_their_directory() {
        let origin = client("http://origin.internal:9000");
        for path in [
            "/app/..\\other\\secret.txt",
            "/app/../other/secret.txt",
            "/app/%2e%2e/other/secret.txt",
        ] {
            assert!(
                matches!(
                    origin.target_url(path, None),
                    Err(OriginError::PathEscape(_))
                ),
                "path {path:?}"
            );
        }

        let prefixed = client("https://cdn.example.net/sites/");
        assert!(matches!(
            prefixed.target_url("/app/../../admin/index.html", None),
            Err(OriginError::PathEscape(_))
        ));
    }
}
