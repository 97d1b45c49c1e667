//! HTTP responses synthesized by the gate itself.

use axum::response::{Html, IntoResponse, Response};
use http::header::{CACHE_CONTROL, LOCATION, SET_COOKIE};
use http::{HeaderMap, HeaderValue, StatusCode};
use tracing::warn;

/// A 302 that is never cached, optionally setting a cookie.
pub fn redirect(location: &str, set_cookie: Option<&str>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(LOCATION, value);
        }
        Err(e) => {
            warn!(error = %e, "Redirect location is not a valid header value");
            return error_page(StatusCode::INTERNAL_SERVER_ERROR, "InvalidRedirect");
        }
    }

    if let Some(cookie) = set_cookie {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => {
                warn!(error = %e, "Session cookie is not a valid header value");
                return error_page(StatusCode::INTERNAL_SERVER_ERROR, "InvalidSessionCookie");
            }
        }
    }

    (StatusCode::FOUND, headers).into_response()
}

/// Self-contained HTML error page naming the failure class.
pub fn error_page(status: StatusCode, kind: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    (status, headers, Html(render_error_page(status, kind))).into_response()
}

fn render_error_page(status: StatusCode, kind: &str) -> String {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("Error");
    let kind = escape_html(kind);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{code} {reason}</title>
<style>
  body {{ margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center;
         font-family: system-ui, -apple-system, "Segoe UI", sans-serif; background: #f4f5f7; color: #1f2933; }}
  main {{ max-width: 28rem; padding: 2.5rem; background: #fff; border-radius: 12px;
         box-shadow: 0 4px 24px rgba(15, 23, 42, 0.08); text-align: center; }}
  h1 {{ margin: 0 0 0.5rem; font-size: 3rem; color: #c2410c; }}
  p {{ margin: 0.25rem 0; line-height: 1.5; }}
  code {{ font-size: 0.85rem; color: #52606d; }}
</style>
</head>
<body>
<main>
  <h1>{code}</h1>
  <p>{reason}</p>
  <p>The site could not complete your request. Please try again later.</p>
  <p><code>{kind}</code></p>
</main>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            c => c.to_string(),
        })
        .collect()
}
