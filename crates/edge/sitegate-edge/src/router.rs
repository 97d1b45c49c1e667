//! Tenant path rewriting.
//!
//! Every tenant lives under `/{prefix}` on the shared origin, where the
//! prefix is the first label below the apex domain:
//!
//! | request                         | origin path                  |
//! |---------------------------------|------------------------------|
//! | `app.example.com/`              | `/app/index.html`            |
//! | `app.example.com/dashboard`     | `/app/dashboard/index.html`  |
//! | `app.example.com/docs/`         | `/app/docs/index.html`       |
//! | `app.example.com/app.js`        | `/app/app.js`                |
//! | `example.com/anything`          | not found                    |
//! | `a.b.example.com/`              | not found                    |

use tracing::debug;

const MAX_LABEL_LEN: usize = 63;

/// Result of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutedPath {
    /// Path on the origin holding the tenant's content.
    Rewritten(String),
    /// The host or path maps to no tenant content.
    NotFound,
}

#[derive(Debug, Clone)]
pub struct PathRouter {
    apex_domain: String,
}

impl PathRouter {
    pub fn new(apex_domain: impl Into<String>) -> Self {
        Self {
            apex_domain: apex_domain.into().to_ascii_lowercase(),
        }
    }

    pub fn apex_domain(&self) -> &str {
        &self.apex_domain
    }

    pub fn is_apex(&self, host: &str) -> bool {
        host.eq_ignore_ascii_case(&self.apex_domain)
    }

    /// Tenant prefix for `host`, or `None` when the host is the apex, foreign,
    /// nested more than one label deep or not a valid DNS label.
    pub fn tenant_prefix(&self, host: &str) -> Option<String> {
        let host = host.to_ascii_lowercase();
        let prefix = host.strip_suffix(&self.apex_domain)?.strip_suffix('.')?;

        if prefix.is_empty() || prefix.len() > MAX_LABEL_LEN {
            return None;
        }
        if !prefix
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return None;
        }
        if prefix.starts_with('-') || prefix.ends_with('-') {
            return None;
        }
        Some(prefix.to_string())
    }

    /// Rewrite `path` into the tenant's content location.
    pub fn route(&self, path: &str, host: &str) -> RoutedPath {
        let Some(prefix) = self.tenant_prefix(host) else {
            debug!(host, "Host maps to no tenant");
            return RoutedPath::NotFound;
        };

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        if has_dot_segment(&path) {
            debug!(host, path, "Rejecting dot segment in path");
            return RoutedPath::NotFound;
        }

        let rewritten = if path.ends_with('/') {
            format!("/{prefix}{path}index.html")
        } else if has_extension(last_segment(&path)) {
            format!("/{prefix}{path}")
        } else {
            format!("/{prefix}{path}/index.html")
        };
        RoutedPath::Rewritten(rewritten)
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn has_extension(segment: &str) -> bool {
    segment
        .rfind('.')
        .is_some_and(|index| index + 1 < segment.len())
}

// `.` and `..` segments, including their percent-encoded forms, would let the
// origin resolve a path outside the tenant prefix. Backslashes are path
// separators to URL parsers and some origins, so they are never routed.
fn has_dot_segment(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    if lowered.contains('\\') || lowered.contains("%5c") {
        return true;
    }
    lowered.replace("%2f", "/").split('/').any(|segment| {
        let decoded = segment.replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}
