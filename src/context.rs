//! Request information and the per-request transform context.

use crate::headers::HeaderCollection;

/// Request information handed to the agent.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// HTTP method
    pub method: String,
    /// Host (with port, if any)
    pub host: String,
    /// Request path (without query string)
    pub path: String,
    /// Raw query string (without leading ?)
    pub query_string: Option<String>,
    /// Whether the request arrived over TLS
    pub secure: bool,
    /// Request headers
    pub headers: HeaderCollection,
}

impl RequestInfo {
    /// Get a single header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// `https` for TLS connections, `http` otherwise.
    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Path plus query, as sent on the request line.
    pub fn request_uri(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        match &self.query_string {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        }
    }

    /// Absolute URL reconstructed from scheme, host, path and query.
    pub fn canonical_url(&self) -> String {
        format!("{}://{}{}", self.scheme(), self.host, self.request_uri())
    }
}

/// Context available during transformations.
///
/// Built once per request before any rule runs, so header mutations never
/// change what URL rules see.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Canonical request URL
    pub canonical_url: String,
}

impl TransformContext {
    /// Create a new transform context for a request.
    pub fn new(request: &RequestInfo) -> Self {
        Self {
            canonical_url: request.canonical_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(host: &str, path: &str, query: Option<&str>, secure: bool) -> RequestInfo {
        RequestInfo {
            method: "GET".to_string(),
            host: host.to_string(),
            path: path.to_string(),
            query_string: query.map(|s| s.to_string()),
            secure,
            headers: [("Host", host)].into_iter().collect(),
        }
    }

    #[test]
    fn test_canonical_url_plain() {
        let request = make_request("example.com", "/test", None, false);
        assert_eq!(request.canonical_url(), "http://example.com/test");
    }

    #[test]
    fn test_canonical_url_secure_with_query() {
        let request = make_request("example.com:8443", "/api/users", Some("page=1&limit=10"), true);
        assert_eq!(
            request.canonical_url(),
            "https://example.com:8443/api/users?page=1&limit=10"
        );
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let request = make_request("example.com", "", None, false);
        assert_eq!(request.request_uri(), "/");
        assert_eq!(request.canonical_url(), "http://example.com/");
    }

    #[test]
    fn test_empty_query_is_kept() {
        let request = make_request("example.com", "/search", Some(""), false);
        assert_eq!(request.request_uri(), "/search?");
    }

    #[test]
    fn test_context_captures_url() {
        let request = make_request("example.com", "/test", None, false);
        let ctx = TransformContext::new(&request);
        assert_eq!(ctx.canonical_url, "http://example.com/test");
        assert_eq!(request.header("host"), Some("example.com"));
    }
}
