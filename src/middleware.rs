//! Axum middleware that runs the agent in front of the next handler.
//!
//! ```no_run
//! use axum::{middleware, routing::get, Router};
//! use std::sync::Arc;
//! use zentinel_agent_header_mutator::{middleware::mutate_request_headers, HeaderMutatorAgent, MutatorConfig};
//!
//! let agent = Arc::new(HeaderMutatorAgent::new(MutatorConfig::default()).unwrap());
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "ok" }))
//!     .layer(middleware::from_fn_with_state(agent, mutate_request_headers));
//! ```

use crate::agent::HeaderMutatorAgent;
use crate::context::RequestInfo;
use crate::headers::HeaderCollection;
use axum::{
    body::Body,
    extract::State,
    http::{
        header::{HeaderMap, HeaderName, HeaderValue, HOST},
        request::Parts,
        uri::Scheme,
        Request,
    },
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Request extension marking a TLS-terminated connection.
///
/// The acceptor that terminates TLS inserts this so the canonical URL uses
/// the `https` scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureConnection;

/// Mutate the request headers, then hand the request to `next`.
pub async fn mutate_request_headers(
    State(agent): State<Arc<HeaderMutatorAgent>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let info = request_info(&parts);
    let headers = agent.process(&info);
    write_changes(&mut parts.headers, &info.headers, &headers);

    next.run(Request::from_parts(parts, body)).await
}

/// Build a [`RequestInfo`] from request parts.
pub fn request_info(parts: &Parts) -> RequestInfo {
    let secure = parts.uri.scheme() == Some(&Scheme::HTTPS)
        || parts.extensions.get::<SecureConnection>().is_some();

    let host = parts
        .uri
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            parts
                .headers
                .get(HOST)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        })
        .unwrap_or_default();

    RequestInfo {
        method: parts.method.to_string(),
        host,
        path: parts.uri.path().to_string(),
        query_string: parts.uri.query().map(str::to_string),
        secure,
        headers: from_header_map(&parts.headers),
    }
}

/// Copy an `http` header map into a [`HeaderCollection`].
///
/// Values that are not valid UTF-8 are read lossily.
pub fn from_header_map(map: &HeaderMap) -> HeaderCollection {
    map.iter()
        .map(|(name, value)| {
            (
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Write the names whose values changed between `before` and `after` back
/// into `map`.
///
/// Names with identical values keep their original `HeaderValue`s, so bytes
/// that are not valid UTF-8 and the sensitive flag pass through untouched.
/// Names or values `http` rejects are dropped with a warning; the request is
/// still forwarded.
pub fn write_changes(map: &mut HeaderMap, before: &HeaderCollection, after: &HeaderCollection) {
    for name in before.names().filter(|n| !after.contains(n)) {
        map.remove(name);
    }

    for name in after.names() {
        let values = after.get_all(name);
        if values == before.get_all(name) {
            continue;
        }

        let header_name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(n) => n,
            Err(e) => {
                warn!(header = %name, error = %e, "Dropping header with invalid name");
                continue;
            }
        };
        map.remove(&header_name);
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    map.append(header_name.clone(), v);
                }
                Err(e) => warn!(header = %name, error = %e, "Dropping header with invalid value"),
            }
        }
    }
}
