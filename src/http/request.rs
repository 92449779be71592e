//! Request inspection.
//!
//! # Responsibilities
//! - Request ID layers (UUID v4 in `x-request-id`)
//! - Extract the redirect-relevant view of a request (host, target, TLS)
//!
//! # Design Decisions
//! - `X-Forwarded-*` headers are honoured only when the site trusts its proxy
//! - Only the first value of a comma-separated forwarded header counts
//! - Missing or non-UTF-8 host headers become `None`, never an error

use axum::http::{header, HeaderMap, HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::redirect::RequestDescriptor;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Layer assigning a fresh UUID to requests that arrive without an ID.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer copying the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Build the resolver's view of an inbound request.
pub fn describe<B>(request: &Request<B>, trust_proxy: bool) -> RequestDescriptor {
    let headers = request.headers();

    let host = trust_proxy
        .then(|| first_value(headers, &X_FORWARDED_HOST))
        .flatten()
        .or_else(|| first_value(headers, &header::HOST))
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()));

    let original_url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    RequestDescriptor {
        host,
        original_url,
        secure: is_secure(request, trust_proxy),
    }
}

/// True when the request reached us over TLS, directly or via a trusted proxy.
pub fn is_secure<B>(request: &Request<B>, trust_proxy: bool) -> bool {
    if request.uri().scheme_str() == Some("https") {
        return true;
    }
    trust_proxy
        && first_value(request.headers(), &X_FORWARDED_PROTO)
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

fn first_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
