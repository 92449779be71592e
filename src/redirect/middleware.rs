//! Axum middleware applying redirect decisions.
//!
//! Layer order, outermost first:
//! `legacy_redirects` → `mark_admin_area` → `url_redirects` → handler.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::describe;
use crate::observability::metrics;
use crate::redirect::legacy::LegacyRedirects;
use crate::redirect::resolver::{resolve, Decision, Redirect, Target};
use crate::redirect::site::Site;

/// Request extension marking a request as bound for the admin area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminArea;

/// Everything derived from one configuration load.
#[derive(Debug)]
pub struct SiteSnapshot {
    pub site: Site,
    pub legacy: LegacyRedirects,
}

impl SiteSnapshot {
    pub fn new(site: Site) -> Self {
        let legacy = LegacyRedirects::for_site(&site);
        Self { site, legacy }
    }
}

/// Shared, hot-swappable redirect state.
#[derive(Clone)]
pub struct RedirectState {
    snapshot: Arc<ArcSwap<SiteSnapshot>>,
}

impl RedirectState {
    pub fn new(site: Site) -> Self {
        Self {
            snapshot: Arc::new(ArcSwap::from_pointee(SiteSnapshot::new(site))),
        }
    }

    /// Current snapshot. Callers keep the returned `Arc` for the whole request.
    pub fn load(&self) -> Arc<SiteSnapshot> {
        self.snapshot.load_full()
    }

    /// Replace the site for all subsequent requests.
    pub fn store(&self, site: Site) {
        self.snapshot.store(Arc::new(SiteSnapshot::new(site)));
    }
}

/// Answer retired admin paths with a permanent, long-cached redirect.
pub async fn legacy_redirects(
    State(state): State<RedirectState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let snapshot = state.load();
    match snapshot.legacy.lookup(request.uri().path()) {
        Some(redirect) => {
            tracing::debug!(
                path = %request.uri().path(),
                location = %redirect.location,
                "legacy redirect"
            );
            redirect_response(&redirect)
        }
        None => next.run(request).await,
    }
}

/// Flag requests under `{subdir}/{admin_path}/` with [`AdminArea`], for both
/// the public and the admin subdirectory.
pub async fn mark_admin_area(
    State(state): State<RedirectState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if state.load().site.is_admin_area(request.uri().path()) {
        request.extensions_mut().insert(AdminArea);
    }
    next.run(request).await
}

/// Redirect against the admin target when the request carries [`AdminArea`],
/// otherwise against the blog target.
pub async fn url_redirects(
    State(state): State<RedirectState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let target = if request.extensions().get::<AdminArea>().is_some() {
        Target::Admin
    } else {
        Target::Blog
    };
    apply(&state, target, request, next).await
}

/// Redirect against the admin target unconditionally.
///
/// The gateway router relies on [`mark_admin_area`] instead. This is for
/// embedders that mount the admin application on a router of its own.
pub async fn admin_redirect(
    State(state): State<RedirectState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    apply(&state, Target::Admin, request, next).await
}

async fn apply(state: &RedirectState, target: Target, request: Request<Body>, next: Next) -> Response {
    let snapshot = state.load();
    let descriptor = describe(&request, snapshot.site.trust_proxy());

    match resolve(&snapshot.site, target, &descriptor) {
        Decision::Redirect(redirect) => {
            tracing::debug!(
                redirect_target = ?target,
                host = ?descriptor.host,
                url = %descriptor.original_url,
                secure = descriptor.secure,
                location = %redirect.location,
                reason = redirect.reason.as_str(),
                "url redirect"
            );
            redirect_response(&redirect)
        }
        Decision::Continue => next.run(request).await,
    }
}

fn redirect_response(redirect: &Redirect) -> Response {
    metrics::record_redirect(redirect.reason);
    (
        redirect.status,
        [
            (header::LOCATION, redirect.location.clone()),
            (header::CACHE_CONTROL, redirect.cache_control.header_value().to_string()),
        ],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::site_url::SiteUrl;
    use axum::{http::StatusCode, middleware, Router};
    use tower::ServiceExt;

    fn site(url: &str, admin: Option<&str>) -> Site {
        let site = Site::new(SiteUrl::parse(url).unwrap());
        match admin {
            Some(admin) => site.with_admin(SiteUrl::parse(admin).unwrap()),
            None => site,
        }
    }

    fn app(state: RedirectState) -> Router {
        Router::new()
            .fallback(|| async { "next" })
            .layer(middleware::from_fn_with_state(state.clone(), url_redirects))
            .layer(middleware::from_fn_with_state(state.clone(), mark_admin_area))
            .layer(middleware::from_fn_with_state(state, legacy_redirects))
    }

    fn request(host: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("Host", host)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_blog_protocol_redirect() {
        let state = RedirectState::new(site("https://default.com:2368/", None));
        let response = app(state).oneshot(request("default.com:2368", "/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "https://default.com:2368/");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "private, max-age=60");
    }

    #[tokio::test]
    async fn test_pass_through_leaves_headers_alone() {
        let state = RedirectState::new(site("http://default.com:2368/", None));
        let response = app(state).oneshot(request("default.com:2368", "/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::LOCATION).is_none());
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert_eq!(body_text(response).await, "next");
    }

    #[tokio::test]
    async fn test_admin_area_uses_admin_target() {
        let state = RedirectState::new(site("http://default.com:2368", Some("https://admin.default.com:2368")));

        let response = app(state.clone())
            .oneshot(request("default.com:2368", "/reborn/posts?filter=draft"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://admin.default.com:2368/reborn/posts/?filter=draft"
        );

        // Blog pages on the same host are not moved.
        let blog = app(state).oneshot(request("default.com:2368", "/my-post/")).await.unwrap();
        assert_eq!(blog.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_area_under_admin_subdirectory() {
        let state = RedirectState::new(site("http://default.com/blog", Some("https://admin.default.com/cms")));

        let response = app(state.clone())
            .oneshot(request("admin.default.com", "/cms/reborn/posts/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "https://admin.default.com/cms/reborn/posts/");

        let from_blog = app(state.clone())
            .oneshot(request("default.com", "/blog/reborn/posts/"))
            .await
            .unwrap();
        assert_eq!(from_blog.headers()[header::LOCATION], "https://admin.default.com/cms/reborn/posts/");

        // Blog pages on an http public site stay plain.
        let blog = app(state).oneshot(request("default.com", "/blog/about/")).await.unwrap();
        assert_eq!(blog.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blog_upgrade_outside_subdirectory() {
        let state = RedirectState::new(site("https://default.com/blog", None));
        let response = app(state).oneshot(request("default.com", "/favicon.ico")).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "https://default.com/favicon.ico/");
    }

    #[tokio::test]
    async fn test_forwarded_proto_satisfies_https() {
        let state = RedirectState::new(site("https://default.com", None));
        let req = Request::builder()
            .uri("/reborn/")
            .header("Host", "default.com")
            .header("X-Forwarded-Proto", "https")
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forwarded_proto_ignored_without_trust() {
        let state = RedirectState::new(site("https://default.com", None).with_trust_proxy(false));
        let req = Request::builder()
            .uri("/")
            .header("Host", "default.com")
            .header("X-Forwarded-Proto", "https")
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    }

    #[tokio::test]
    async fn test_legacy_runs_before_resolver() {
        let state = RedirectState::new(site("https://default.com", None));
        let response = app(state).oneshot(request("default.com", "/signout/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/reborn/#/signout/");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=31536000");
    }

    #[tokio::test]
    async fn test_admin_redirect_ignores_marker() {
        let state = RedirectState::new(site("http://default.com", Some("https://admin.default.com")));
        let app = Router::new()
            .fallback(|| async { "next" })
            .layer(middleware::from_fn_with_state(state, admin_redirect));

        let response = app.oneshot(request("default.com", "/anything")).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "https://admin.default.com/anything/");
    }

    #[tokio::test]
    async fn test_store_swaps_site_for_next_request() {
        let state = RedirectState::new(site("http://default.com", None));
        let first = app(state.clone()).oneshot(request("default.com", "/")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        state.store(site("https://default.com", None));
        let second = app(state).oneshot(request("default.com", "/")).await.unwrap();
        assert_eq!(second.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(second.headers()[header::LOCATION], "https://default.com/");
    }
}
