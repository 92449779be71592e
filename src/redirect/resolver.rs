//! Redirect decision engine.
//!
//! # Responsibilities
//! - Decide whether a request must move to another origin or scheme
//! - Compute the absolute destination URL, status and cache policy
//!
//! # Design Decisions
//! - Pure function of (site snapshot, target, request descriptor)
//! - Host mismatch is checked before protocol mismatch
//! - A request already on its target host and scheme always continues,
//!   so following a redirect never produces a second one

use axum::http::StatusCode;

use crate::redirect::site::Site;
use crate::redirect::site_url::{
    join_with_trailing_slash, normalize_host, split_path_and_query, strip_subdir, Scheme, SiteUrl,
};

/// Which origin a class of requests belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Public site. Only the protocol is enforced; the request host is kept.
    Blog,
    /// Admin area. Served from the admin URL, or the public URL when unset.
    Admin,
}

/// The parts of an inbound request the resolver looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// `Host` (or trusted forwarded host); `None` when absent.
    pub host: Option<String>,
    /// Path and query exactly as received.
    pub original_url: String,
    /// Connection (or trusted proxy) used TLS.
    pub secure: bool,
}

impl RequestDescriptor {
    pub fn new(host: Option<&str>, original_url: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.map(str::to_string),
            original_url: original_url.into(),
            secure,
        }
    }
}

/// Cache-Control policy attached to a redirect response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Dynamic redirects: never cached by shared caches, briefly by browsers.
    Private,
    /// Static legacy aliases: cacheable for a year.
    Year,
}

impl CachePolicy {
    pub fn header_value(self) -> &'static str {
        match self {
            CachePolicy::Private => "private, max-age=60",
            CachePolicy::Year => "public, max-age=31536000",
        }
    }
}

/// Why a redirect was issued. Used for logs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    MissingHost,
    Host,
    Protocol,
    Legacy,
}

impl RedirectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectReason::MissingHost => "missing_host",
            RedirectReason::Host => "host",
            RedirectReason::Protocol => "protocol",
            RedirectReason::Legacy => "legacy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub status: StatusCode,
    pub location: String,
    pub cache_control: CachePolicy,
    pub reason: RedirectReason,
}

impl Redirect {
    pub fn permanent(location: String, cache_control: CachePolicy, reason: RedirectReason) -> Self {
        Self {
            status: StatusCode::MOVED_PERMANENTLY,
            location,
            cache_control,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Redirect(Redirect),
}

impl Decision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Decision::Redirect(_))
    }
}

/// Resolve the redirect decision for one request.
pub fn resolve(site: &Site, target: Target, request: &RequestDescriptor) -> Decision {
    let (path, query) = split_path_and_query(&request.original_url);

    match target {
        Target::Blog => resolve_blog(site, path, query, request),
        Target::Admin => resolve_admin(site, path, query, request),
    }
}

fn resolve_blog(site: &Site, path: &str, query: Option<&str>, request: &RequestDescriptor) -> Decision {
    let public = site.public_url();
    let subdir = public.subdir();

    let Some(host) = request.host.as_deref().filter(|h| !h.trim().is_empty()) else {
        let location = build_location(public.scheme(), &public.authority(), &[subdir], subdir, path, query);
        return redirect(location, RedirectReason::MissingHost);
    };

    if public.scheme().is_https() && !request.secure {
        // Upgrade in place: the request host is kept, minus an explicit :80.
        let authority = normalize_host(host, Scheme::Http);
        let location = build_location(Scheme::Https, &authority, &[subdir], subdir, path, query);
        return redirect(location, RedirectReason::Protocol);
    }

    Decision::Continue
}

fn resolve_admin(site: &Site, path: &str, query: Option<&str>, request: &RequestDescriptor) -> Decision {
    let admin = site.admin_url();
    let host = request.host.as_deref().filter(|h| !h.trim().is_empty());

    let reason = match host {
        None => Some(RedirectReason::MissingHost),
        Some(host) if site.has_distinct_admin_host() && !host_matches(host, admin) => {
            Some(RedirectReason::Host)
        }
        Some(_) if admin.scheme().is_https() && !request.secure => Some(RedirectReason::Protocol),
        Some(_) => None,
    };

    match reason {
        Some(reason) => {
            let location = build_location(
                admin.scheme(),
                &admin.authority(),
                &[site.admin_subdir(), site.public_url().subdir()],
                site.admin_subdir(),
                path,
                query,
            );
            redirect(location, reason)
        }
        None => Decision::Continue,
    }
}

fn host_matches(request_host: &str, target: &SiteUrl) -> bool {
    normalize_host(request_host, target.scheme()) == target.authority()
}

/// Paths under one of `source_subdirs` move under `target_subdir`; any other
/// path is kept as requested.
fn build_location(
    scheme: Scheme,
    authority: &str,
    source_subdirs: &[&str],
    target_subdir: &str,
    path: &str,
    query: Option<&str>,
) -> String {
    let rebased = source_subdirs
        .iter()
        .find_map(|subdir| strip_subdir(path, subdir))
        .map(|relative| join_with_trailing_slash(target_subdir, relative))
        .unwrap_or_else(|| join_with_trailing_slash("", path));
    let mut location = format!("{}://{}{}", scheme, authority, rebased);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(query);
    }
    location
}

fn redirect(location: String, reason: RedirectReason) -> Decision {
    Decision::Redirect(Redirect::permanent(location, CachePolicy::Private, reason))
}
