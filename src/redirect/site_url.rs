//! Site URL parsing and path/authority normalization.
//!
//! # Responsibilities
//! - Parse configured site URLs into scheme, authority and subdirectory
//! - Normalize request `Host` values for comparison
//! - Build destination paths (subdirectory join, trailing slash)
//!
//! # Design Decisions
//! - Default ports are dropped so `example.com` and `example.com:443` compare equal
//! - Subdirectories are stored without a trailing slash (`""` or `/blog`)
//! - Path helpers never fail; unexpected input is treated as an opaque segment

use std::fmt;

use thiserror::Error;
use url::Url;

/// Errors raised while parsing a configured site URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("'{url}' is not a valid absolute URL: {reason}")]
    Invalid { url: String, reason: String },

    #[error("'{url}' uses unsupported scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("'{url}' has no host")]
    MissingHost { url: String },

    #[error("'{url}' must not carry a query string or fragment")]
    UnexpectedComponent { url: String },
}

/// Transport scheme of a site URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn is_https(self) -> bool {
        matches!(self, Scheme::Https)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated absolute site URL: `scheme://host[:port][/subdir]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrl {
    scheme: Scheme,
    host: String,
    port: Option<u16>,
    subdir: String,
}

impl SiteUrl {
    /// Parse a configured URL such as `https://example.com:2368/blog/`.
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let parsed = Url::parse(raw.trim()).map_err(|e| UrlError::Invalid {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(UrlError::UnsupportedScheme {
                    url: raw.to_string(),
                    scheme: other.to_string(),
                })
            }
        };

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| UrlError::MissingHost { url: raw.to_string() })?
            .to_ascii_lowercase();

        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(UrlError::UnexpectedComponent { url: raw.to_string() });
        }

        // `Url::port` already reports `None` for the scheme's default port.
        Ok(Self {
            scheme,
            host,
            port: parsed.port(),
            subdir: parsed.path().trim_end_matches('/').to_string(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Subdirectory prefix without trailing slash; empty when mounted at the root.
    pub fn subdir(&self) -> &str {
        &self.subdir
    }

    /// `host[:port]`, omitting the default port.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// `scheme://host[:port]`
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.authority())
    }
}

impl fmt::Display for SiteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/", self.origin(), self.subdir)
    }
}

/// Normalize a request host for comparison against `scheme`'s authorities.
///
/// Lowercases, strips trailing slashes and drops the scheme's default port.
pub fn normalize_host(raw: &str, scheme: Scheme) -> String {
    let host = raw.trim().trim_end_matches('/').to_ascii_lowercase();
    let default_suffix = format!(":{}", scheme.default_port());
    match host.strip_suffix(&default_suffix) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => host,
    }
}

/// Split a raw request target into path and query. The query is returned
/// without its leading `?`.
pub fn split_path_and_query(original_url: &str) -> (&str, Option<&str>) {
    let without_fragment = original_url
        .split_once('#')
        .map_or(original_url, |(before, _)| before);
    match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    }
}

/// Remove `prefix` from `path` when it matches on a segment boundary.
/// Returns `None` when `path` is not under `prefix`.
pub fn strip_subdir<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    path.strip_prefix(prefix)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Join a subdirectory prefix and a path, ensuring a leading and trailing slash.
pub fn join_with_trailing_slash(prefix: &str, path: &str) -> String {
    let mut joined = String::with_capacity(prefix.len() + path.len() + 2);
    joined.push_str(prefix);
    if !path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(path);
    if !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}
