//! URL redirect subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request
//!     → middleware.rs legacy_redirects (static alias table, legacy.rs)
//!     → middleware.rs mark_admin_area (sets AdminArea for {subdir}/{admin}/...)
//!     → middleware.rs url_redirects
//!         → http::request::describe (host, path+query, TLS)
//!         → resolver.rs resolve(site, Blog | Admin, descriptor)
//!     → 301 + Location + Cache-Control, or next handler
//! ```
//!
//! # Design Decisions
//! - Site configuration is passed in as a snapshot, never read from globals
//! - Blog vs admin is a closed enum, not a strategy callback
//! - Every decision is recomputed per request; nothing is cached

pub mod legacy;
pub mod middleware;
pub mod resolver;
pub mod site;
pub mod site_url;

pub use legacy::LegacyRedirects;
pub use middleware::{admin_redirect, legacy_redirects, mark_admin_area, url_redirects, AdminArea, RedirectState};
pub use resolver::{resolve, CachePolicy, Decision, Redirect, RedirectReason, RequestDescriptor, Target};
pub use site::Site;
pub use site_url::{Scheme, SiteUrl, UrlError};
