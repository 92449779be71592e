//! Static redirects for retired admin entry points.
//!
//! # Data Flow
//! ```text
//! Site (subdir, admin_path)
//!     → LegacyRedirects::for_site (build exact-path table)
//!     → lookup(path) per request
//!     → 301 + relative Location + year-long Cache-Control
//! ```

use crate::redirect::resolver::{CachePolicy, Redirect, RedirectReason};
use crate::redirect::site::Site;

/// Old path (relative to the site subdirectory) and the admin fragment it maps to.
const ALIASES: &[(&str, &str)] = &[
    ("logout", "#/signout/"),
    ("signout", "#/signout/"),
    ("signup", "#/signup/"),
    ("signin", ""),
    ("admin", ""),
];

#[derive(Debug, Clone)]
struct Alias {
    path: String,
    destination: String,
}

/// Exact-path alias table, compiled once per site snapshot.
#[derive(Debug, Clone)]
pub struct LegacyRedirects {
    aliases: Vec<Alias>,
    admin_entry: String,
}

impl LegacyRedirects {
    pub fn for_site(site: &Site) -> Self {
        let subdir = site.public_url().subdir();
        let admin_entry = site.admin_entry();

        let aliases = ALIASES
            .iter()
            .filter(|(name, _)| *name != site.admin_path())
            .map(|(name, fragment)| Alias {
                path: format!("{}/{}/", subdir, name),
                destination: format!("{}{}", admin_entry, fragment),
            })
            .collect();

        Self { aliases, admin_entry }
    }

    /// Look up a request path. Matches with or without the trailing slash;
    /// the admin entry itself also matches case-insensitively.
    pub fn lookup(&self, path: &str) -> Option<Redirect> {
        let normalized = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };

        let destination = self
            .aliases
            .iter()
            .find(|alias| alias.path == normalized)
            .map(|alias| alias.destination.clone())
            .or_else(|| {
                let is_variant = path != self.admin_entry
                    && normalized.eq_ignore_ascii_case(&self.admin_entry);
                is_variant.then(|| self.admin_entry.clone())
            })?;

        Some(Redirect::permanent(
            destination,
            CachePolicy::Year,
            RedirectReason::Legacy,
        ))
    }
}
