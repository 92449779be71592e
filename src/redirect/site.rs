//! Validated site snapshot consumed by the redirect resolver.

use crate::config::schema::SiteConfig;
use crate::redirect::site_url::{SiteUrl, UrlError};

/// Default admin entry segment, served at `{subdir}/reborn/`.
pub const DEFAULT_ADMIN_PATH: &str = "reborn";

/// Public and admin origins plus request-extraction settings.
///
/// Built once per configuration load and shared read-only between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    public: SiteUrl,
    admin: Option<SiteUrl>,
    admin_path: String,
    trust_proxy: bool,
}

impl Site {
    pub fn new(public: SiteUrl) -> Self {
        Self {
            public,
            admin: None,
            admin_path: DEFAULT_ADMIN_PATH.to_string(),
            trust_proxy: true,
        }
    }

    pub fn with_admin(mut self, admin: SiteUrl) -> Self {
        self.admin = Some(admin);
        self
    }

    pub fn with_admin_path(mut self, admin_path: impl Into<String>) -> Self {
        self.admin_path = admin_path.into().trim_matches('/').to_string();
        self
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Build a site from its configuration section.
    pub fn from_config(config: &SiteConfig) -> Result<Self, UrlError> {
        let mut site = Site::new(SiteUrl::parse(&config.url)?)
            .with_admin_path(config.admin_path.as_str())
            .with_trust_proxy(config.trust_proxy);

        if let Some(admin_url) = config.admin.url.as_deref().filter(|u| !u.trim().is_empty()) {
            site = site.with_admin(SiteUrl::parse(admin_url)?);
        }
        Ok(site)
    }

    pub fn public_url(&self) -> &SiteUrl {
        &self.public
    }

    /// The admin URL, falling back to the public URL when none is configured.
    pub fn admin_url(&self) -> &SiteUrl {
        self.admin.as_ref().unwrap_or(&self.public)
    }

    /// True when an admin URL is configured on a different host or port
    /// than the public URL. Only then do admin requests redirect on host.
    pub fn has_distinct_admin_host(&self) -> bool {
        self.admin
            .as_ref()
            .is_some_and(|admin| admin.authority() != self.public.authority())
    }

    /// Subdirectory prefix the admin area is served under.
    pub fn admin_subdir(&self) -> &str {
        match &self.admin {
            Some(admin) if !admin.subdir().is_empty() => admin.subdir(),
            _ => self.public.subdir(),
        }
    }

    pub fn admin_path(&self) -> &str {
        &self.admin_path
    }

    /// `{subdir}/{admin_path}/` on the public site.
    pub fn admin_entry(&self) -> String {
        format!("{}/{}/", self.public.subdir(), self.admin_path)
    }

    /// True for `{subdir}/{admin_path}` and anything below it, where `subdir`
    /// is either the public subdirectory or the admin URL's own one.
    pub fn is_admin_area(&self, path: &str) -> bool {
        [self.public.subdir(), self.admin_subdir()].iter().any(|subdir| {
            path.strip_prefix(*subdir)
                .and_then(|rest| rest.strip_prefix('/'))
                .and_then(|rest| rest.strip_prefix(self.admin_path.as_str()))
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    pub fn trust_proxy(&self) -> bool {
        self.trust_proxy
    }
}
