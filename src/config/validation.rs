//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Site and admin URLs must be absolute http(s) URLs
//! - Addresses must parse, timeouts must be positive
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::redirect::site_url::{SiteUrl, UrlError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("site.url: {0}")]
    SiteUrl(UrlError),

    #[error("site.admin.url: {0}")]
    AdminUrl(UrlError),

    #[error("site.admin_path '{0}' must be a single non-empty path segment")]
    AdminPath(String),

    #[error("{field} '{value}' is not a valid socket address")]
    Address { field: &'static str, value: String },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    LogLevel(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = SiteUrl::parse(&config.site.url) {
        errors.push(ValidationError::SiteUrl(e));
    }

    if let Some(admin_url) = config.site.admin.url.as_deref().filter(|u| !u.trim().is_empty()) {
        if let Err(e) = SiteUrl::parse(admin_url) {
            errors.push(ValidationError::AdminUrl(e));
        }
    }

    let admin_path = config.site.admin_path.trim_matches('/');
    if admin_path.is_empty() || admin_path.contains(['/', '?', '#']) {
        errors.push(ValidationError::AdminPath(config.site.admin_path.clone()));
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_address(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}
