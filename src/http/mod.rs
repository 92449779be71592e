//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers)
//!     → request.rs (request ID, host / TLS extraction)
//!     → redirect middleware (301 or pass-through)
//!     → server.rs forward_handler (upstream application)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{describe, is_secure, X_REQUEST_ID};
pub use server::HttpServer;
