//! Blog/admin origin redirect gateway library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redirect;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use redirect::{resolve, Decision, RequestDescriptor, Site, Target};
