//! Annual report plugin assets and local development header policy.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod site;

pub use config::AppConfig;
pub use http::DevServer;
pub use lifecycle::Shutdown;
pub use security::csp::patch_connect_src;
pub use site::Environment;
