//! HTTP subsystem for the dev server.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, routes: /build/*, /assets/{hook}, /health)
//!     → handler or ServeDir produces a response
//!     → middleware/header_filters.rs (base CSP, connect-src patch)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use server::{AppState, DevServer};
