//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → tower_http TraceLayer (one span per request)
//! ```

pub mod logging;
