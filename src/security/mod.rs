//! Response header security policy.
//!
//! # Data Flow
//! ```text
//! Outgoing response headers:
//!     → filters.rs (stages in priority order)
//!         → BaseCspHeader (priority 10, sets a default policy)
//!         → csp.rs ConnectSrcPatch (priority 901, local environments only)
//!     → Client
//! ```
//!
//! # Design Decisions
//! - Stages are pure functions of (headers, status, environment)
//! - A missing or unexpected policy is left alone, never an error

pub mod csp;
pub mod filters;

pub use csp::{patch_connect_src, ConnectSrcPatch, ContentSecurityPolicy, DevOrigins};
pub use filters::{FilterChain, FilterContext, HeaderFilter};
