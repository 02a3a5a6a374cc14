//! Axum middleware.

pub mod header_filters;

pub use header_filters::header_filter_middleware;
