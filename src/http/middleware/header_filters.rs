//! Header Filter Middleware.
//! Runs the configured filter chain on every outgoing response.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;
use crate::security::filters::FilterContext;

pub async fn header_filter_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(req).await;

    // One snapshot for the whole response
    let runtime = state.runtime();
    let (mut parts, body) = response.into_parts();
    let ctx = FilterContext::new(parts.status, runtime.environment());

    let headers = std::mem::take(&mut parts.headers);
    parts.headers = runtime.filters.apply(headers, &ctx);

    Response::from_parts(parts, body)
}
