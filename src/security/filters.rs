//! Response header filter chain.
//!
//! # Responsibilities
//! - Define the `HeaderFilter` stage interface
//! - Run stages in priority order on each outgoing response
//! - Provide the base CSP stage the connect-src patch depends on
//!
//! # Design Decisions
//! - Lower priority runs first; equal priorities keep registration order
//! - Chains are immutable once built and shared via Arc
//! - Stages receive the environment explicitly in `FilterContext`

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};

use crate::config::schema::{DevConfig, HeadersConfig};
use crate::security::csp::{ConnectSrcPatch, DevOrigins};
use crate::site::Environment;

/// Priority for stages that establish default headers.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Priority of the connect-src patch; late enough to see every default header.
pub const CONNECT_SRC_PRIORITY: i32 = 901;

/// Per-response inputs available to every stage.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    pub status: StatusCode,
    pub environment: Environment,
}

impl FilterContext {
    pub fn new(status: StatusCode, environment: Environment) -> Self {
        Self { status, environment }
    }
}

/// A named transformation of a response's headers.
pub trait HeaderFilter: Send + Sync {
    fn name(&self) -> &str;

    fn filter(&self, headers: HeaderMap, ctx: &FilterContext) -> HeaderMap;
}

struct Stage {
    priority: i32,
    filter: Box<dyn HeaderFilter>,
}

/// Ordered set of header filters.
#[derive(Default)]
pub struct FilterChain {
    stages: Vec<Stage>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard chain: optional base CSP, then the connect-src patch.
    pub fn for_config(headers: &HeadersConfig, dev: &DevConfig) -> Self {
        let mut chain = Self::new();

        if let Some(csp) = &headers.content_security_policy {
            match HeaderValue::from_str(csp) {
                Ok(value) => {
                    chain.register(DEFAULT_PRIORITY, BaseCspHeader::new(value));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring invalid base Content-Security-Policy");
                }
            }
        }

        let origins = DevOrigins::new(dev.host.clone(), dev.ports.iter().copied());
        chain.register(headers.connect_src_priority, ConnectSrcPatch::new(origins));
        chain
    }

    /// Add a stage. Returns `self` so registrations can be chained.
    pub fn register<F>(&mut self, priority: i32, filter: F) -> &mut Self
    where
        F: HeaderFilter + 'static,
    {
        let at = self.stages.partition_point(|s| s.priority <= priority);
        tracing::debug!(stage = filter.name(), priority, "Registered header filter");
        self.stages.insert(at, Stage { priority, filter: Box::new(filter) });
        self
    }

    /// Thread `headers` through every stage.
    pub fn apply(&self, headers: HeaderMap, ctx: &FilterContext) -> HeaderMap {
        self.stages.iter().fold(headers, |headers, stage| {
            tracing::trace!(
                stage = stage.filter.name(),
                status = ctx.status.as_u16(),
                "Applying header filter"
            );
            stage.filter.filter(headers, ctx)
        })
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.filter.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Sets a default `Content-Security-Policy` when the response has none.
#[derive(Debug, Clone)]
pub struct BaseCspHeader {
    value: HeaderValue,
}

impl BaseCspHeader {
    pub fn new(value: HeaderValue) -> Self {
        Self { value }
    }
}

impl HeaderFilter for BaseCspHeader {
    fn name(&self) -> &str {
        "base-csp"
    }

    fn filter(&self, mut headers: HeaderMap, _ctx: &FilterContext) -> HeaderMap {
        if !headers.contains_key(header::CONTENT_SECURITY_POLICY) {
            headers.insert(header::CONTENT_SECURITY_POLICY, self.value.clone());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Appends its name to `x-trace` so execution order is observable.
    struct Marker(&'static str);

    impl HeaderFilter for Marker {
        fn name(&self) -> &str {
            self.0
        }

        fn filter(&self, mut headers: HeaderMap, _ctx: &FilterContext) -> HeaderMap {
            let mut trace = headers
                .get("x-trace")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            trace.push_str(self.0);
            headers.insert("x-trace", HeaderValue::from_str(&trace).unwrap());
            headers
        }
    }

    fn local() -> FilterContext {
        FilterContext::new(StatusCode::OK, Environment::Local)
    }

    #[test]
    fn test_stages_run_by_priority_then_registration() {
        let mut chain = FilterChain::new();
        chain
            .register(901, Marker("c"))
            .register(10, Marker("a"))
            .register(10, Marker("b"))
            .register(-5, Marker("z"));

        assert_eq!(chain.stage_names(), vec!["z", "a", "b", "c"]);
        let headers = chain.apply(HeaderMap::new(), &local());
        assert_eq!(headers["x-trace"], "zabc");
    }

    /// Marks error responses only.
    struct ErrorMarker;

    impl HeaderFilter for ErrorMarker {
        fn name(&self) -> &str {
            "error-marker"
        }

        fn filter(&self, mut headers: HeaderMap, ctx: &FilterContext) -> HeaderMap {
            if ctx.status.is_client_error() || ctx.status.is_server_error() {
                headers.insert("x-error", HeaderValue::from(ctx.status.as_u16()));
            }
            headers
        }
    }

    #[test]
    fn test_stages_see_response_status() {
        let mut chain = FilterChain::new();
        chain.register(DEFAULT_PRIORITY, ErrorMarker);

        assert!(chain.apply(HeaderMap::new(), &local()).get("x-error").is_none());

        let timeout = FilterContext::new(StatusCode::REQUEST_TIMEOUT, Environment::Local);
        assert_eq!(chain.apply(HeaderMap::new(), &timeout)["x-error"], "408");
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        let mut headers = HeaderMap::new();
        headers.insert(header::SERVER, HeaderValue::from_static("reports"));
        assert_eq!(chain.apply(headers.clone(), &local()), headers);
    }

    #[test]
    fn test_base_csp_does_not_overwrite() {
        let stage = BaseCspHeader::new(HeaderValue::from_static("default-src 'none'"));

        let headers = stage.filter(HeaderMap::new(), &local());
        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], "default-src 'none'");

        let mut existing = HeaderMap::new();
        existing.insert(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static("img-src *"));
        let headers = stage.filter(existing, &local());
        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], "img-src *");
    }

    #[test]
    fn test_config_chain_patches_base_header() {
        let headers_config = HeadersConfig {
            content_security_policy: Some("connect-src 'self'".to_string()),
            ..HeadersConfig::default()
        };
        let dev = DevConfig { host: "localhost".to_string(), ports: vec![3000] };
        let chain = FilterChain::for_config(&headers_config, &dev);

        assert_eq!(chain.stage_names(), vec!["base-csp", "connect-src-origins"]);

        let headers = chain.apply(HeaderMap::new(), &local());
        assert_eq!(
            headers[header::CONTENT_SECURITY_POLICY],
            "connect-src 'self' ws://localhost:3000 wss://localhost:3000 http://localhost:3000 https://localhost:3000 "
        );

        let production = FilterContext::new(StatusCode::OK, Environment::Production);
        let headers = chain.apply(HeaderMap::new(), &production);
        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], "connect-src 'self'");
    }

    #[test]
    fn test_config_chain_without_base_csp() {
        let chain = FilterChain::for_config(&HeadersConfig::default(), &DevConfig::default());
        assert_eq!(chain.len(), 1);
        assert!(chain.apply(HeaderMap::new(), &local()).is_empty());
    }
}
