//! Content-Security-Policy parsing and the local `connect-src` relaxation.
//!
//! # Responsibilities
//! - Parse a CSP header value into directives without losing any bytes
//! - Insert local development origins after `connect-src 'self'`
//! - Leave every other header and every non-local environment untouched
//!
//! # Design Decisions
//! - Directives keep their raw text; serialization is the exact inverse of parsing
//! - The match is the literal `connect-src 'self'` at the start of a directive:
//!   case-sensitive, single space
//! - A directive whose `'self'` is already followed by the full allow-list is
//!   left alone, so the patch is idempotent

use std::fmt;

use axum::http::header::{self, Entry};
use axum::http::{HeaderMap, HeaderValue};

use crate::security::filters::{FilterContext, HeaderFilter};
use crate::site::Environment;

/// Ports local dev servers listen on (webpack dev server, wp-env, proxies).
pub const DEFAULT_DEV_PORTS: [u16; 3] = [8080, 8887, 8888];

/// Host the dev servers are reached on.
pub const DEFAULT_DEV_HOST: &str = "localhost";

const CONNECT_SRC_SELF: &str = "connect-src 'self'";
const SCHEMES: [&str; 4] = ["ws", "wss", "http", "https"];

/// A single `;`-separated segment of a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    raw: String,
}

impl Directive {
    /// Directive name, e.g. `connect-src`. `None` for an empty segment.
    pub fn name(&self) -> Option<&str> {
        self.raw.split_ascii_whitespace().next()
    }

    /// Source expressions following the name.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.raw.split_ascii_whitespace().skip(1)
    }

    /// Byte offset just past `'self'` when the directive opens with
    /// exactly `connect-src 'self'`.
    fn end_of_connect_src_self(&self) -> Option<usize> {
        let body = self.raw.trim_start_matches(|c: char| c.is_ascii_whitespace());
        let after = body.strip_prefix(CONNECT_SRC_SELF)?;
        match after.chars().next() {
            Some(c) if !c.is_ascii_whitespace() => None,
            _ => Some(self.raw.len() - after.len()),
        }
    }
}

/// Lossless view of a CSP header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSecurityPolicy {
    directives: Vec<Directive>,
}

impl ContentSecurityPolicy {
    pub fn parse(value: &str) -> Self {
        let directives = value
            .split(';')
            .map(|raw| Directive { raw: raw.to_string() })
            .collect();
        Self { directives }
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// First directive with the given name.
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name() == Some(name))
    }

    /// Insert `allow_list` after the first `connect-src 'self'`.
    ///
    /// `allow_list` is space-separated with a trailing space, as produced by
    /// [`DevOrigins::allow_list`]. Returns `false` when nothing changed: no
    /// `connect-src 'self'`, or the list already follows it.
    pub fn allow_connect_origins(&mut self, allow_list: &str) -> bool {
        if allow_list.trim().is_empty() {
            return false;
        }
        let insertion = format!(" {allow_list}");
        for directive in &mut self.directives {
            let Some(insert_at) = directive.end_of_connect_src_self() else {
                continue;
            };
            if directive.raw[insert_at..].starts_with(&insertion) {
                return false;
            }
            directive.raw.insert_str(insert_at, &insertion);
            return true;
        }
        false
    }
}

impl fmt::Display for ContentSecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, directive) in self.directives.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            f.write_str(&directive.raw)?;
        }
        Ok(())
    }
}

/// Local dev server origins to allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevOrigins {
    host: String,
    ports: Vec<u16>,
}

impl DevOrigins {
    /// Ports are deduplicated and kept in ascending order.
    pub fn new(host: impl Into<String>, ports: impl IntoIterator<Item = u16>) -> Self {
        let mut ports: Vec<u16> = ports.into_iter().collect();
        ports.sort_unstable();
        ports.dedup();
        Self { host: host.into(), ports }
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// `ws://`, `wss://`, `http://`, `https://` for each port in order.
    pub fn origins(&self) -> Vec<String> {
        self.ports
            .iter()
            .flat_map(|port| {
                SCHEMES
                    .iter()
                    .map(move |scheme| format!("{}://{}:{}", scheme, self.host, port))
            })
            .collect()
    }

    /// Space-separated origins with a trailing space.
    pub fn allow_list(&self) -> String {
        self.origins().iter().map(|o| format!("{o} ")).collect()
    }
}

impl Default for DevOrigins {
    fn default() -> Self {
        Self::new(DEFAULT_DEV_HOST, DEFAULT_DEV_PORTS)
    }
}

/// Header filter relaxing `connect-src` for local development.
#[derive(Debug, Clone, Default)]
pub struct ConnectSrcPatch {
    origins: DevOrigins,
}

impl ConnectSrcPatch {
    pub fn new(origins: DevOrigins) -> Self {
        Self { origins }
    }

    /// Patch every `Content-Security-Policy` value when running locally.
    pub fn patch(&self, mut headers: HeaderMap, environment: Environment) -> HeaderMap {
        if !environment.is_local() {
            return headers;
        }

        let allow_list = self.origins.allow_list();
        if let Entry::Occupied(mut entry) = headers.entry(header::CONTENT_SECURITY_POLICY) {
            for value in entry.iter_mut() {
                let Ok(text) = value.to_str() else {
                    tracing::debug!("Skipping non-ASCII Content-Security-Policy value");
                    continue;
                };
                let mut policy = ContentSecurityPolicy::parse(text);
                if !policy.allow_connect_origins(&allow_list) {
                    continue;
                }
                match HeaderValue::from_str(&policy.to_string()) {
                    Ok(patched) => *value = patched,
                    Err(e) => tracing::warn!(error = %e, "Patched CSP is not a valid header value"),
                }
            }
        }
        headers
    }
}

impl HeaderFilter for ConnectSrcPatch {
    fn name(&self) -> &str {
        "connect-src-origins"
    }

    fn filter(&self, headers: HeaderMap, ctx: &FilterContext) -> HeaderMap {
        self.patch(headers, ctx.environment)
    }
}

/// Relax `connect-src` for the default dev ports on localhost.
pub fn patch_connect_src(headers: HeaderMap, environment: Environment) -> HeaderMap {
    ConnectSrcPatch::default().patch(headers, environment)
}
