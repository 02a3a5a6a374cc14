//! Shared helpers for dev server integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, Response};
use report_assets::config::AppConfig;
use report_assets::site::Environment;
use tempfile::TempDir;

pub const BASE_POLICY: &str = "default-src 'self'; connect-src 'self'; img-src *";

/// Plugin root with a populated `build/` folder.
pub fn plugin_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let build = dir.path().join("build");
    fs::create_dir(&build).unwrap();
    fs::write(build.join("editor.js"), "console.log('editor');").unwrap();
    fs::write(build.join("editor.css"), ".editor{}").unwrap();
    fs::write(build.join("frontend.js"), "console.log('frontend');").unwrap();
    fs::write(build.join("frontend.css"), ".frontend{}").unwrap();
    dir
}

pub fn config_for(root: &Path, environment: Environment) -> AppConfig {
    let mut config = AppConfig::default();
    config.site.environment = environment;
    config.site.plugin_path = root.to_path_buf();
    config.site.plugin_url = "http://localhost:8887/".to_string();
    config.headers.content_security_policy = Some(BASE_POLICY.to_string());
    config
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
