//! Plugin build artifacts and the hooks that enqueue them.
//!
//! # Responsibilities
//! - Derive public URIs and filesystem paths inside the plugin's `build/` folder
//! - Enqueue editor, frontend and shared assets for the matching host event
//! - Version stylesheets by file modification time
//!
//! # Design Decisions
//! - The host's registration API is a trait (`AssetEnqueuer`); manifest
//!   interpretation stays on the host side
//! - A missing stylesheet is logged and enqueued without a version, never fatal

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

pub const EDITOR_HANDLE: &str = "annual-report-plugin-editor";
pub const FRONTEND_HANDLE: &str = "annual-report-plugin-frontend";

/// Every stylesheet builds on the host's icon font.
pub const STYLE_DEPENDENCIES: &[&str] = &["dashicons"];

const BUILD_DIR: &str = "build";

/// Locations of the plugin on disk and on the web.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    plugin_path: PathBuf,
    plugin_url: String,
}

impl BuildPaths {
    pub fn new(plugin_path: impl Into<PathBuf>, plugin_url: impl Into<String>) -> Self {
        Self {
            plugin_path: plugin_path.into(),
            plugin_url: plugin_url.into(),
        }
    }

    /// Public URI of a file in `build/`.
    pub fn build_file_uri(&self, relative: &str) -> String {
        format!(
            "{}/{}/{}",
            self.plugin_url.trim_end_matches('/'),
            BUILD_DIR,
            relative.trim_start_matches('/')
        )
    }

    /// Filesystem path of a file in `build/`; the folder itself for `""`.
    pub fn build_file_path(&self, relative: &str) -> PathBuf {
        let dir = self.plugin_path.join(BUILD_DIR);
        if relative.is_empty() {
            dir
        } else {
            dir.join(relative.trim_start_matches('/'))
        }
    }
}

/// Host-side script and style registration.
pub trait AssetEnqueuer {
    /// Enqueue a script whose dependencies and version live in a build manifest.
    fn enqueue_script_asset(&mut self, handle: &str, manifest_path: &Path, src: &str);

    fn enqueue_style(&mut self, handle: &str, src: &str, deps: &[&str], version: Option<u64>);
}

/// Host events at which assets are enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetHook {
    /// Block editor only.
    BlockEditorAssets,
    /// Block editor and frontend.
    BlockAssets,
    /// Frontend only.
    FrontendScripts,
}

impl AssetHook {
    pub const ALL: [AssetHook; 3] = [
        AssetHook::BlockEditorAssets,
        AssetHook::BlockAssets,
        AssetHook::FrontendScripts,
    ];

    /// The host's event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            AssetHook::BlockEditorAssets => "enqueue_block_editor_assets",
            AssetHook::BlockAssets => "enqueue_block_assets",
            AssetHook::FrontendScripts => "wp_enqueue_scripts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset hook: {0}")]
pub struct UnknownHook(pub String);

impl FromStr for AssetHook {
    type Err = UnknownHook;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enqueue_block_editor_assets" | "editor" => Ok(AssetHook::BlockEditorAssets),
            "enqueue_block_assets" | "block" => Ok(AssetHook::BlockAssets),
            "wp_enqueue_scripts" | "frontend" => Ok(AssetHook::FrontendScripts),
            other => Err(UnknownHook(other.to_string())),
        }
    }
}

impl fmt::Display for AssetHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// The plugin's asset hooks.
#[derive(Debug, Clone)]
pub struct PluginAssets {
    paths: BuildPaths,
}

impl PluginAssets {
    pub fn new(paths: BuildPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &BuildPaths {
        &self.paths
    }

    /// Run the handler registered for `hook`.
    pub fn dispatch(&self, hook: AssetHook, host: &mut dyn AssetEnqueuer) {
        tracing::debug!(hook = %hook, "Enqueueing plugin assets");
        match hook {
            AssetHook::BlockEditorAssets => self.enqueue_editor_assets(host),
            AssetHook::BlockAssets => self.enqueue_frontend_styles(host),
            AssetHook::FrontendScripts => self.enqueue_frontend_scripts(host),
        }
    }

    /// Editor script and stylesheet.
    pub fn enqueue_editor_assets(&self, host: &mut dyn AssetEnqueuer) {
        host.enqueue_script_asset(
            EDITOR_HANDLE,
            &self.paths.build_file_path("editor.asset.php"),
            &self.paths.build_file_uri("editor.js"),
        );
        self.enqueue_versioned_style(host, EDITOR_HANDLE, "editor.css");
    }

    pub fn enqueue_frontend_scripts(&self, host: &mut dyn AssetEnqueuer) {
        host.enqueue_script_asset(
            FRONTEND_HANDLE,
            &self.paths.build_file_path("frontend.asset.php"),
            &self.paths.build_file_uri("frontend.js"),
        );
    }

    /// Shared by the editor and the frontend.
    pub fn enqueue_frontend_styles(&self, host: &mut dyn AssetEnqueuer) {
        self.enqueue_versioned_style(host, FRONTEND_HANDLE, "frontend.css");
    }

    fn enqueue_versioned_style(&self, host: &mut dyn AssetEnqueuer, handle: &str, file: &str) {
        let version = file_version(&self.paths.build_file_path(file));
        host.enqueue_style(handle, &self.paths.build_file_uri(file), STYLE_DEPENDENCIES, version);
    }
}

/// Modification time in whole seconds since the Unix epoch.
pub fn file_version(path: &Path) -> Option<u64> {
    let modified = fs::metadata(path).and_then(|m| m.modified());
    match modified {
        Ok(time) => time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs()),
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Cannot read asset modification time");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueuedScript {
    pub handle: String,
    pub src: String,
    pub manifest: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueuedStyle {
    pub handle: String,
    pub src: String,
    pub deps: Vec<String>,
    pub version: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EnqueuedAsset {
    Script(EnqueuedScript),
    Style(EnqueuedStyle),
}

/// Records enqueued assets in order; used by the dev server and the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQueue {
    pub assets: Vec<EnqueuedAsset>,
}

impl AssetQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue produced by a single hook.
    pub fn for_hook(assets: &PluginAssets, hook: AssetHook) -> Self {
        let mut queue = Self::new();
        assets.dispatch(hook, &mut queue);
        queue
    }

    pub fn handles(&self) -> Vec<&str> {
        self.assets
            .iter()
            .map(|a| match a {
                EnqueuedAsset::Script(s) => s.handle.as_str(),
                EnqueuedAsset::Style(s) => s.handle.as_str(),
            })
            .collect()
    }
}

impl AssetEnqueuer for AssetQueue {
    fn enqueue_script_asset(&mut self, handle: &str, manifest_path: &Path, src: &str) {
        self.assets.push(EnqueuedAsset::Script(EnqueuedScript {
            handle: handle.to_string(),
            src: src.to_string(),
            manifest: manifest_path.to_path_buf(),
        }));
    }

    fn enqueue_style(&mut self, handle: &str, src: &str, deps: &[&str], version: Option<u64>) {
        self.assets.push(EnqueuedAsset::Style(EnqueuedStyle {
            handle: handle.to_string(),
            src: src.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            version,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn paths(root: &Path) -> BuildPaths {
        BuildPaths::new(root, "https://example.org/wp-content/plugins/annual-report/")
    }

    #[test]
    fn test_build_file_uri() {
        let paths = paths(Path::new("/srv/plugin"));
        assert_eq!(
            paths.build_file_uri("editor.js"),
            "https://example.org/wp-content/plugins/annual-report/build/editor.js"
        );

        let bare = BuildPaths::new("/srv/plugin", "http://localhost:8887");
        assert_eq!(bare.build_file_uri("/frontend.css"), "http://localhost:8887/build/frontend.css");
    }

    #[test]
    fn test_build_file_path() {
        let paths = paths(Path::new("/srv/plugin"));
        assert_eq!(paths.build_file_path("editor.asset.php"), PathBuf::from("/srv/plugin/build/editor.asset.php"));
        assert_eq!(paths.build_file_path(""), PathBuf::from("/srv/plugin/build"));
    }

    #[test]
    fn test_hook_names() {
        for hook in AssetHook::ALL {
            assert_eq!(hook.event_name().parse::<AssetHook>().unwrap(), hook);
        }
        assert_eq!("editor".parse::<AssetHook>().unwrap(), AssetHook::BlockEditorAssets);
        assert_eq!("frontend".parse::<AssetHook>().unwrap(), AssetHook::FrontendScripts);
        assert_eq!("admin_init".parse::<AssetHook>(), Err(UnknownHook("admin_init".into())));
    }

    #[test]
    fn test_editor_hook_enqueues_script_then_style() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("build")).unwrap();
        let css = File::create(dir.path().join("build/editor.css")).unwrap();
        css.set_modified(UNIX_EPOCH + Duration::from_secs(1_700_000_000)).unwrap();

        let assets = PluginAssets::new(paths(dir.path()));
        let queue = AssetQueue::for_hook(&assets, AssetHook::BlockEditorAssets);

        assert_eq!(
            queue.assets,
            vec![
                EnqueuedAsset::Script(EnqueuedScript {
                    handle: EDITOR_HANDLE.into(),
                    src: "https://example.org/wp-content/plugins/annual-report/build/editor.js".into(),
                    manifest: dir.path().join("build/editor.asset.php"),
                }),
                EnqueuedAsset::Style(EnqueuedStyle {
                    handle: EDITOR_HANDLE.into(),
                    src: "https://example.org/wp-content/plugins/annual-report/build/editor.css".into(),
                    deps: vec!["dashicons".into()],
                    version: Some(1_700_000_000),
                }),
            ]
        );
    }

    #[test]
    fn test_frontend_hooks() {
        let dir = tempfile::tempdir().unwrap();
        let assets = PluginAssets::new(paths(dir.path()));

        let scripts = AssetQueue::for_hook(&assets, AssetHook::FrontendScripts);
        assert_eq!(scripts.handles(), vec![FRONTEND_HANDLE]);
        assert!(matches!(&scripts.assets[0], EnqueuedAsset::Script(s) if s.src.ends_with("/build/frontend.js")));

        // Missing stylesheet: enqueued without a version
        let styles = AssetQueue::for_hook(&assets, AssetHook::BlockAssets);
        match &styles.assets[..] {
            [EnqueuedAsset::Style(style)] => {
                assert_eq!(style.handle, FRONTEND_HANDLE);
                assert_eq!(style.version, None);
            }
            other => panic!("unexpected queue: {:?}", other),
        }
    }

    #[test]
    fn test_queue_serializes_with_kind_tag() {
        let mut queue = AssetQueue::new();
        queue.enqueue_style("h", "/build/a.css", &["dashicons"], Some(7));
        let json = serde_json::to_value(&queue).unwrap();
        assert_eq!(json["assets"][0]["kind"], "style");
        assert_eq!(json["assets"][0]["version"], 7);
    }
}
