//! Annual report plugin asset server.
//!
//! Serves the plugin's `build/` folder for local development and applies the
//! same response header policy the site uses.
//!
//! ```text
//!   report-assets serve --config report-assets.toml
//!       → config (load, validate, watch)
//!       → DevServer (/build/*, /assets/{hook}, /health)
//!       → header filters: base CSP → connect-src patch (local only)
//! ```

use std::path::PathBuf;

use axum::http::{header, HeaderMap, HeaderValue};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use report_assets::config::loader::load_or_default;
use report_assets::config::ConfigWatcher;
use report_assets::observability::logging;
use report_assets::security::csp::{ConnectSrcPatch, DevOrigins};
use report_assets::site::{AssetHook, AssetQueue, Environment, PluginAssets};
use report_assets::{DevServer, Shutdown};

#[derive(Parser)]
#[command(name = "report-assets")]
#[command(about = "Asset server and header policy tools for the annual report plugin", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve build artifacts with the development header policy
    Serve,
    /// Print a Content-Security-Policy value after the connect-src patch
    Patch {
        /// Environment type (local, development, staging, production)
        #[arg(short, long, default_value = "local")]
        env: String,
        /// Policy to patch
        #[arg(long)]
        csp: String,
    },
    /// Print the assets a hook enqueues as JSON
    Assets {
        /// Hook name, e.g. enqueue_block_editor_assets or editor
        #[arg(long)]
        hook: AssetHook,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    logging::init(&config.observability.log_level);

    match cli.command {
        Commands::Serve => {
            tracing::info!(
                bind_address = %config.server.bind_address,
                environment = %config.site.environment,
                plugin_path = ?config.site.plugin_path,
                "Configuration loaded"
            );

            let listener = TcpListener::bind(&config.server.bind_address).await?;

            // Keep the watcher alive for the lifetime of the server
            let (_watcher, config_updates) = match &cli.config {
                Some(path) => {
                    let (watcher, updates) = ConfigWatcher::new(path);
                    (Some(watcher.run()?), updates)
                }
                None => {
                    let (_tx, updates) = mpsc::unbounded_channel();
                    (None, updates)
                }
            };

            let shutdown = Shutdown::new();
            shutdown.trigger_on_ctrl_c();

            DevServer::new(config)
                .run(listener, config_updates, shutdown.subscribe())
                .await?;
            tracing::info!("Shutdown complete");
        }
        Commands::Patch { env, csp } => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_SECURITY_POLICY, HeaderValue::from_str(&csp)?);

            let origins = DevOrigins::new(config.dev.host.clone(), config.dev.ports.iter().copied());
            let headers = ConnectSrcPatch::new(origins).patch(headers, Environment::from_tag(&env));
            if let Some(value) = headers.get(header::CONTENT_SECURITY_POLICY) {
                println!("{}", value.to_str()?);
            }
        }
        Commands::Assets { hook } => {
            let assets = PluginAssets::new(config.build_paths());
            let queue = AssetQueue::for_hook(&assets, hook);
            println!("{}", serde_json::to_string_pretty(&queue)?);
        }
    }

    Ok(())
}
