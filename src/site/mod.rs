//! Site integration subsystem.
//!
//! # Data Flow
//! ```text
//! config [site] section
//!     → environment.rs (classification passed to header filters)
//!     → assets.rs (build paths, hook → enqueued scripts/styles)
//! ```

pub mod assets;
pub mod environment;

pub use assets::{AssetHook, AssetQueue, BuildPaths, PluginAssets};
pub use environment::Environment;
