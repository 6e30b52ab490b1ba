//! Project data layer for pre-production film work.
//!
//! A project is a single SQLite store file holding project info, characters,
//! scenes and shots, final images, keyed documents and boards. Imported images
//! are copied next to it, addressed by content hash. A separate library store
//! indexes known projects for a picker.

pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod paths;
pub mod service;
pub mod session;

pub use assets::{AssetStore, ImportReport, ImportedAsset};
pub use config::Config;
pub use error::{CinescribeError, Result};
pub use paths::{
    project_directories, resolve_library_store_path, resolve_project_directories, ProjectDirs,
};
pub use service::{DocumentService, LibraryService};
pub use session::ProjectSession;
