//! An opened project: the store path and its derived directories.
//!
//! Repositories and the asset store are built from a session instead of
//! reading a process-wide "current project".

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::db::{self, migrate};
use crate::error::{CinescribeError, Result};
use crate::paths::{absolutize, project_directories, ProjectDirs};

#[derive(Debug, Clone)]
pub struct ProjectSession {
    store_path: PathBuf,
    dirs: ProjectDirs,
}

impl ProjectSession {
    /// Open an existing project store, bringing its schema up to date.
    pub fn open(store_path: &Path) -> Result<Self> {
        let store_path = absolutize(store_path)?;
        if !store_path.is_file() {
            return Err(CinescribeError::not_found(
                "Project store",
                store_path.display(),
            ));
        }

        let dirs = project_directories(&store_path)?;

        let conn = db::open_connection(&store_path)?;
        migrate::ensure_schema_upgrades(&conn)?;

        tracing::debug!(path = ?store_path, "Opened project session");
        Ok(Self { store_path, dirs })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn dirs(&self) -> &ProjectDirs {
        &self.dirs
    }

    /// A fresh connection; dropped (and closed) by the caller when done.
    pub fn connect(&self) -> Result<Connection> {
        db::open_connection(&self.store_path)
    }
}
