//! Filesystem locations derived from a project store path.
//!
//! A project store `/films/noir.sqlite` keeps its imported files next to it:
//! ```text
//! /films/
//! ├── noir.sqlite
//! └── noir_assets/
//!     ├── <sha256>.png
//!     └── thumbnails/
//!         └── <sha256>_thumb.jpg
//! ```
//! Paths recorded in the store are relative to the store's directory, so a
//! project folder can be moved as a unit.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CinescribeError, Result};

/// Per-user application folder, under the home directory.
pub const APP_DIR_NAME: &str = ".cinescribe";

const LIBRARY_FILE_NAME: &str = "library.sqlite";
const THUMBNAILS_DIR_NAME: &str = "thumbnails";

/// Directories belonging to one project store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirs {
    /// Directory holding the store file; stored relative paths start here.
    pub project_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    assets_dir_name: String,
}

impl ProjectDirs {
    /// Compute the directories without touching the filesystem.
    pub fn for_store(store_path: &Path) -> Result<Self> {
        let store_path = absolutize(store_path)?;
        let stem = store_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CinescribeError::InvalidPath(store_path.display().to_string()))?;
        let project_dir = store_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| CinescribeError::InvalidPath(store_path.display().to_string()))?;

        let assets_dir_name = format!("{}_assets", stem);
        let assets_dir = project_dir.join(&assets_dir_name);
        let thumbnails_dir = assets_dir.join(THUMBNAILS_DIR_NAME);

        Ok(Self {
            project_dir,
            assets_dir,
            thumbnails_dir,
            assets_dir_name,
        })
    }

    /// Create both directories if absent.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.assets_dir)?;
        fs::create_dir_all(&self.thumbnails_dir)?;
        Ok(())
    }

    /// Store-relative path of an original copied into the assets directory.
    pub fn asset_relative(&self, file_name: &str) -> String {
        format!("{}/{}", self.assets_dir_name, file_name)
    }

    /// Store-relative path of a generated thumbnail.
    pub fn thumbnail_relative(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.assets_dir_name, THUMBNAILS_DIR_NAME, file_name)
    }

    /// Turn a stored relative path back into an absolute one.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.project_dir.clone(), |acc, part| acc.join(part))
    }
}

/// Compute and create the directories of a project store.
///
/// Safe to call repeatedly; existing directories are left alone.
pub fn project_directories(store_path: &Path) -> Result<ProjectDirs> {
    let dirs = ProjectDirs::for_store(store_path)?;
    dirs.ensure()?;
    Ok(dirs)
}

/// The asset and thumbnail directories of a project store, created if absent.
pub fn resolve_project_directories(store_path: &Path) -> Result<(PathBuf, PathBuf)> {
    let dirs = project_directories(store_path)?;
    Ok((dirs.assets_dir, dirs.thumbnails_dir))
}

/// `~/.cinescribe`, created if missing.
pub fn app_data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(CinescribeError::NoHomeDirectory)?;
    let app_dir = home.join(APP_DIR_NAME);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Location of the library store, creating its containing directory.
pub fn resolve_library_store_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join(LIBRARY_FILE_NAME))
}

pub(crate) fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Title used when none is given: the store's file name without extension.
pub fn derive_title(store_path: &Path) -> String {
    store_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_dirs_layout() {
        let dirs = ProjectDirs::for_store(Path::new("/films/noir.sqlite")).unwrap();
        assert_eq!(dirs.project_dir, PathBuf::from("/films"));
        assert_eq!(dirs.assets_dir, PathBuf::from("/films/noir_assets"));
        assert_eq!(dirs.thumbnails_dir, PathBuf::from("/films/noir_assets/thumbnails"));
        assert_eq!(dirs.asset_relative("abc.png"), "noir_assets/abc.png");
        assert_eq!(
            dirs.thumbnail_relative("abc_thumb.jpg"),
            "noir_assets/thumbnails/abc_thumb.jpg"
        );
        assert_eq!(
            dirs.resolve("noir_assets/thumbnails/abc_thumb.jpg"),
            PathBuf::from("/films/noir_assets/thumbnails/abc_thumb.jpg")
        );
    }

    #[test]
    fn test_resolve_creates_directories_idempotently() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("short.sqlite");

        let (assets, thumbs) = resolve_project_directories(&store).unwrap();
        assert!(assets.is_dir());
        assert!(thumbs.is_dir());
        assert_eq!(assets, dir.path().join("short_assets"));

        let again = resolve_project_directories(&store).unwrap();
        assert_eq!(again, (assets, thumbs));
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title(Path::new("/x/My Film.sqlite")), "My Film");
    }
}
