use std::path::Path;

use crate::db::{self, migrate, LibraryEntry, LibraryProject, LibraryRepository};
use crate::error::Result;
use crate::paths::{absolutize, derive_title};
use crate::session::ProjectSession;

/// Registers, opens and finds projects through the library store.
pub struct LibraryService {
    repo: LibraryRepository,
}

impl LibraryService {
    pub fn new(repo: LibraryRepository) -> Self {
        Self { repo }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(LibraryRepository::open_default()?))
    }

    pub fn repository(&self) -> &LibraryRepository {
        &self.repo
    }

    /// Record a project store in the library, replacing any entry for the same path.
    ///
    /// The title defaults to the store's file name without extension.
    pub fn register_project(&self, path: &Path, title: Option<&str>, tags: &str) -> Result<i64> {
        let path = absolutize(path)?;
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| derive_title(&path));

        let db_version = if path.is_file() {
            let conn = db::open_connection(&path)?;
            Some(migrate::current_version(&conn)? as i64)
        } else {
            None
        };

        self.repo.upsert_project(&LibraryEntry {
            title,
            project_path: path.to_string_lossy().to_string(),
            tags: tags.to_string(),
            thumbnail: None,
            db_version,
        })
    }

    /// Create (or adopt) a project store and register it.
    pub fn create_project(&self, path: &Path, title: Option<&str>) -> Result<i64> {
        let path = absolutize(path)?;
        migrate::initialize_project_store(&path, title)?;
        let id = self.register_project(&path, title, "")?;
        tracing::info!(id, path = ?path, "Created project");
        Ok(id)
    }

    /// Open a project store, registering it if unknown, and stamp it as opened.
    pub fn open_project(&self, path: &Path) -> Result<ProjectSession> {
        let session = ProjectSession::open(path)?;
        let key = session.store_path().to_string_lossy().to_string();

        if self.repo.get(&key)?.is_none() {
            self.register_project(session.store_path(), None, "")?;
        }
        self.repo.mark_opened_now(&key)?;

        tracing::info!(path = %key, "Opened project");
        Ok(session)
    }

    pub fn search(&self, query: Option<&str>, include_archived: bool) -> Result<Vec<LibraryProject>> {
        self.repo.list_projects(query, include_archived)
    }

    pub fn archive(&self, path: &Path, archived: bool) -> Result<()> {
        self.repo.archive(&absolutize(path)?.to_string_lossy(), archived)
    }

    pub fn remove(&self, path: &Path) -> Result<()> {
        self.repo.remove(&absolutize(path)?.to_string_lossy())
    }
}
