//! The library store: one row per known project, keyed by its store path.

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::schema::LIBRARY_SCHEMA;
use super::{open_connection, parse_db_timestamp};
use crate::error::Result;
use crate::paths;

const LIBRARY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, Default, Serialize)]
pub struct LibraryProject {
    pub id: i64,
    pub title: String,
    /// Absolute path of the project's store file.
    pub project_path: String,
    pub tags: String,
    pub thumbnail: Option<String>,
    pub last_opened_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub db_version: Option<i64>,
    pub archived: bool,
}

/// Fields written by [`LibraryRepository::upsert_project`].
#[derive(Debug, Clone, Default)]
pub struct LibraryEntry {
    pub title: String,
    pub project_path: String,
    pub tags: String,
    pub thumbnail: Option<String>,
    pub db_version: Option<i64>,
}

const PROJECT_COLUMNS: &str = "id, title, project_path, COALESCE(tags, ''), thumbnail, \
     last_opened_at, created_at, db_version, COALESCE(archived, 0)";

fn parse_library_timestamp(ts: Option<String>) -> Option<NaiveDateTime> {
    let ts = ts?;
    NaiveDateTime::parse_from_str(&ts, LIBRARY_TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| parse_db_timestamp(Some(ts)))
}

fn row_to_project(row: &Row) -> rusqlite::Result<LibraryProject> {
    Ok(LibraryProject {
        id: row.get(0)?,
        title: row.get(1)?,
        project_path: row.get(2)?,
        tags: row.get(3)?,
        thumbnail: row.get(4)?,
        last_opened_at: parse_library_timestamp(row.get(5)?),
        created_at: parse_library_timestamp(row.get(6)?),
        db_version: row.get(7)?,
        archived: row.get::<_, i64>(8)? != 0,
    })
}

pub struct LibraryRepository {
    path: PathBuf,
}

impl LibraryRepository {
    /// Open (creating if needed) the library store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = open_connection(path)?;
        conn.execute_batch(LIBRARY_SCHEMA)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Open the library store under the per-user application folder.
    pub fn open_default() -> Result<Self> {
        Self::open(&paths::resolve_library_store_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        open_connection(&self.path)
    }

    /// Insert a project or overwrite the entry already registered for its path.
    pub fn upsert_project(&self, entry: &LibraryEntry) -> Result<i64> {
        let conn = self.connect()?;
        let id = conn.query_row(
            r#"
            INSERT INTO projects (title, project_path, tags, thumbnail, db_version)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(project_path) DO UPDATE SET
                title = excluded.title,
                tags = excluded.tags,
                thumbnail = excluded.thumbnail,
                db_version = excluded.db_version
            RETURNING id
            "#,
            params![
                entry.title,
                entry.project_path,
                entry.tags,
                entry.thumbnail,
                entry.db_version
            ],
            |row| row.get(0),
        )?;
        tracing::debug!(id, path = %entry.project_path, "Registered project");
        Ok(id)
    }

    pub fn get(&self, project_path: &str) -> Result<Option<LibraryProject>> {
        let conn = self.connect()?;
        let project = conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE project_path = ?1", PROJECT_COLUMNS),
                [project_path],
                row_to_project,
            )
            .optional()?;
        Ok(project)
    }

    /// Projects matching `query` in title or tags, most recently opened first.
    ///
    /// Never-opened projects come last, newest registration first.
    pub fn list_projects(&self, query: Option<&str>, include_archived: bool) -> Result<Vec<LibraryProject>> {
        let conn = self.connect()?;

        let mut sql = format!("SELECT {} FROM projects WHERE 1 = 1", PROJECT_COLUMNS);
        if !include_archived {
            sql.push_str(" AND COALESCE(archived, 0) = 0");
        }
        let pattern = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));
        if pattern.is_some() {
            sql.push_str(" AND (title LIKE ?1 OR tags LIKE ?1)");
        }
        sql.push_str(
            " ORDER BY (last_opened_at IS NULL), last_opened_at DESC, created_at DESC, id DESC",
        );

        let mut stmt = conn.prepare(&sql)?;
        let projects = match pattern {
            Some(pattern) => stmt
                .query_map([pattern], row_to_project)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], row_to_project)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(projects)
    }

    pub fn archive(&self, project_path: &str, archived: bool) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE projects SET archived = ?1 WHERE project_path = ?2",
            params![archived as i64, project_path],
        )?;
        Ok(())
    }

    /// Forget a project. The store file itself is left alone.
    pub fn remove(&self, project_path: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM projects WHERE project_path = ?1", [project_path])?;
        Ok(())
    }

    pub fn mark_opened_now(&self, project_path: &str) -> Result<()> {
        let now = Utc::now().naive_utc().format(LIBRARY_TIMESTAMP_FORMAT).to_string();
        let conn = self.connect()?;
        conn.execute(
            "UPDATE projects SET last_opened_at = ?1 WHERE project_path = ?2",
            params![now, project_path],
        )?;
        Ok(())
    }

    pub fn update_tags(&self, project_path: &str, tags: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE projects SET tags = ?1 WHERE project_path = ?2",
            params![tags, project_path],
        )?;
        Ok(())
    }

    pub fn set_thumbnail(&self, project_path: &str, thumbnail: Option<&str>) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE projects SET thumbnail = ?1 WHERE project_path = ?2",
            params![thumbnail, project_path],
        )?;
        Ok(())
    }
}
