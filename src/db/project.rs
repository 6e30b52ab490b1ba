//! The singleton `Project_Info` row.

use rusqlite::OptionalExtension;
use serde::Serialize;

use super::patch::UpdateBuilder;
use crate::error::{CinescribeError, Result};
use crate::session::ProjectSession;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProjectInfo {
    pub id: i64,
    pub title: String,
    pub logline: String,
    pub synopsis: String,
    pub intent: String,
    pub review_notes: String,
    /// Comma-separated.
    pub tags: String,
}

impl ProjectInfo {
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }
}

/// Split a comma-separated tag string, dropping blanks.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fields to change; `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct ProjectInfoPatch {
    pub title: Option<String>,
    pub logline: Option<String>,
    pub synopsis: Option<String>,
    pub intent: Option<String>,
    pub review_notes: Option<String>,
    pub tags: Option<String>,
}

pub struct ProjectRepository {
    session: ProjectSession,
}

impl ProjectRepository {
    pub fn new(session: &ProjectSession) -> Self {
        Self {
            session: session.clone(),
        }
    }

    pub fn get_info(&self) -> Result<Option<ProjectInfo>> {
        let conn = self.session.connect()?;
        let info = conn
            .query_row(
                r#"
                SELECT id, COALESCE(title, ''), COALESCE(logline, ''), COALESCE(synopsis, ''),
                       COALESCE(intent, ''), COALESCE(review_notes, ''), COALESCE(tags, '')
                FROM Project_Info
                WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(ProjectInfo {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        logline: row.get(2)?,
                        synopsis: row.get(3)?,
                        intent: row.get(4)?,
                        review_notes: row.get(5)?,
                        tags: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }

    pub fn update_title(&self, title: &str) -> Result<()> {
        self.update(ProjectInfoPatch {
            title: Some(title.to_string()),
            ..Default::default()
        })
    }

    pub fn update_tags(&self, tags: &str) -> Result<()> {
        self.update(ProjectInfoPatch {
            tags: Some(tags.to_string()),
            ..Default::default()
        })
    }

    pub fn update(&self, patch: ProjectInfoPatch) -> Result<()> {
        let builder = UpdateBuilder::new("Project_Info")
            .set_opt("title", patch.title)
            .set_opt("logline", patch.logline)
            .set_opt("synopsis", patch.synopsis)
            .set_opt("intent", patch.intent)
            .set_opt("review_notes", patch.review_notes)
            .set_opt("tags", patch.tags)
            .touch("updated_at");
        if builder.is_empty() {
            return Ok(());
        }

        let conn = self.session.connect()?;
        if builder.execute(&conn, 1)? == 0 {
            return Err(CinescribeError::not_found("Project info", 1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::new_session;
    use tempfile::tempdir;

    #[test]
    fn test_get_and_update() {
        let (_dir, session) = new_session();
        let repo = ProjectRepository::new(&session);

        let info = repo.get_info().unwrap().unwrap();
        assert_eq!(info.id, 1);
        assert_eq!(info.title, "Test");
        assert_eq!(info.tags, "");

        repo.update(ProjectInfoPatch {
            logline: Some("A lighthouse keeper finds a signal".to_string()),
            ..Default::default()
        })
        .unwrap();
        repo.update_tags("sci-fi, short ,").unwrap();

        let info = repo.get_info().unwrap().unwrap();
        assert_eq!(info.title, "Test");
        assert_eq!(info.logline, "A lighthouse keeper finds a signal");
        assert_eq!(info.tag_list(), vec!["sci-fi", "short"]);
    }

    #[test]
    fn test_store_without_tags_column() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("legacy.sqlite");
        {
            let conn = rusqlite::Connection::open(&store).unwrap();
            conn.execute_batch(
                "CREATE TABLE Project_Info (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    title TEXT NOT NULL,
                    logline TEXT DEFAULT '',
                    synopsis TEXT DEFAULT '',
                    intent TEXT DEFAULT '',
                    review_notes TEXT DEFAULT '',
                    created_at TEXT DEFAULT (datetime('now')),
                    updated_at TEXT
                 );
                 INSERT INTO Project_Info (id, title, logline) VALUES (1, 'Legacy', 'Old logline');",
            )
            .unwrap();
        }

        let session = ProjectSession::open(&store).unwrap();
        let info = ProjectRepository::new(&session).get_info().unwrap().unwrap();
        assert_eq!(info.title, "Legacy");
        assert_eq!(info.logline, "Old logline");
        assert_eq!(info.tags, "");
    }
}
