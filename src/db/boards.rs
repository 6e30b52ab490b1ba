//! Single-row boards (audio and cinematic notes), pinned to id 1.

use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::path::Path;

use super::documents::DocumentFormat;
use super::parse_db_timestamp;
use crate::error::{CinescribeError, Result};
use crate::export::write_document;
use crate::session::ProjectSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoardKind {
    Audio,
    Cinematic,
}

impl BoardKind {
    fn table(&self) -> &'static str {
        match self {
            BoardKind::Audio => "AudioBoard",
            BoardKind::Cinematic => "CinematicBoard",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BoardKind::Audio => "Audio board",
            BoardKind::Cinematic => "Cinematic board",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub kind: BoardKind,
    pub format: DocumentFormat,
    pub content: String,
    pub updated_at: Option<NaiveDateTime>,
}

pub struct BoardRepository {
    session: ProjectSession,
    kind: BoardKind,
}

impl BoardRepository {
    pub fn new(session: &ProjectSession, kind: BoardKind) -> Self {
        Self {
            session: session.clone(),
            kind,
        }
    }

    pub fn get(&self) -> Result<Option<Board>> {
        let conn = self.session.connect()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT format, content, updated_at FROM {} WHERE id = 1",
                    self.kind.table()
                ),
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(format, content, updated_at)| {
            Ok(Board {
                kind: self.kind,
                format: DocumentFormat::parse(&format)?,
                content,
                updated_at: parse_db_timestamp(updated_at),
            })
        })
        .transpose()
    }

    /// Replace the board's content and refresh its timestamp.
    pub fn upsert(&self, format: DocumentFormat, content: &str) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute(
            &format!(
                r#"
                INSERT INTO {} (id, format, content)
                VALUES (1, ?1, ?2)
                ON CONFLICT(id) DO UPDATE SET
                    format = excluded.format,
                    content = excluded.content,
                    updated_at = datetime('now')
                "#,
                self.kind.table()
            ),
            params![format.as_str(), content],
        )?;
        Ok(())
    }

    pub fn export_to_file(&self, output_path: &Path) -> Result<()> {
        let board = self
            .get()?
            .ok_or_else(|| CinescribeError::not_found("Board", self.kind.display_name()))?;
        write_document(board.format, &board.content, output_path)
    }
}
