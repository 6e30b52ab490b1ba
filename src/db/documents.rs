//! Keyed text/JSON documents.

use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;

use super::parse_db_timestamp;
use crate::error::{CinescribeError, Result};
use crate::export::write_document;
use crate::session::ProjectSession;

/// How a document's content is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Json,
    Text,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Text => "text",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "json" => Some(DocumentFormat::Json),
            "text" => Some(DocumentFormat::Text),
            _ => None,
        }
    }

    pub(crate) fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).ok_or_else(|| CinescribeError::InvalidFormat(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub key: String,
    pub format: DocumentFormat,
    pub content: String,
    pub updated_at: Option<NaiveDateTime>,
}

type DocumentRow = (i64, String, String, String, Option<String>);

fn read_row(row: &Row) -> rusqlite::Result<DocumentRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_document((id, key, format, content, updated_at): DocumentRow) -> Result<Document> {
    Ok(Document {
        id,
        key,
        format: DocumentFormat::parse(&format)?,
        content,
        updated_at: parse_db_timestamp(updated_at),
    })
}

pub struct DocumentRepository {
    session: ProjectSession,
}

impl DocumentRepository {
    pub fn new(session: &ProjectSession) -> Self {
        Self {
            session: session.clone(),
        }
    }

    /// Insert or fully replace the document under `key`; returns its id.
    pub fn upsert(&self, key: &str, format: DocumentFormat, content: &str) -> Result<i64> {
        let conn = self.session.connect()?;
        let id = conn.query_row(
            r#"
            INSERT INTO Documents (key, format, content)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                format = excluded.format,
                content = excluded.content,
                updated_at = datetime('now')
            RETURNING id
            "#,
            params![key, format.as_str(), content],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get(&self, key: &str) -> Result<Option<Document>> {
        let conn = self.session.connect()?;
        let row = conn
            .query_row(
                "SELECT id, key, format, content, updated_at FROM Documents WHERE key = ?1",
                [key],
                read_row,
            )
            .optional()?;
        row.map(into_document).transpose()
    }

    pub fn list(&self) -> Result<Vec<Document>> {
        let conn = self.session.connect()?;
        let mut stmt = conn
            .prepare("SELECT id, key, format, content, updated_at FROM Documents ORDER BY key ASC")?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(into_document).collect()
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute("DELETE FROM Documents WHERE key = ?1", [key])?;
        Ok(())
    }

    pub fn export_to_file(&self, key: &str, output_path: &Path) -> Result<()> {
        let document = self
            .get(key)?
            .ok_or_else(|| CinescribeError::not_found("Document", key))?;
        write_document(document.format, &document.content, output_path)
    }
}
