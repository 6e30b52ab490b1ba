mod patch;
mod schema;
pub mod assets;
pub mod boards;
pub mod characters;
pub mod documents;
pub mod final_images;
pub mod library;
pub mod migrate;
pub mod project;
pub mod scenes;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::path::Path;

use crate::error::Result;

pub use assets::{Asset, AssetRepository, NewAsset};
pub use boards::{Board, BoardKind, BoardRepository};
pub use characters::{Character, CharacterPatch, CharacterRepository};
pub use documents::{Document, DocumentFormat, DocumentRepository};
pub use final_images::{FinalImage, FinalImagePatch, FinalImageRepository};
pub use library::{LibraryEntry, LibraryProject, LibraryRepository};
pub use migrate::{ensure_schema_upgrades, initialize_project_store};
pub use project::{ProjectInfo, ProjectInfoPatch, ProjectRepository};
pub use scenes::{Scene, ScenePatch, SceneRepository, Shot, ShotPatch};
pub use schema::{LIBRARY_SCHEMA, PROJECT_SCHEMA};

/// Open a connection with foreign key enforcement (a per-connection setting).
pub fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

/// Parse a `datetime('now')` value as written by SQLite: "YYYY-MM-DD HH:MM:SS".
pub(crate) fn parse_db_timestamp(timestamp: Option<String>) -> Option<NaiveDateTime> {
    timestamp.and_then(|ts| NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S").ok())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_db_timestamp() {
        let parsed = parse_db_timestamp(Some("2024-03-15 09:30:00".to_string())).unwrap();
        assert_eq!(parsed.to_string(), "2024-03-15 09:30:00");
        assert!(parse_db_timestamp(Some("yesterday".to_string())).is_none());
        assert!(parse_db_timestamp(None).is_none());
    }
}
