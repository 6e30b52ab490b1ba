//! Rows of the `Assets` table. File handling lives in `crate::assets`.

use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use crate::error::Result;
use crate::session::ProjectSession;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Asset {
    pub id: i64,
    pub kind: String,
    pub original_path: Option<String>,
    /// Relative to the project directory.
    pub project_path: String,
    pub filename: String,
    pub ext: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_sec: Option<f64>,
    pub hash_sha256: String,
    pub tags: Option<String>,
    /// Relative to the project directory.
    pub thumbnail_path: Option<String>,
}

/// Values recorded for a newly imported image.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub original_path: Option<String>,
    pub project_path: String,
    pub thumbnail_path: Option<String>,
    pub filename: String,
    pub ext: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub hash_sha256: String,
}

const SELECT_ASSET: &str = r#"
    SELECT id, COALESCE(kind, 'image'), original_path, COALESCE(project_path, ''),
           COALESCE(filename, ''), COALESCE(ext, ''), width, height, duration_sec,
           COALESCE(hash_sha256, ''), tags, thumbnail_path
    FROM Assets
"#;

fn row_to_asset(row: &Row) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        kind: row.get(1)?,
        original_path: row.get(2)?,
        project_path: row.get(3)?,
        filename: row.get(4)?,
        ext: row.get(5)?,
        width: row.get(6)?,
        height: row.get(7)?,
        duration_sec: row.get(8)?,
        hash_sha256: row.get(9)?,
        tags: row.get(10)?,
        thumbnail_path: row.get(11)?,
    })
}

pub struct AssetRepository {
    session: ProjectSession,
}

impl AssetRepository {
    pub fn new(session: &ProjectSession) -> Self {
        Self {
            session: session.clone(),
        }
    }

    pub fn get(&self, id: i64) -> Result<Option<Asset>> {
        let conn = self.session.connect()?;
        let asset = conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_ASSET), [id], row_to_asset)
            .optional()?;
        Ok(asset)
    }

    pub fn get_by_hash(&self, sha256: &str) -> Result<Option<Asset>> {
        let conn = self.session.connect()?;
        let asset = conn
            .query_row(
                &format!("{} WHERE hash_sha256 = ?1", SELECT_ASSET),
                [sha256],
                row_to_asset,
            )
            .optional()?;
        Ok(asset)
    }

    /// Image assets, newest first; a non-empty query matches tags or filename.
    pub fn search(&self, query: &str) -> Result<Vec<Asset>> {
        let conn = self.session.connect()?;
        let query = query.trim();
        let assets = if query.is_empty() {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE kind = 'image' ORDER BY id DESC",
                SELECT_ASSET
            ))?;
            let rows = stmt
                .query_map([], row_to_asset)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        } else {
            let like = format!("%{}%", query);
            let mut stmt = conn.prepare(&format!(
                "{} WHERE kind = 'image' AND (tags LIKE ?1 OR filename LIKE ?1) ORDER BY id DESC",
                SELECT_ASSET
            ))?;
            let rows = stmt
                .query_map([like], row_to_asset)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        Ok(assets)
    }

    pub fn insert_image(&self, asset: &NewAsset) -> Result<i64> {
        let conn = self.session.connect()?;
        conn.execute(
            r#"
            INSERT INTO Assets (kind, original_path, project_path, filename, ext, width, height,
                                duration_sec, hash_sha256, tags, thumbnail_path)
            VALUES ('image', ?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, NULL, ?8)
            "#,
            params![
                asset.original_path,
                asset.project_path,
                asset.filename,
                asset.ext,
                asset.width,
                asset.height,
                asset.hash_sha256,
                asset.thumbnail_path,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a thumbnail generated after the row was first written.
    pub fn set_thumbnail_path(&self, id: i64, thumbnail_path: &str) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute(
            "UPDATE Assets SET thumbnail_path = ?1 WHERE id = ?2",
            params![thumbnail_path, id],
        )?;
        Ok(())
    }

    pub fn update_tags(&self, id: i64, tags: &str) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute("UPDATE Assets SET tags = ?1 WHERE id = ?2", params![tags, id])?;
        Ok(())
    }

    /// Whether a character or shot links to the asset. Final images are not counted.
    pub fn is_referenced(&self, id: i64) -> Result<bool> {
        let conn = self.session.connect()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT (SELECT COUNT(*) FROM Characters WHERE image_asset_id = ?1)
                 + (SELECT COUNT(*) FROM Shots WHERE storyboard_asset_id = ?1)
            "#,
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Remove the row only; the stored files stay on disk.
    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute("DELETE FROM Assets WHERE id = ?1", [id])?;
        Ok(())
    }
}
