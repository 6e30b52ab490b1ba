use rusqlite::{params, Row};
use serde::Serialize;

use super::patch::{assign_sort_order, UpdateBuilder};
use crate::error::{CinescribeError, Result};
use crate::session::ProjectSession;

/// A finished still belonging to a scene.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalImage {
    pub id: i64,
    pub scene_id: i64,
    pub description: String,
    pub asset_id: Option<i64>,
    pub sort_index: Option<i64>,
    pub asset_project_path: Option<String>,
    pub asset_thumbnail_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FinalImagePatch {
    pub description: Option<String>,
}

fn row_to_image(row: &Row) -> rusqlite::Result<FinalImage> {
    Ok(FinalImage {
        id: row.get(0)?,
        scene_id: row.get(1)?,
        description: row.get(2)?,
        asset_id: row.get(3)?,
        sort_index: row.get(4)?,
        asset_project_path: row.get(5)?,
        asset_thumbnail_path: row.get(6)?,
    })
}

pub struct FinalImageRepository {
    session: ProjectSession,
}

impl FinalImageRepository {
    pub fn new(session: &ProjectSession) -> Self {
        Self {
            session: session.clone(),
        }
    }

    pub fn list_images(&self, scene_id: i64) -> Result<Vec<FinalImage>> {
        let conn = self.session.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT f.id, f.scene_id, COALESCE(f.description, ''), f.asset_id, f.sort_index,
                   a.project_path, a.thumbnail_path
            FROM FinalImages f
            LEFT JOIN Assets a ON a.id = f.asset_id
            WHERE f.scene_id = ?1
            ORDER BY f.sort_index ASC, f.id ASC
            "#,
        )?;
        let images = stmt
            .query_map([scene_id], row_to_image)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(images)
    }

    pub fn create_image(&self, scene_id: i64, description: &str, asset_id: Option<i64>) -> Result<i64> {
        let conn = self.session.connect()?;
        conn.execute(
            r#"
            INSERT INTO FinalImages (scene_id, description, asset_id, sort_index)
            VALUES (?1, ?2, ?3,
                    (SELECT COALESCE(MAX(sort_index), 0) + 1 FROM FinalImages WHERE scene_id = ?1))
            "#,
            params![scene_id, description, asset_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn link_image_asset(&self, id: i64, asset_id: Option<i64>) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute(
            "UPDATE FinalImages SET asset_id = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![asset_id, id],
        )?;
        Ok(())
    }

    pub fn update_image(&self, id: i64, patch: FinalImagePatch) -> Result<()> {
        let builder = UpdateBuilder::new("FinalImages")
            .set_opt("description", patch.description)
            .touch("updated_at");
        if builder.is_empty() {
            return Ok(());
        }

        let conn = self.session.connect()?;
        if builder.execute(&conn, id)? == 0 {
            return Err(CinescribeError::not_found("Final image", id));
        }
        Ok(())
    }

    pub fn delete_image(&self, id: i64) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute("DELETE FROM FinalImages WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn reorder_images(&self, scene_id: i64, ordered_ids: &[i64]) -> Result<()> {
        let conn = self.session.connect()?;
        assign_sort_order(&conn, "FinalImages", Some(("scene_id", scene_id)), ordered_ids)
    }
}
