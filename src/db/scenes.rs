//! Scenes and the shots they own.
//!
//! Both are ordered by `(sort_index, id)`. Deleting a scene deletes its shots
//! (and final images) through `ON DELETE CASCADE`.

use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::patch::{assign_sort_order, UpdateBuilder};
use crate::error::{CinescribeError, Result};
use crate::session::ProjectSession;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Scene {
    pub id: i64,
    pub number: i64,
    pub name: String,
    pub location: Option<String>,
    pub time_of_day: Option<String>,
    pub notes: String,
    pub sort_index: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ScenePatch {
    pub number: Option<i64>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub time_of_day: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Shot {
    pub id: i64,
    pub scene_id: i64,
    pub code: String,
    pub description: String,
    pub shot_type: Option<String>,
    pub angle: Option<String>,
    pub movement: Option<String>,
    pub lens: Option<String>,
    pub lighting: Option<String>,
    pub image_prompt: Option<String>,
    pub video_prompt: Option<String>,
    pub duration_sec: Option<f64>,
    pub storyboard_asset_id: Option<i64>,
    pub sort_index: Option<i64>,
    /// Paths of the linked storyboard asset, relative to the project directory.
    pub asset_project_path: Option<String>,
    pub asset_thumbnail_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ShotPatch {
    pub code: Option<String>,
    pub description: Option<String>,
    pub shot_type: Option<String>,
    pub angle: Option<String>,
    pub movement: Option<String>,
    pub lens: Option<String>,
    pub lighting: Option<String>,
    pub image_prompt: Option<String>,
    pub video_prompt: Option<String>,
    pub duration_sec: Option<f64>,
}

const SELECT_SCENE: &str = r#"
    SELECT id, COALESCE(number, id), COALESCE(name, ''), location, time_of_day,
           COALESCE(summary, ''), sort_index
    FROM Scenes
"#;

const SELECT_SHOT: &str = r#"
    SELECT s.id, s.scene_id, COALESCE(s.code, ''), COALESCE(s.description, ''),
           s.shot_type, s.angle, s.movement, s.lens, s.lighting,
           s.image_prompt, s.video_prompt, s.duration_sec,
           s.storyboard_asset_id, s.sort_index,
           a.project_path, a.thumbnail_path
    FROM Shots s
    LEFT JOIN Assets a ON a.id = s.storyboard_asset_id
"#;

fn row_to_scene(row: &Row) -> rusqlite::Result<Scene> {
    Ok(Scene {
        id: row.get(0)?,
        number: row.get(1)?,
        name: row.get(2)?,
        location: row.get(3)?,
        time_of_day: row.get(4)?,
        notes: row.get(5)?,
        sort_index: row.get(6)?,
    })
}

fn row_to_shot(row: &Row) -> rusqlite::Result<Shot> {
    Ok(Shot {
        id: row.get(0)?,
        scene_id: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        shot_type: row.get(4)?,
        angle: row.get(5)?,
        movement: row.get(6)?,
        lens: row.get(7)?,
        lighting: row.get(8)?,
        image_prompt: row.get(9)?,
        video_prompt: row.get(10)?,
        duration_sec: row.get(11)?,
        storyboard_asset_id: row.get(12)?,
        sort_index: row.get(13)?,
        asset_project_path: row.get(14)?,
        asset_thumbnail_path: row.get(15)?,
    })
}

pub struct SceneRepository {
    session: ProjectSession,
}

impl SceneRepository {
    pub fn new(session: &ProjectSession) -> Self {
        Self {
            session: session.clone(),
        }
    }

    // ========================================================================
    // Scenes
    // ========================================================================

    pub fn list_scenes(&self) -> Result<Vec<Scene>> {
        let conn = self.session.connect()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY sort_index ASC, id ASC", SELECT_SCENE))?;
        let scenes = stmt
            .query_map([], row_to_scene)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(scenes)
    }

    pub fn get_scene(&self, id: i64) -> Result<Option<Scene>> {
        let conn = self.session.connect()?;
        let scene = conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_SCENE), [id], row_to_scene)
            .optional()?;
        Ok(scene)
    }

    /// Create a scene at the end of the sequence.
    pub fn create_scene(
        &self,
        number: Option<i64>,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> Result<i64> {
        let conn = self.session.connect()?;
        conn.execute(
            r#"
            INSERT INTO Scenes (number, name, summary, sort_index)
            VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(sort_index), 0) + 1 FROM Scenes))
            "#,
            params![number, name, notes],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_scene(&self, id: i64, patch: ScenePatch) -> Result<()> {
        let builder = UpdateBuilder::new("Scenes")
            .set_opt("number", patch.number)
            .set_opt("name", patch.name)
            .set_opt("location", patch.location)
            .set_opt("time_of_day", patch.time_of_day)
            .set_opt("summary", patch.notes)
            .touch("updated_at");
        if builder.is_empty() {
            return Ok(());
        }

        let conn = self.session.connect()?;
        if builder.execute(&conn, id)? == 0 {
            return Err(CinescribeError::not_found("Scene", id));
        }
        Ok(())
    }

    /// Delete a scene together with its shots and final images.
    pub fn delete_scene(&self, id: i64) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute("DELETE FROM Scenes WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn reorder_scenes(&self, ordered_ids: &[i64]) -> Result<()> {
        let conn = self.session.connect()?;
        assign_sort_order(&conn, "Scenes", None, ordered_ids)
    }

    /// Swap a scene with its neighbour: `-1` moves it up, `+1` down.
    ///
    /// Returns false when the scene is unknown or already at that end.
    pub fn move_scene(&self, id: i64, direction: i32) -> Result<bool> {
        let mut ids: Vec<i64> = self.list_scenes()?.into_iter().map(|s| s.id).collect();
        let Some(from) = ids.iter().position(|&s| s == id) else {
            return Ok(false);
        };
        let to = from as i64 + i64::from(direction.signum());
        if direction == 0 || to < 0 || to >= ids.len() as i64 {
            return Ok(false);
        }
        ids.swap(from, to as usize);
        self.reorder_scenes(&ids)?;
        Ok(true)
    }

    // ========================================================================
    // Shots
    // ========================================================================

    pub fn list_shots(&self, scene_id: i64) -> Result<Vec<Shot>> {
        let conn = self.session.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE s.scene_id = ?1 ORDER BY s.sort_index ASC, s.id ASC",
            SELECT_SHOT
        ))?;
        let shots = stmt
            .query_map([scene_id], row_to_shot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(shots)
    }

    pub fn get_shot(&self, id: i64) -> Result<Option<Shot>> {
        let conn = self.session.connect()?;
        let shot = conn
            .query_row(&format!("{} WHERE s.id = ?1", SELECT_SHOT), [id], row_to_shot)
            .optional()?;
        Ok(shot)
    }

    /// Create a shot at the end of its scene.
    pub fn create_shot(
        &self,
        scene_id: i64,
        code: &str,
        description: &str,
        asset_id: Option<i64>,
    ) -> Result<i64> {
        let conn = self.session.connect()?;
        conn.execute(
            r#"
            INSERT INTO Shots (scene_id, code, description, storyboard_asset_id, sort_index)
            VALUES (?1, ?2, ?3, ?4,
                    (SELECT COALESCE(MAX(sort_index), 0) + 1 FROM Shots WHERE scene_id = ?1))
            "#,
            params![scene_id, code, description, asset_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_shot(&self, id: i64, patch: ShotPatch) -> Result<()> {
        let builder = UpdateBuilder::new("Shots")
            .set_opt("code", patch.code)
            .set_opt("description", patch.description)
            .set_opt("shot_type", patch.shot_type)
            .set_opt("angle", patch.angle)
            .set_opt("movement", patch.movement)
            .set_opt("lens", patch.lens)
            .set_opt("lighting", patch.lighting)
            .set_opt("image_prompt", patch.image_prompt)
            .set_opt("video_prompt", patch.video_prompt)
            .set_opt("duration_sec", patch.duration_sec)
            .touch("updated_at");
        if builder.is_empty() {
            return Ok(());
        }

        let conn = self.session.connect()?;
        if builder.execute(&conn, id)? == 0 {
            return Err(CinescribeError::not_found("Shot", id));
        }
        Ok(())
    }

    pub fn link_shot_asset(&self, id: i64, asset_id: Option<i64>) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute(
            "UPDATE Shots SET storyboard_asset_id = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![asset_id, id],
        )?;
        Ok(())
    }

    /// Copy a shot to the end of its scene. `None` when the shot does not exist.
    pub fn duplicate_shot(&self, id: i64) -> Result<Option<i64>> {
        let conn = self.session.connect()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO Shots (scene_id, code, description, shot_type, angle, movement, lens,
                               lighting, image_prompt, video_prompt, duration_sec,
                               storyboard_asset_id, sort_index)
            SELECT scene_id, code, description, shot_type, angle, movement, lens,
                   lighting, image_prompt, video_prompt, duration_sec, storyboard_asset_id,
                   (SELECT COALESCE(MAX(sort_index), 0) + 1 FROM Shots o WHERE o.scene_id = s.scene_id)
            FROM Shots s
            WHERE s.id = ?1
            "#,
            [id],
        )?;
        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    pub fn delete_shot(&self, id: i64) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute("DELETE FROM Shots WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Renumber the listed shots of `scene_id` 1..=n; shots of other scenes are untouched.
    pub fn reorder_shots(&self, scene_id: i64, ordered_ids: &[i64]) -> Result<()> {
        let conn = self.session.connect()?;
        assign_sort_order(&conn, "Shots", Some(("scene_id", scene_id)), ordered_ids)
    }
}
