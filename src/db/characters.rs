use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::patch::UpdateBuilder;
use crate::error::{CinescribeError, Result};
use crate::session::ProjectSession;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub age: Option<String>,
    pub job: Option<String>,
    pub personality: Option<String>,
    pub goal: Option<String>,
    pub conflict: Option<String>,
    pub design_prompt: Option<String>,
    pub image_asset_id: Option<i64>,
    /// Thumbnail of the linked asset, relative to the project directory.
    pub image_thumbnail_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterPatch {
    pub name: Option<String>,
    pub age: Option<String>,
    pub job: Option<String>,
    pub personality: Option<String>,
    pub goal: Option<String>,
    pub conflict: Option<String>,
    pub design_prompt: Option<String>,
}

const SELECT_CHARACTER: &str = r#"
    SELECT c.id, c.name, c.age, c.job, c.personality, c.goal, c.conflict,
           c.design_prompt, c.image_asset_id, a.thumbnail_path
    FROM Characters c
    LEFT JOIN Assets a ON a.id = c.image_asset_id
"#;

fn row_to_character(row: &Row) -> rusqlite::Result<Character> {
    Ok(Character {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        job: row.get(3)?,
        personality: row.get(4)?,
        goal: row.get(5)?,
        conflict: row.get(6)?,
        design_prompt: row.get(7)?,
        image_asset_id: row.get(8)?,
        image_thumbnail_path: row.get(9)?,
    })
}

pub struct CharacterRepository {
    session: ProjectSession,
}

impl CharacterRepository {
    pub fn new(session: &ProjectSession) -> Self {
        Self {
            session: session.clone(),
        }
    }

    pub fn list(&self) -> Result<Vec<Character>> {
        let conn = self.session.connect()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY c.id ASC", SELECT_CHARACTER))?;
        let characters = stmt
            .query_map([], row_to_character)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(characters)
    }

    pub fn get(&self, id: i64) -> Result<Option<Character>> {
        let conn = self.session.connect()?;
        let character = conn
            .query_row(
                &format!("{} WHERE c.id = ?1", SELECT_CHARACTER),
                [id],
                row_to_character,
            )
            .optional()?;
        Ok(character)
    }

    pub fn create(&self, name: &str) -> Result<i64> {
        let conn = self.session.connect()?;
        conn.execute("INSERT INTO Characters (name) VALUES (?1)", [name])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, patch: CharacterPatch) -> Result<()> {
        let builder = UpdateBuilder::new("Characters")
            .set_opt("name", patch.name)
            .set_opt("age", patch.age)
            .set_opt("job", patch.job)
            .set_opt("personality", patch.personality)
            .set_opt("goal", patch.goal)
            .set_opt("conflict", patch.conflict)
            .set_opt("design_prompt", patch.design_prompt)
            .touch("updated_at");
        if builder.is_empty() {
            return Ok(());
        }

        let conn = self.session.connect()?;
        if builder.execute(&conn, id)? == 0 {
            return Err(CinescribeError::not_found("Character", id));
        }
        Ok(())
    }

    /// Point the character at an asset, or clear the link with `None`.
    pub fn link_image(&self, id: i64, asset_id: Option<i64>) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute(
            "UPDATE Characters SET image_asset_id = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![asset_id, id],
        )?;
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.session.connect()?;
        conn.execute("DELETE FROM Characters WHERE id = ?1", [id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::assets::{AssetRepository, NewAsset};
    use crate::db::test_support::new_session;

    #[test]
    fn test_create_update_delete() {
        let (_dir, session) = new_session();
        let repo = CharacterRepository::new(&session);

        let id = repo.create("New character").unwrap();
        repo.update(
            id,
            CharacterPatch {
                name: Some("Ada".to_string()),
                goal: Some("Escape the city".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        repo.update(
            id,
            CharacterPatch {
                job: Some("Cartographer".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let character = repo.get(id).unwrap().unwrap();
        assert_eq!(character.name, "Ada");
        assert_eq!(character.goal.as_deref(), Some("Escape the city"));
        assert_eq!(character.job.as_deref(), Some("Cartographer"));
        assert!(character.age.is_none());

        repo.delete(id).unwrap();
        assert!(repo.get(id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_character() {
        let (_dir, session) = new_session();
        let repo = CharacterRepository::new(&session);
        let err = repo
            .update(
                42,
                CharacterPatch {
                    name: Some("Ghost".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CinescribeError::NotFound { .. }));
    }

    #[test]
    fn test_link_image_carries_thumbnail() {
        let (_dir, session) = new_session();
        let repo = CharacterRepository::new(&session);
        let assets = AssetRepository::new(&session);

        let asset_id = assets
            .insert_image(&NewAsset {
                original_path: Some("/tmp/face.png".to_string()),
                project_path: "test_assets/abc.png".to_string(),
                thumbnail_path: Some("test_assets/thumbnails/abc_thumb.jpg".to_string()),
                filename: "abc.png".to_string(),
                ext: ".png".to_string(),
                width: Some(10),
                height: Some(10),
                hash_sha256: "abc".to_string(),
            })
            .unwrap();

        let first = repo.create("Ada").unwrap();
        let second = repo.create("Bo").unwrap();
        repo.link_image(first, Some(asset_id)).unwrap();

        let list = repo.list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, first);
        assert_eq!(
            list[0].image_thumbnail_path.as_deref(),
            Some("test_assets/thumbnails/abc_thumb.jpg")
        );
        assert_eq!(list[1].id, second);
        assert!(list[1].image_asset_id.is_none());

        repo.link_image(first, None).unwrap();
        assert!(repo.get(first).unwrap().unwrap().image_asset_id.is_none());
    }
}
