//! Content-addressed image import.
//!
//! An imported file is copied to `<stem>_assets/<sha256><ext>` and previewed at
//! `<stem>_assets/thumbnails/<sha256>_thumb.jpg`. Identical bytes always map to
//! the same file and the same `Assets` row, whatever the source was called.

pub mod discovery;
pub mod hashing;
pub mod thumbnails;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ThumbnailConfig;
use crate::db::{Asset, AssetRepository, NewAsset};
use crate::error::{CinescribeError, Result};
use crate::paths::absolutize;
use crate::session::ProjectSession;

/// Outcome of importing one file. Paths are relative to the project directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedAsset {
    pub asset_id: i64,
    pub stored_path: String,
    pub thumbnail_path: Option<String>,
    /// True when the content was already in the store.
    pub reused: bool,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<ImportedAsset>,
    pub failed: Vec<(PathBuf, String)>,
}

pub struct AssetStore {
    session: ProjectSession,
    repo: AssetRepository,
    thumbnails: ThumbnailConfig,
}

impl AssetStore {
    pub fn new(session: &ProjectSession, thumbnails: ThumbnailConfig) -> Self {
        Self {
            session: session.clone(),
            repo: AssetRepository::new(session),
            thumbnails,
        }
    }

    /// Import an image, reusing the existing asset when its content is already stored.
    ///
    /// An unreadable source is an error. A file that cannot be decoded is still
    /// imported, without thumbnail or dimensions.
    pub fn import_image(&self, source: &Path) -> Result<ImportedAsset> {
        let source = absolutize(source)?;
        let dirs = self.session.dirs();
        dirs.ensure()?;

        let sha256 = hashing::sha256_file(&source)?;
        if let Some(existing) = self.repo.get_by_hash(&sha256)? {
            return self.reuse_existing(existing, &source);
        }

        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        let file_name = format!("{}{}", sha256, ext);
        let dest = dirs.assets_dir.join(&file_name);
        if !dest.exists() {
            copy_into_place(&source, &dest)?;
        }

        let thumb_name = format!("{}_thumb.jpg", sha256);
        let thumbnail_path = self
            .ensure_thumbnail(&dest, &dirs.thumbnails_dir.join(&thumb_name))
            .then(|| dirs.thumbnail_relative(&thumb_name));

        let (width, height) = match thumbnails::read_dimensions(&dest) {
            Ok((w, h)) => (Some(w), Some(h)),
            Err(e) => {
                tracing::warn!(path = ?dest, error = %e, "Could not read image dimensions");
                (None, None)
            }
        };

        let stored_path = dirs.asset_relative(&file_name);
        let asset_id = self.repo.insert_image(&NewAsset {
            original_path: Some(source.to_string_lossy().to_string()),
            project_path: stored_path.clone(),
            thumbnail_path: thumbnail_path.clone(),
            filename: file_name,
            ext,
            width,
            height,
            hash_sha256: sha256,
        })?;

        tracing::info!(asset_id, source = ?source, stored = %stored_path, "Imported image");
        Ok(ImportedAsset {
            asset_id,
            stored_path,
            thumbnail_path,
            reused: false,
        })
    }

    /// Content already has a row: nothing new is copied under another name.
    ///
    /// A recorded original missing from disk is restored from `source`, and a
    /// thumbnail is generated if the row never got one.
    fn reuse_existing(&self, existing: Asset, source: &Path) -> Result<ImportedAsset> {
        let dirs = self.session.dirs();
        let stored = dirs.resolve(&existing.project_path);
        if !stored.exists() {
            copy_into_place(source, &stored)?;
        }

        let thumbnail_path = match existing.thumbnail_path {
            Some(recorded) => Some(recorded),
            None => {
                let thumb_name = format!("{}_thumb.jpg", existing.hash_sha256);
                if self.ensure_thumbnail(&stored, &dirs.thumbnails_dir.join(&thumb_name)) {
                    let generated = dirs.thumbnail_relative(&thumb_name);
                    self.repo.set_thumbnail_path(existing.id, &generated)?;
                    Some(generated)
                } else {
                    None
                }
            }
        };

        tracing::debug!(asset_id = existing.id, source = ?source, "Asset already stored");
        Ok(ImportedAsset {
            asset_id: existing.id,
            stored_path: existing.project_path,
            thumbnail_path,
            reused: true,
        })
    }

    /// Whether a usable thumbnail exists at `thumb_dest` afterwards.
    fn ensure_thumbnail(&self, stored: &Path, thumb_dest: &Path) -> bool {
        if thumb_dest.exists() {
            return true;
        }

        match thumbnails::generate_thumbnail(
            stored,
            thumb_dest,
            self.thumbnails.max_dimension,
            self.thumbnails.jpeg_quality,
        ) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(path = ?stored, error = %e, "Thumbnail generation failed");
                let _ = fs::remove_file(thumb_dest);
                false
            }
        }
    }

    /// Import every matching file under `directory`, in path order.
    ///
    /// A failing file is recorded in the report and the walk continues.
    pub fn import_directory(&self, directory: &Path, extensions: &[String]) -> Result<ImportReport> {
        if !directory.is_dir() {
            return Err(CinescribeError::InvalidPath(directory.display().to_string()));
        }

        let mut report = ImportReport::default();
        for path in discovery::discover_images(directory, extensions) {
            match self.import_image(&path) {
                Ok(imported) => report.imported.push(imported),
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Import failed");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        tracing::info!(
            imported = report.imported.len(),
            failed = report.failed.len(),
            directory = ?directory,
            "Directory import finished"
        );
        Ok(report)
    }

    pub fn get(&self, asset_id: i64) -> Result<Option<Asset>> {
        self.repo.get(asset_id)
    }

    pub fn search(&self, query: &str) -> Result<Vec<Asset>> {
        self.repo.search(query)
    }

    pub fn update_tags(&self, asset_id: i64, tags: &str) -> Result<()> {
        self.repo.update_tags(asset_id, tags)
    }

    /// True if a character or shot links to the asset.
    ///
    /// Final images are not counted: an asset used only by final images
    /// reports false, and deleting it leaves those images without a picture.
    pub fn is_referenced(&self, asset_id: i64) -> Result<bool> {
        self.repo.is_referenced(asset_id)
    }

    /// Remove the asset row. Files on disk are kept and the caller is
    /// responsible for checking [`Self::is_referenced`] first.
    pub fn delete(&self, asset_id: i64) -> Result<()> {
        self.repo.delete(asset_id)?;
        tracing::info!(asset_id, "Deleted asset row");
        Ok(())
    }

    /// Delete the asset only if nothing references it. Returns whether it was deleted.
    pub fn release(&self, asset_id: i64) -> Result<bool> {
        if self.is_referenced(asset_id)? {
            return Ok(false);
        }
        self.delete(asset_id)?;
        Ok(true)
    }

    pub fn absolute_path(&self, asset: &Asset) -> PathBuf {
        self.session.dirs().resolve(&asset.project_path)
    }

    pub fn absolute_thumbnail_path(&self, asset: &Asset) -> Option<PathBuf> {
        asset
            .thumbnail_path
            .as_deref()
            .map(|p| self.session.dirs().resolve(p))
    }
}

/// Copy `source` to `dest` through a temporary sibling, so `dest` only ever
/// appears complete. The temporary file is removed if the copy fails.
fn copy_into_place(source: &Path, dest: &Path) -> Result<()> {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| CinescribeError::InvalidPath(dest.display().to_string()))?;
    let partial = dest.with_file_name(format!(".{}.partial", file_name));

    if let Err(e) = fs::copy(source, &partial).and_then(|_| fs::rename(&partial, dest)) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::new_session;
    use crate::db::{CharacterRepository, FinalImageRepository, SceneRepository};
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
        RgbImage::from_pixel(width, height, Rgb(color)).save(path).unwrap();
    }

    fn store(session: &ProjectSession) -> AssetStore {
        AssetStore::new(session, ThumbnailConfig::default())
    }

    fn files_in(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .count()
    }

    #[test]
    fn test_same_content_imports_once() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let first_src = dir.path().join("take1.PNG");
        write_png(&first_src, 64, 32, [10, 20, 30]);
        let second_src = dir.path().join("copy of take1.png");
        fs::copy(&first_src, &second_src).unwrap();

        let first = assets.import_image(&first_src).unwrap();
        let second = assets.import_image(&second_src).unwrap();

        assert_eq!(first.asset_id, second.asset_id);
        assert!(!first.reused);
        assert!(second.reused);
        assert_eq!(first.stored_path, second.stored_path);
        assert!(first.stored_path.starts_with("test_assets/"));
        assert!(first.stored_path.ends_with(".png"));
        assert_eq!(files_in(&session.dirs().assets_dir), 1);
        assert_eq!(files_in(&session.dirs().thumbnails_dir), 1);

        let asset = assets.get(first.asset_id).unwrap().unwrap();
        assert_eq!(asset.kind, "image");
        assert_eq!((asset.width, asset.height), (Some(64), Some(32)));
        assert_eq!(asset.ext, ".png");
        assert_eq!(asset.filename, format!("{}.png", asset.hash_sha256));
        assert!(assets.absolute_path(&asset).is_file());
    }

    #[test]
    fn test_distinct_images_get_distinct_assets() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let red = dir.path().join("red.png");
        let blue = dir.path().join("blue.png");
        write_png(&red, 16, 16, [255, 0, 0]);
        write_png(&blue, 16, 16, [0, 0, 255]);

        let a = assets.import_image(&red).unwrap();
        let b = assets.import_image(&blue).unwrap();
        assert_ne!(a.asset_id, b.asset_id);
        assert_ne!(a.stored_path, b.stored_path);
        assert_eq!(files_in(&session.dirs().assets_dir), 2);
    }

    #[test]
    fn test_thumbnail_keeps_aspect_ratio() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let wide = dir.path().join("wide.png");
        write_png(&wide, 1600, 900, [40, 40, 40]);

        let imported = assets.import_image(&wide).unwrap();
        let thumb = session
            .dirs()
            .resolve(imported.thumbnail_path.as_deref().unwrap());
        let (w, h) = image::image_dimensions(&thumb).unwrap();
        assert_eq!(w, 512);
        assert!(h <= 512);
        let expected = 512.0 * 900.0 / 1600.0;
        assert!((h as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_undecodable_file_still_imports() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let bogus = dir.path().join("notes.jpg");
        fs::write(&bogus, b"definitely not a jpeg").unwrap();

        let imported = assets.import_image(&bogus).unwrap();
        assert!(imported.thumbnail_path.is_none());
        assert_eq!(files_in(&session.dirs().thumbnails_dir), 0);

        let asset = assets.get(imported.asset_id).unwrap().unwrap();
        assert!(asset.width.is_none());
        assert!(asset.height.is_none());
        assert!(assets.absolute_path(&asset).is_file());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let (dir, session) = new_session();
        let err = store(&session)
            .import_image(&dir.path().join("missing.png"))
            .unwrap_err();
        assert!(matches!(err, CinescribeError::Io(_)));
    }

    #[test]
    fn test_delete_keeps_files() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let src = dir.path().join("frame.png");
        write_png(&src, 20, 20, [1, 2, 3]);
        let imported = assets.import_image(&src).unwrap();
        let asset = assets.get(imported.asset_id).unwrap().unwrap();

        assets.delete(imported.asset_id).unwrap();
        assert!(assets.get(imported.asset_id).unwrap().is_none());
        assert!(assets.absolute_path(&asset).is_file());
        assert!(assets.absolute_thumbnail_path(&asset).unwrap().is_file());
    }

    #[test]
    fn test_references_from_characters_and_shots() {
        let (dir, session) = new_session();
        let assets = store(&session);
        let characters = CharacterRepository::new(&session);
        let scenes = SceneRepository::new(&session);
        let finals = FinalImageRepository::new(&session);

        let mut ids = Vec::new();
        for (i, color) in [[9, 0, 0], [0, 9, 0], [0, 0, 9]].iter().enumerate() {
            let src = dir.path().join(format!("{}.png", i));
            write_png(&src, 8, 8, *color);
            ids.push(assets.import_image(&src).unwrap().asset_id);
        }

        let hero = characters.create("Mara").unwrap();
        characters.link_image(hero, Some(ids[0])).unwrap();
        let scene = scenes.create_scene(Some(1), Some("Dock"), None).unwrap();
        scenes.create_shot(scene, "1A", "wide", Some(ids[1])).unwrap();
        finals.create_image(scene, "poster", Some(ids[2])).unwrap();

        assert!(assets.is_referenced(ids[0]).unwrap());
        assert!(assets.is_referenced(ids[1]).unwrap());
        assert!(!assets.is_referenced(ids[2]).unwrap());

        assert!(!assets.release(ids[0]).unwrap());
        assert!(assets.get(ids[0]).unwrap().is_some());

        characters.link_image(hero, None).unwrap();
        assert!(assets.release(ids[0]).unwrap());
        assert!(assets.get(ids[0]).unwrap().is_none());
    }

    #[test]
    fn test_import_directory_and_search() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let source_dir = dir.path().join("refs");
        fs::create_dir(&source_dir).unwrap();
        write_png(&source_dir.join("a.png"), 10, 10, [1, 1, 1]);
        write_png(&source_dir.join("b.png"), 10, 10, [2, 2, 2]);
        fs::copy(source_dir.join("a.png"), source_dir.join("c.png")).unwrap();
        fs::write(source_dir.join("readme.txt"), "skip me").unwrap();

        let extensions = vec!["png".to_string()];
        let report = assets.import_directory(&source_dir, &extensions).unwrap();
        assert_eq!(report.imported.len(), 3);
        assert!(report.failed.is_empty());
        assert!(report.imported[2].reused);
        assert_eq!(report.imported[0].asset_id, report.imported[2].asset_id);

        assets
            .update_tags(report.imported[1].asset_id, "harbor,night")
            .unwrap();
        let hits = assets.search("harbor").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, report.imported[1].asset_id);
        assert_eq!(assets.search("").unwrap().len(), 2);

        assert!(assets
            .import_directory(&dir.path().join("nowhere"), &extensions)
            .is_err());
    }

    #[test]
    fn test_same_content_other_extension_keeps_one_copy() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let png = dir.path().join("shot.png");
        write_png(&png, 30, 30, [70, 80, 90]);
        let jpg = dir.path().join("shot.jpg");
        let jpeg = dir.path().join("shot_copy.jpeg");
        fs::copy(&png, &jpg).unwrap();
        fs::copy(&png, &jpeg).unwrap();

        let first = assets.import_image(&jpg).unwrap();
        let second = assets.import_image(&jpeg).unwrap();

        assert_eq!(first.asset_id, second.asset_id);
        assert_eq!(second.stored_path, first.stored_path);
        assert!(first.stored_path.ends_with(".jpg"));
        assert_eq!(files_in(&session.dirs().assets_dir), 1);
    }

    #[test]
    fn test_extensionless_image_is_decoded_by_content() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let png = dir.path().join("frame.png");
        write_png(&png, 40, 20, [5, 6, 7]);
        let unnamed = dir.path().join("frame_export");
        fs::copy(&png, &unnamed).unwrap();

        let imported = assets.import_image(&unnamed).unwrap();
        assert!(imported.thumbnail_path.is_some());

        let asset = assets.get(imported.asset_id).unwrap().unwrap();
        assert_eq!((asset.width, asset.height), (Some(40), Some(20)));
        assert_eq!(asset.ext, "");
        assert_eq!(asset.filename, asset.hash_sha256);
    }

    #[test]
    fn test_reimport_restores_missing_original() {
        let (dir, session) = new_session();
        let assets = store(&session);

        let src = dir.path().join("still.png");
        write_png(&src, 12, 12, [3, 3, 3]);
        let imported = assets.import_image(&src).unwrap();
        let asset = assets.get(imported.asset_id).unwrap().unwrap();
        fs::remove_file(assets.absolute_path(&asset)).unwrap();

        let again = assets.import_image(&src).unwrap();
        assert!(again.reused);
        assert!(assets.absolute_path(&asset).is_file());
    }

    #[test]
    fn test_failed_copy_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("abc.png");

        assert!(copy_into_place(&dir.path().join("gone.png"), &dest).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let src = dir.path().join("src.bin");
        fs::write(&src, b"frame bytes").unwrap();
        copy_into_place(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"frame bytes");
        assert!(!dir.path().join(".abc.png.partial").exists());
    }
}
