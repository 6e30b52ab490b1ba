use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files under `directory` whose extension is in `extensions`, sorted by path.
pub fn discover_images(directory: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy();
                    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
                })
                .unwrap_or(false)
        })
        .collect();

    images.sort();
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_discover_images() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("b_frame.PNG")).unwrap();
        File::create(dir.path().join("a_frame.jpg")).unwrap();
        File::create(dir.path().join("script.txt")).unwrap();
        fs::create_dir(dir.path().join("refs")).unwrap();
        File::create(dir.path().join("refs/mood.jpeg")).unwrap();

        let extensions = vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()];
        let images = discover_images(dir.path(), &extensions);

        assert_eq!(
            images,
            vec![
                dir.path().join("a_frame.jpg"),
                dir.path().join("b_frame.PNG"),
                dir.path().join("refs/mood.jpeg"),
            ]
        );
    }
}
