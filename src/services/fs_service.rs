use crate::error::{AppError, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively list image files under `root`, sorted by path.
///
/// Directories listed in `exclude` are not descended into, so output folders
/// nested inside the source folder are never picked up again. They are
/// compared by canonical path, so `./in/found` and `in/found` are the same.
pub fn list_image_files(root: &Path, exclude: &[&Path]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(AppError::io(
            root,
            io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    // Folders that do not exist yet cannot contain anything to skip.
    let excluded: Vec<PathBuf> = exclude
        .iter()
        .filter_map(|ex| std::fs::canonicalize(ex).ok())
        .collect();

    let mut images = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_excluded(entry.path(), &excluded)
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if is_image_file(entry.path()) {
            images.push(entry.into_path());
        }
    }

    images.sort();
    Ok(images)
}

fn is_excluded(dir: &Path, excluded: &[PathBuf]) -> bool {
    if excluded.is_empty() {
        return false;
    }
    std::fs::canonicalize(dir)
        .map(|canonical| excluded.contains(&canonical))
        .unwrap_or(false)
}

/// Number of images currently under `root`. A missing folder holds none.
pub fn count_image_files(root: &Path) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }
    Ok(list_image_files(root, &[])?.len())
}

/// Map `image`, which lives under `source_root`, to the same relative
/// location under `dest_root`.
///
/// The prefix is matched on whole path components. A path outside
/// `source_root` keeps only its file name.
pub fn destination_path(image: &Path, source_root: &Path, dest_root: &Path) -> PathBuf {
    match image.strip_prefix(source_root) {
        Ok(relative) => dest_root.join(relative),
        Err(_) => dest_root.join(image.file_name().unwrap_or_default()),
    }
}

/// Move a file, creating the destination's parent directories as needed.
/// Falls back to copy and delete when a plain rename is not possible,
/// e.g. across filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
    }

    if let Err(rename_err) = std::fs::rename(from, to) {
        debug!(
            "rename {} -> {} failed ({}), copying instead",
            from.display(),
            to.display(),
            rename_err
        );
        std::fs::copy(from, to).map_err(|e| AppError::io(to, e))?;
        std::fs::remove_file(from).map_err(|e| AppError::io(from, e))?;
    }

    Ok(())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| AppError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn recognises_image_extensions_case_insensitively() {
        assert!(is_image_file(Path::new("a/b.JPG")));
        assert!(is_image_file(Path::new("b.tiff")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("README")));
    }

    #[test]
    fn lists_images_recursively_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.png"));
        touch(&root.join("a.jpg"));
        touch(&root.join("nested/c.jpeg"));
        touch(&root.join("skip.txt"));

        let images = list_image_files(root, &[]).unwrap();
        assert_eq!(
            images,
            vec![root.join("a.jpg"), root.join("b.png"), root.join("nested/c.jpeg")]
        );
    }

    #[test]
    fn excluded_directories_are_not_listed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.jpg"));
        touch(&root.join("found/old.jpg"));

        let found = root.join("found");
        let images = list_image_files(root, &[found.as_path()]).unwrap();
        assert_eq!(images, vec![root.join("a.jpg")]);
    }

    #[test]
    fn excluded_directories_match_however_they_are_spelled() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("in");
        touch(&root.join("a.jpg"));
        touch(&root.join("found/earlier.jpg"));
        fs::create_dir_all(root.join("x")).unwrap();

        // Same folder as `in/found`, written through `./` and `..`.
        let source = dir.path().join(".").join("in");
        let found = dir.path().join("in/x/../found");
        let images = list_image_files(&source, &[found.as_path()]).unwrap();

        assert_eq!(images, vec![source.join("a.jpg")]);
    }

    #[test]
    fn listing_a_missing_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_image_files(&dir.path().join("nope"), &[]).is_err());
        assert_eq!(count_image_files(&dir.path().join("nope")).unwrap(), 0);
    }

    #[test]
    fn destination_replaces_whole_prefix_components() {
        assert_eq!(
            destination_path(
                Path::new("source_images/trip/cat.jpg"),
                Path::new("source_images"),
                Path::new("output_images/found"),
            ),
            PathBuf::from("output_images/found/trip/cat.jpg")
        );

        // Folder names that reappear deeper in the path are left alone.
        assert_eq!(
            destination_path(
                Path::new("img/img/img.png"),
                Path::new("img"),
                Path::new("out"),
            ),
            PathBuf::from("out/img/img.png")
        );
    }

    #[test]
    fn destination_for_foreign_path_keeps_file_name() {
        assert_eq!(
            destination_path(Path::new("/elsewhere/x.png"), Path::new("src"), Path::new("dst")),
            PathBuf::from("dst/x.png")
        );
    }

    #[test]
    fn move_file_replaces_an_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("in/a.png");
        let to = dir.path().join("out/a.png");
        touch(&from);
        fs::create_dir_all(to.parent().unwrap()).unwrap();
        fs::write(&to, b"older").unwrap();

        move_file(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"x");
    }

    #[test]
    fn move_file_reports_io_error_and_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("in/a.png");
        touch(&from);
        // The destination's parent is a regular file.
        let blocker = dir.path().join("out");
        fs::write(&blocker, b"file").unwrap();

        let err = move_file(&from, &blocker.join("a.png")).unwrap_err();

        assert!(matches!(err, AppError::Io { .. }));
        assert_eq!(fs::read(&from).unwrap(), b"x");
    }

    #[test]
    fn move_file_creates_parents_and_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("in/a.png");
        let to = dir.path().join("out/deep/a.png");
        touch(&from);

        move_file(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"x");
    }
}
