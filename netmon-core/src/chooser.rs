//! Folder browsing for picking where exports go.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// One entry in a browsed folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

/// Folder to open the chooser at.
///
/// A directory is used as is, a file is replaced by its parent folder, and
/// anything else (missing path, no candidate) falls back to `fallback`.
pub fn initial_folder(candidate: Option<&Path>, fallback: &Path) -> PathBuf {
    match candidate {
        Some(path) if path.is_dir() => path.to_path_buf(),
        Some(path) if path.is_file() => path
            .parent()
            .filter(|p| p.is_dir())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| fallback.to_path_buf()),
        _ => fallback.to_path_buf(),
    }
}

/// List `folder`, folders first, then by case-insensitive name.
///
/// Hidden entries (leading `.`) are skipped. With `folders_only`, files are
/// left out as well.
pub fn list_entries(folder: &Path, folders_only: bool) -> Result<Vec<FolderEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        // Follows symlinks, so a link to a folder browses like a folder.
        let is_dir = path.is_dir();
        if folders_only && !is_dir {
            continue;
        }
        entries.push(FolderEntry { path, name, is_dir });
    }

    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    tracing::debug!(folder = %folder.display(), count = entries.len(), "Listed folder");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join("Alpha")).unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("b.csv"), "").unwrap();
        fs::write(dir.path().join("A.kml"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        dir
    }

    #[test]
    fn test_list_entries_order() {
        let dir = fixture();
        let names: Vec<_> = list_entries(dir.path(), false)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "zeta", "A.kml", "b.csv"]);
    }

    #[test]
    fn test_list_entries_folders_only() {
        let dir = fixture();
        let entries = list_entries(dir.path(), true).unwrap();
        assert!(entries.iter().all(|e| e.is_dir));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_initial_folder() {
        let dir = fixture();
        let fallback = Path::new("/fallback");

        assert_eq!(
            initial_folder(Some(&dir.path().join("zeta")), fallback),
            dir.path().join("zeta")
        );
        assert_eq!(
            initial_folder(Some(&dir.path().join("b.csv")), fallback),
            dir.path().to_path_buf()
        );
        assert_eq!(
            initial_folder(Some(&dir.path().join("missing")), fallback),
            fallback.to_path_buf()
        );
        assert_eq!(initial_folder(None, fallback), fallback.to_path_buf());
    }

    #[test]
    fn test_list_missing_folder() {
        let dir = TempDir::new().unwrap();
        assert!(list_entries(&dir.path().join("missing"), false).is_err());
    }
}
