// album directory enumeration

use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("cannot read directory {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// immediate children of a directory, split by kind
#[derive(Debug, Default)]
pub struct DirectoryScan {
    /// every entry seen, including ones that could not be stat'ed
    pub total_entries: usize,
    pub directories: Vec<String>,
}

/// recursively list regular files below `base_dir`, as `/`-separated paths
/// relative to it. entries that cannot be stat'ed (dangling symlinks,
/// permission errors, loops) are skipped; only an unreadable `base_dir` is
/// an error. the order is whatever the directory reads return.
pub fn walk(base_dir: &Path) -> Result<Vec<String>, WalkError> {
    std::fs::read_dir(base_dir).map_err(|source| WalkError::Unreadable {
        path: base_dir.to_path_buf(),
        source,
    })?;

    let files = WalkDir::new(base_dir)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| relative_slash_path(base_dir, entry.path()))
        .collect();

    Ok(files)
}

fn relative_slash_path(base_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base_dir).ok()?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => match name.to_str() {
                Some(name) => parts.push(name),
                None => {
                    debug!("skipping non utf-8 path: {}", path.display());
                    return None;
                }
            },
            _ => return None,
        }
    }

    Some(parts.join("/"))
}

/// read the immediate children of `dir`, keeping directories (symlinks are
/// followed). children that fail to stat are counted but otherwise ignored.
pub async fn scan_directory(dir: &Path) -> Result<DirectoryScan, std::io::Error> {
    let mut scan = DirectoryScan::default();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        scan.total_entries += 1;

        let Ok(name) = entry.file_name().into_string() else {
            debug!("skipping non utf-8 entry in {}", dir.display());
            continue;
        };

        match fs::metadata(entry.path()).await {
            Ok(metadata) if metadata.is_dir() => scan.directories.push(name),
            Ok(_) => {}
            Err(err) => debug!("skipping entry {}: {}", name, err),
        }
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_recurses_and_returns_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        fs::write(base.join("a.jpg"), "a").unwrap();
        fs::create_dir_all(base.join("day1/morning")).unwrap();
        fs::write(base.join("day1/b.jpg"), "b").unwrap();
        fs::write(base.join("day1/morning/c.mov"), "c").unwrap();
        fs::create_dir(base.join("empty")).unwrap();

        let mut files = walk(base).unwrap();
        files.sort();
        assert_eq!(files, vec!["a.jpg", "day1/b.jpg", "day1/morning/c.mov"]);
    }

    #[test]
    fn test_walk_of_empty_directory_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(walk(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_walk_of_missing_directory_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let err = walk(&temp_dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, WalkError::Unreadable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_dangling_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        fs::write(base.join("real.jpg"), "x").unwrap();
        std::os::unix::fs::symlink(base.join("gone.jpg"), base.join("dangling.jpg")).unwrap();

        assert_eq!(walk(base).unwrap(), vec!["real.jpg"]);
    }

    #[tokio::test]
    async fn test_scan_directory_keeps_only_directories() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        fs::write(base.join("loose.jpg"), "x").unwrap();
        fs::create_dir(base.join("vacation")).unwrap();

        let scan = scan_directory(base).await.unwrap();
        assert_eq!(scan.total_entries, 2);
        assert_eq!(scan.directories, vec!["vacation"]);
    }
}
