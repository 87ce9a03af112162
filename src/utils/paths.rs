// path confinement for user-supplied path fragments

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathTraversalError {
    #[error("invalid base path: {0}")]
    InvalidBasePath(PathBuf),

    #[error("path outside jail: base={base:?}, target={target:?}")]
    OutsideJail { base: PathBuf, target: PathBuf },

    #[error("null byte in path")]
    NullByte,

    #[error("windows prefix not allowed")]
    WindowsPrefix,
}

/// resolve `relative` against `root` and make sure the result stays below `root`.
///
/// resolution is purely lexical: `.` and `..` are folded, symlinks are neither
/// followed nor rejected, and the target does not need to exist (thumbnail
/// artifacts are confined before they are written). an absolute fragment
/// restarts from the filesystem root and is therefore always rejected.
pub fn confine(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf, PathTraversalError> {
    let relative = relative.as_ref();
    if relative.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(PathTraversalError::NullByte);
    }

    let base = resolve_root(root)?;
    let mut resolved = base.clone();

    for component in relative.components() {
        match component {
            Component::Normal(name) => resolved.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::RootDir => resolved = PathBuf::from(Component::RootDir.as_os_str()),
            Component::Prefix(_) => return Err(PathTraversalError::WindowsPrefix),
        }
    }

    // component-wise prefix check, so "/srv/img-evil" never matches "/srv/img"
    if !resolved.starts_with(&base) {
        return Err(PathTraversalError::OutsideJail {
            base,
            target: resolved,
        });
    }

    Ok(resolved)
}

/// make `root` absolute and lexically normalized
pub fn resolve_root(root: &Path) -> Result<PathBuf, PathTraversalError> {
    if root.as_os_str().is_empty() {
        return Err(PathTraversalError::InvalidBasePath(root.to_path_buf()));
    }

    let absolute = std::path::absolute(root)
        .map_err(|_| PathTraversalError::InvalidBasePath(root.to_path_buf()))?;

    Ok(normalize_lexically(&absolute))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    normalized
}
