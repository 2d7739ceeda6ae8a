use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::DispatchError;

pub fn mirror_path(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

/// Deletes a local mirror, whether it is a directory tree or a stray file.
/// A mirror that is already gone counts as removed.
pub async fn remove_mirror(root: &Path, name: &str) -> Result<(), DispatchError> {
    let path = mirror_path(root, name);
    info!(path = %path.display(), "Removing mirror");

    let removed = match tokio::fs::symlink_metadata(&path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&path).await,
        Ok(_) => tokio::fs::remove_file(&path).await,
        Err(e) => Err(e),
    };

    match removed {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "mirror directory does not exist");
            Ok(())
        }
        Err(source) => Err(DispatchError::Filesystem {
            op: "remove",
            path,
            source,
        }),
    }
}

pub async fn rename_mirror(root: &Path, from: &str, to: &str) -> Result<(), DispatchError> {
    let old_path = mirror_path(root, from);
    let new_path = mirror_path(root, to);
    info!(from = %old_path.display(), to = %new_path.display(), "Moving mirror");

    // Never merge into or replace a mirror that already holds the new name.
    if tokio::fs::symlink_metadata(&new_path).await.is_ok() {
        warn!(path = %new_path.display(), "rename target already exists");
        return Err(DispatchError::Filesystem {
            op: "rename",
            path: new_path,
            source: std::io::Error::from(ErrorKind::AlreadyExists),
        });
    }

    tokio::fs::rename(&old_path, &new_path)
        .await
        .map_err(|source| DispatchError::Filesystem {
            op: "rename",
            path: old_path,
            source,
        })
}
