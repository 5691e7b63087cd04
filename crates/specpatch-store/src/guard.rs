use crate::paths::ProjectPaths;
use fs2::FileExt;
use specpatch_core::{Error, Result};
use std::fs::{File, OpenOptions};

/// Exclusive per-process guard backed by `.specpatch/LOCK`.
/// Serializes local state-file updates between concurrent invocations on one
/// machine. Automatically released when dropped.
pub struct WorkspaceGuard {
    _file: File,
}

impl WorkspaceGuard {
    /// Try to acquire the guard (non-blocking).
    /// Returns an error if another local process holds it.
    pub fn acquire(paths: &ProjectPaths) -> Result<Self> {
        paths
            .ensure_layout()
            .map_err(|e| Error::storage(format!("creating {}", paths.project_dir.display()), e))?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)
            .map_err(|e| Error::storage(format!("opening {}", paths.lock_file.display()), e))?;

        file.try_lock_exclusive().map_err(|_| {
            Error::Lock(format!(
                "project is busy: another specpatch process holds {}",
                paths.lock_file.display()
            ))
        })?;

        Ok(Self { _file: file })
    }
}
