pub mod fs_store;
pub mod guard;
pub mod local_lock;
pub mod memory;
pub mod paths;
pub mod session_file;
pub mod settings;
pub mod spec_store;

pub use fs_store::FsStore;
pub use guard::WorkspaceGuard;
pub use local_lock::LocalLock;
pub use memory::MemoryStore;
pub use paths::ProjectPaths;
pub use session_file::SessionFile;
pub use settings::Settings;
pub use spec_store::{PatchIndex, SpecStore};

use specpatch_core::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let what = || format!("writing {}", path.display());
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::storage(what(), e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::storage(what(), e))?;
    tmp.write_all(data).map_err(|e| Error::storage(what(), e))?;
    tmp.flush().map_err(|e| Error::storage(what(), e))?;
    tmp.persist(path).map_err(|e| Error::storage(what(), e.error))?;
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::storage(format!("removing {}", path.display()), e)),
    }
}
