use std::path::{Path, PathBuf};

/// Name of the project-local directory.
pub const PROJECT_DIR: &str = ".specpatch";

/// All well-known paths under `.specpatch/`.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub project_dir: PathBuf,
    pub state_json: PathBuf,
    pub lock_file: PathBuf,
    pub store_dir: PathBuf,
}

impl ProjectPaths {
    /// Derive all paths from a project root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let project_dir = root.join(PROJECT_DIR);
        Self {
            state_json: project_dir.join("state.json"),
            lock_file: project_dir.join("LOCK"),
            store_dir: project_dir.join("store"),
            project_dir,
            root,
        }
    }

    /// Create the project directory. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.project_dir)
    }

    /// Check whether `.specpatch/` exists.
    pub fn is_initialized(&self) -> bool {
        self.project_dir.is_dir()
    }

    /// Resolve a configured store directory; relative paths are taken from the project root.
    pub fn resolve_store_dir(&self, configured: Option<&Path>) -> PathBuf {
        match configured {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.root.join(dir),
            None => self.store_dir.clone(),
        }
    }

    /// Walk up from `start` looking for a directory containing `.specpatch/`.
    /// Returns `None` if not found.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(PROJECT_DIR).is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}
