use crate::write_atomic;
use specpatch_core::{Error, Result, SessionState, Transition};
use std::path::{Path, PathBuf};

/// Session state bound to its on-disk location (`.specpatch/state.json`).
///
/// Every transition is flushed before `transition` returns.
#[derive(Debug)]
pub struct SessionFile {
    path: PathBuf,
    state: SessionState,
}

impl SessionFile {
    /// Load state from disk. A missing file falls back to the idle state,
    /// which is written out immediately.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::warn!(
                "state file {} not found; falling back to the default idle state",
                path.display()
            );
            let file = Self {
                path,
                state: SessionState::Idle,
            };
            file.save()?;
            return Ok(file);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::storage(format!("reading state {}", path.display()), e))?;
        let state: SessionState = serde_json::from_str(&content)
            .map_err(|e| Error::format(format!("state {}", path.display()), e))?;
        Ok(Self { path, state })
    }

    /// Start a fresh idle session at `path`, overwriting whatever was there.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let file = Self {
            path: path.into(),
            state: SessionState::Idle,
        };
        file.save()?;
        Ok(file)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `event` and persist the new state. On a rejected transition
    /// nothing is written.
    pub fn transition(&mut self, event: Transition) -> Result<&SessionState> {
        let next = self.state.apply(event)?;
        tracing::debug!("session {:?} -> {:?}", self.state.mode(), next.mode());
        self.state = next;
        self.save()?;
        Ok(&self.state)
    }

    fn save(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.state)
            .map_err(|e| Error::format("session state", e))?;
        write_atomic(&self.path, data.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specpatch_core::{Mode, Status};

    #[test]
    fn load_nonexistent_creates_idle_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let file = SessionFile::load(&path).unwrap();
        assert!(file.state().is_idle());
        assert!(path.exists());
    }

    #[test]
    fn transitions_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut file = SessionFile::create(&path).unwrap();
        file.transition(Transition::PatchFailed {
            patch: 2,
            file: PathBuf::from("spec.json"),
        })
        .unwrap();

        let loaded = SessionFile::load(&path).unwrap();
        assert_eq!(loaded.state().mode(), Mode::Edit);
        assert_eq!(loaded.state().status(), Status::PatchFailed);
        assert_eq!(loaded.state().editing(), Some((2, Path::new("spec.json"))));
    }

    #[test]
    fn rejected_transition_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut file = SessionFile::create(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        assert!(file.transition(Transition::Commit).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert!(file.state().is_idle());
    }

    #[test]
    fn corrupt_state_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{\"mode\": 7}").unwrap();
        assert!(matches!(
            SessionFile::load(&path),
            Err(Error::Format { .. })
        ));
    }
}
