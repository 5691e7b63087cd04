use crate::remove_if_exists;
use specpatch_core::{AuthGate, Error, Result, SessionLock};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Session lock for deployments without a lock service: a holder file inside
/// the shared store directory, created exclusively.
#[derive(Debug, Clone)]
pub struct LocalLock {
    path: PathBuf,
    holder: String,
}

impl LocalLock {
    pub fn new(store_dir: impl Into<PathBuf>, name: &str, holder: impl Into<String>) -> Self {
        Self {
            path: store_dir.into().join("locks").join(format!("{name}.lock")),
            holder: holder.into(),
        }
    }

    /// Who holds the lock right now, if anyone.
    pub fn holder(&self) -> Option<String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
    }
}

impl SessionLock for LocalLock {
    fn lock(&mut self, _auth: &mut dyn AuthGate) -> Result<()> {
        tracing::info!("acquiring lock");
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Lock(format!("cannot create {}: {e}", parent.display())))?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(mut file) => {
                writeln!(file, "{}", self.holder)
                    .map_err(|e| Error::Lock(format!("cannot write {}: {e}", self.path.display())))?;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(Error::LockHeld {
                holder: self.holder().unwrap_or_else(|| "<unknown>".to_string()),
            }),
            Err(e) => Err(Error::Lock(format!(
                "cannot create {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn unlock(&mut self, _auth: &mut dyn AuthGate) -> Result<()> {
        tracing::info!("releasing lock");
        if !remove_if_exists(&self.path)? {
            tracing::warn!("lock {} was not held", self.path.display());
        }
        Ok(())
    }
}
