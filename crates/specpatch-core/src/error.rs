use std::fmt::Display;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the reconciliation engine can surface.
///
/// All variants are fatal to the current invocation. `PatchApply` carries the
/// content computed before the failing patch so callers can persist it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage: {what}: {source}")]
    Storage {
        what: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot decode {what}: {reason}")]
    Format { what: String, reason: String },

    #[error("patch level {requested} not found; maximum patch level is {max}")]
    PatchLevel { requested: u32, max: u32 },

    #[error("failed to apply patch {patch}")]
    PatchApply { patch: u32, partial: String },

    #[error("patch {patch} is already part of the baseline (baseline patch level is {level})")]
    PatchFolded { patch: u32, level: u32 },

    #[error("illegal state found: {0}")]
    IllegalState(String),

    #[error("{0}")]
    InvalidMode(String),

    #[error("could not acquire lock; session in progress by {holder}, please try again later")]
    LockHeld { holder: String },

    #[error("lock: {0}")]
    Lock(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("upstream: {0}")]
    Upstream(String),

    #[error("config: {0}")]
    Config(String),
}

impl Error {
    pub fn storage(what: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Storage {
            what: what.into(),
            source: source.into(),
        }
    }

    pub fn format(what: impl Into<String>, reason: impl Display) -> Self {
        Error::Format {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Operator instructions for errors that leave a resumable session behind.
    pub fn remediation(&self) -> Option<String> {
        match self {
            Error::PatchApply { patch, .. } => Some(format!(
                "run `specpatch edit --abort` followed by `specpatch edit --patch {patch}` to fix it"
            )),
            _ => None,
        }
    }
}
