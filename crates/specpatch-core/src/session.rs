use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ── Status enums ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Idle,
    Edit,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Ok,
    PatchFailed,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Idle => "IDLE",
            Mode::Edit => "EDIT",
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "OK",
            Status::PatchFailed => "PATCH_FAILED",
        })
    }
}

// ── State ──

/// The single in-flight edit of a project.
///
/// Persisted as `{mode, status, data}`; `data` is empty while idle and holds
/// the patch being produced plus its working file while editing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StateRecord", into = "StateRecord")]
pub enum SessionState {
    #[default]
    Idle,
    Edit {
        patch: u32,
        file: PathBuf,
        status: Status,
    },
}

/// Events that move a session between modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// `edit` compiled cleanly and staged a working file.
    BeginEdit { patch: u32, file: PathBuf },
    /// A compile during `edit`, `compile` or `update` hit a broken patch.
    PatchFailed { patch: u32, file: PathBuf },
    /// The patch being edited was stored.
    Commit,
    /// The operator discarded the session.
    Abort,
    /// Forced return to idle from `status --reset`.
    Reset,
}

impl SessionState {
    pub fn mode(&self) -> Mode {
        match self {
            SessionState::Idle => Mode::Idle,
            SessionState::Edit { .. } => Mode::Edit,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            SessionState::Idle => Status::Ok,
            SessionState::Edit { status, .. } => *status,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Patch number and working file of the current edit, if any.
    pub fn editing(&self) -> Option<(u32, &Path)> {
        match self {
            SessionState::Idle => None,
            SessionState::Edit { patch, file, .. } => Some((*patch, file.as_path())),
        }
    }

    /// Fail with `InvalidMode` unless idle. `action` names what was attempted.
    pub fn require_idle(&self, action: &str) -> Result<()> {
        match self {
            SessionState::Idle => Ok(()),
            SessionState::Edit { patch, file, .. } => Err(Error::InvalidMode(format!(
                "cannot {action}: you are already editing patch {patch} in {}; commit or abort first",
                file.display()
            ))),
        }
    }

    /// Fail with `InvalidMode` unless editing; returns the patch and working file.
    pub fn require_edit(&self, action: &str) -> Result<(u32, &Path)> {
        self.editing().ok_or_else(|| {
            Error::InvalidMode(format!(
                "cannot {action}: no edit session found; run `specpatch edit` first"
            ))
        })
    }

    /// Compute the state after `event`, rejecting transitions the mode does not allow.
    pub fn apply(&self, event: Transition) -> Result<SessionState> {
        match (self, event) {
            (SessionState::Idle, Transition::BeginEdit { patch, file }) => {
                Ok(SessionState::Edit {
                    patch,
                    file,
                    status: Status::Ok,
                })
            }
            (SessionState::Edit { .. }, Transition::BeginEdit { .. }) => {
                self.require_idle("start editing").map(|_| self.clone())
            }
            (_, Transition::PatchFailed { patch, file }) => Ok(SessionState::Edit {
                patch,
                file,
                status: Status::PatchFailed,
            }),
            (SessionState::Edit { .. }, Transition::Commit) => Ok(SessionState::Idle),
            (SessionState::Idle, Transition::Commit) => {
                self.require_edit("commit").map(|_| self.clone())
            }
            (SessionState::Edit { .. }, Transition::Abort) => Ok(SessionState::Idle),
            (SessionState::Idle, Transition::Abort) => {
                self.require_edit("abort").map(|_| self.clone())
            }
            (_, Transition::Reset) => Ok(SessionState::Idle),
        }
    }
}

// ── Wire format ──

#[derive(Serialize, Deserialize)]
struct StateRecord {
    mode: Mode,
    #[serde(default)]
    status: Status,
    #[serde(default)]
    data: StateData,
}

#[derive(Default, Serialize, Deserialize)]
struct StateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patch: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<PathBuf>,
}

impl TryFrom<StateRecord> for SessionState {
    type Error = String;

    fn try_from(rec: StateRecord) -> std::result::Result<Self, Self::Error> {
        match rec.mode {
            Mode::Idle => Ok(SessionState::Idle),
            Mode::Edit => match (rec.data.patch, rec.data.file) {
                (Some(patch), Some(file)) if patch > 0 => Ok(SessionState::Edit {
                    patch,
                    file,
                    status: rec.status,
                }),
                (Some(0), _) => Err("invalid state: patch being edited is patch number 0".into()),
                _ => Err("invalid state: EDIT mode requires data.patch and data.file".into()),
            },
        }
    }
}

impl From<SessionState> for StateRecord {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Idle => StateRecord {
                mode: Mode::Idle,
                status: Status::Ok,
                data: StateData::default(),
            },
            SessionState::Edit {
                patch,
                file,
                status,
            } => StateRecord {
                mode: Mode::Edit,
                status,
                data: StateData {
                    patch: Some(patch),
                    file: Some(file),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing(patch: u32) -> SessionState {
        SessionState::Idle
            .apply(Transition::BeginEdit {
                patch,
                file: PathBuf::from("spec.json"),
            })
            .unwrap()
    }

    #[test]
    fn idle_to_edit_records_patch_and_file() {
        let state = editing(3);
        assert_eq!(state.mode(), Mode::Edit);
        assert_eq!(state.status(), Status::Ok);
        assert_eq!(state.editing(), Some((3, Path::new("spec.json"))));
    }

    #[test]
    fn edit_while_editing_is_rejected() {
        let state = editing(1);
        let err = state
            .apply(Transition::BeginEdit {
                patch: 2,
                file: PathBuf::from("other.json"),
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMode(_)));
        assert!(err.to_string().contains("patch 1"));
    }

    #[test]
    fn patch_failure_from_idle_and_edit() {
        for start in [SessionState::Idle, editing(4)] {
            let state = start
                .apply(Transition::PatchFailed {
                    patch: 2,
                    file: PathBuf::from("partial.json"),
                })
                .unwrap();
            assert_eq!(state.status(), Status::PatchFailed);
            assert_eq!(state.editing(), Some((2, Path::new("partial.json"))));
        }
    }

    #[test]
    fn commit_and_abort_return_to_idle() {
        assert!(editing(1).apply(Transition::Commit).unwrap().is_idle());
        assert!(editing(1).apply(Transition::Abort).unwrap().is_idle());
    }

    #[test]
    fn commit_or_abort_while_idle_is_rejected() {
        for event in [Transition::Commit, Transition::Abort] {
            let err = SessionState::Idle.apply(event).unwrap_err();
            assert!(matches!(err, Error::InvalidMode(_)));
        }
    }

    #[test]
    fn reset_always_goes_idle() {
        assert!(SessionState::Idle.apply(Transition::Reset).unwrap().is_idle());
        assert!(editing(5).apply(Transition::Reset).unwrap().is_idle());
    }

    #[test]
    fn idle_serializes_with_empty_data() {
        let json = serde_json::to_value(SessionState::Idle).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"mode": "IDLE", "status": "OK", "data": {}})
        );
    }

    #[test]
    fn failed_edit_roundtrip_json() {
        let state = SessionState::Edit {
            patch: 2,
            file: PathBuf::from("work.json"),
            status: Status::PatchFailed,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"PATCH_FAILED\""));
        let restored: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn edit_without_data_is_rejected_on_load() {
        let res: std::result::Result<SessionState, _> =
            serde_json::from_str(r#"{"mode":"EDIT","status":"OK","data":{}}"#);
        assert!(res.is_err());
        let res: std::result::Result<SessionState, _> = serde_json::from_str(
            r#"{"mode":"EDIT","status":"OK","data":{"patch":0,"file":"x"}}"#,
        );
        assert!(res.is_err());
    }
}
