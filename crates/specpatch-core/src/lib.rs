pub mod capability;
pub mod config;
pub mod document;
pub mod error;
pub mod render;
pub mod session;

pub use capability::{
    AlwaysConfirm, AuthGate, Confirm, NoAuth, SessionLock, Upstream, LOCK_NAME,
};
pub use config::ApiConfig;
pub use document::{patch_level, set_patch_level, Document, PATCH_LEVEL_KEY};
pub use error::{Error, Result};
pub use render::Format;
pub use session::{Mode, SessionState, Status, Transition};
