//! Seams to the outside world. Workflows receive these as trait objects so the
//! engine can run headless against fakes.

use crate::document::Document;
use crate::error::Result;

/// Name of the lock guarding edit sessions.
pub const LOCK_NAME: &str = "codex";

/// Credential gate in front of the lock service.
pub trait AuthGate {
    /// Validate the cached credential, logging in when it is missing or expired.
    fn check(&mut self) -> Result<()>;

    /// Exchange username and password for a token and cache it.
    fn login(&mut self, username: &str, password: &str) -> Result<String>;

    /// Drop the cached token and log in again from the configured credential source.
    fn reauthenticate(&mut self) -> Result<()>;

    /// Token to present to remote services, if any.
    fn token(&self) -> Option<String>;
}

/// The single named mutual-exclusion token guarding an edit session.
pub trait SessionLock {
    fn lock(&mut self, auth: &mut dyn AuthGate) -> Result<()>;
    fn unlock(&mut self, auth: &mut dyn AuthGate) -> Result<()>;
}

/// Yes/no question to the operator.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Source of truth the baseline is reconciled against.
pub trait Upstream {
    /// Fetch and decode the document at `location` (URL or path).
    fn fetch(&self, location: &str) -> Result<Document>;
}

/// `--yes`: every question is answered with yes.
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Gate for deployments without an auth service.
#[derive(Debug, Default)]
pub struct NoAuth;

impl AuthGate for NoAuth {
    fn check(&mut self) -> Result<()> {
        Ok(())
    }

    fn login(&mut self, _username: &str, _password: &str) -> Result<String> {
        Ok(String::new())
    }

    fn reauthenticate(&mut self) -> Result<()> {
        Ok(())
    }

    fn token(&self) -> Option<String> {
        None
    }
}
