//! Where usernames and passwords come from when the auth service asks for them.

use specpatch_core::{Error, Result};
use std::io::{BufRead, Write};

pub const ENV_USERNAME: &str = "SPECPATCH_USERNAME";
pub const ENV_PASSWORD: &str = "SPECPATCH_PASSWORD";

pub trait CredentialSource {
    /// Produce a `(username, password)` pair. `username_hint` is the last
    /// username that logged in, possibly empty.
    fn credentials(&self, username_hint: &str) -> Result<(String, String)>;
}

/// Fixed credentials, e.g. from `login --username --password`.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    pub username: String,
    pub password: String,
}

impl CredentialSource for StaticCredentials {
    fn credentials(&self, _username_hint: &str) -> Result<(String, String)> {
        Ok((self.username.clone(), self.password.clone()))
    }
}

/// `SPECPATCH_USERNAME` / `SPECPATCH_PASSWORD`, for CI.
#[derive(Debug, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    pub(crate) fn lookup(
        get: impl Fn(&str) -> Option<String>,
        username_hint: &str,
    ) -> Option<(String, String)> {
        let password = get(ENV_PASSWORD).filter(|p| !p.is_empty())?;
        let username = get(ENV_USERNAME)
            .filter(|u| !u.is_empty())
            .or_else(|| (!username_hint.is_empty()).then(|| username_hint.to_string()))?;
        Some((username, password))
    }
}

impl CredentialSource for EnvCredentials {
    fn credentials(&self, username_hint: &str) -> Result<(String, String)> {
        Self::lookup(|k| std::env::var(k).ok(), username_hint).ok_or_else(|| {
            Error::Auth(format!("{ENV_USERNAME} and {ENV_PASSWORD} are not set"))
        })
    }
}

/// Ask on the terminal. The password is read without echo.
#[derive(Debug, Default)]
pub struct PromptCredentials;

impl CredentialSource for PromptCredentials {
    fn credentials(&self, username_hint: &str) -> Result<(String, String)> {
        let io_err = |e: std::io::Error| Error::Auth(format!("cannot read credentials: {e}"));
        if username_hint.is_empty() {
            eprint!("username: ");
        } else {
            eprint!("username [{username_hint}]: ");
        }
        std::io::stderr().flush().map_err(io_err)?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).map_err(io_err)?;
        let mut username = line.trim().to_string();
        if username.is_empty() {
            username = username_hint.to_string();
        }
        if username.is_empty() {
            return Err(Error::Auth("no username given".into()));
        }
        let password = rpassword::prompt_password("password: ").map_err(io_err)?;
        Ok((username, password))
    }
}

/// Environment first, terminal prompt otherwise.
#[derive(Debug, Default)]
pub struct EnvOrPrompt;

impl CredentialSource for EnvOrPrompt {
    fn credentials(&self, username_hint: &str) -> Result<(String, String)> {
        if let Some(pair) = EnvCredentials::lookup(|k| std::env::var(k).ok(), username_hint) {
            tracing::debug!("using credentials from the environment");
            return Ok(pair);
        }
        tracing::info!("please login using your directory account");
        PromptCredentials.credentials(username_hint)
    }
}
