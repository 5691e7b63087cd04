use crate::credentials::CredentialSource;
use crate::http::{self, Reply, AUTH_PROVIDER, AUTH_PROVIDER_HEADER};
use serde::Deserialize;
use specpatch_core::{AuthGate, Error, Result};
use specpatch_store::Settings;
use std::path::PathBuf;

#[derive(Deserialize)]
struct LoginReply {
    jwt: String,
}

/// `AuthGate` backed by the auth service (`POST /login`, `GET /validation`).
///
/// The token lives in the user settings; when a settings path is attached the
/// new credential is written to that file after every successful login.
pub struct HttpAuth {
    base_url: String,
    agent: ureq::Agent,
    settings: Settings,
    settings_path: Option<PathBuf>,
    credentials: Box<dyn CredentialSource>,
}

impl HttpAuth {
    pub fn new(
        base_url: impl Into<String>,
        settings: Settings,
        credentials: Box<dyn CredentialSource>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            agent: http::agent(),
            settings,
            settings_path: None,
            credentials,
        }
    }

    /// Save settings to `path` whenever a new token is obtained.
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn validate(&self, token: &str) -> Result<bool> {
        let resp = self
            .agent
            .get(&http::join(&self.base_url, "validation"))
            .header("Authorization", token)
            .header(AUTH_PROVIDER_HEADER, AUTH_PROVIDER)
            .call()
            .map_err(|e| Error::Auth(format!("auth service unreachable: {e}")))?;
        let reply = Reply::read(resp).map_err(|e| Error::Auth(e.to_string()))?;
        match reply.status {
            200 => Ok(true),
            401 => {
                tracing::warn!(
                    "existing auth token is invalid or expired; you will need to login again"
                );
                Ok(false)
            }
            status => {
                tracing::warn!(
                    "auth validation request failed with HTTP status code {status}: {}",
                    reply.body
                );
                Ok(false)
            }
        }
    }

    fn prompt_login(&mut self) -> Result<()> {
        let (username, password) = self.credentials.credentials(&self.settings.auth.username)?;
        self.login(&username, &password)?;
        Ok(())
    }
}

impl AuthGate for HttpAuth {
    fn check(&mut self) -> Result<()> {
        if self.settings.auth.token.is_empty() {
            return self.prompt_login();
        }
        tracing::info!("validating existing auth token");
        if !self.validate(&self.settings.auth.token)? {
            self.prompt_login()?;
        }
        Ok(())
    }

    fn login(&mut self, username: &str, password: &str) -> Result<String> {
        let body = serde_json::json!({ "username": username, "password": password });
        let resp = self
            .agent
            .post(&http::join(&self.base_url, "login"))
            .header(AUTH_PROVIDER_HEADER, AUTH_PROVIDER)
            .header("Content-Type", "application/json")
            .send(body.to_string())
            .map_err(|e| Error::Auth(format!("auth service unreachable: {e}")))?;
        let reply = Reply::read(resp).map_err(|e| Error::Auth(e.to_string()))?;
        if reply.status == 401 {
            return Err(Error::Auth("login failed: invalid username or password".into()));
        }
        if !reply.is_success() {
            return Err(Error::Auth(format!(
                "login request failed with HTTP status code {}: {}",
                reply.status, reply.body
            )));
        }
        let token = serde_json::from_str::<LoginReply>(&reply.body)
            .map_err(|e| Error::Auth(format!("unexpected login response: {e}")))?
            .jwt;

        self.settings.auth.token = token.clone();
        self.settings.auth.username = username.to_string();
        if let Some(path) = &self.settings_path {
            // `self.settings` may carry env overrides; only the credential is persisted.
            let mut stored = Settings::load(path)?;
            stored.auth = self.settings.auth.clone();
            stored.save(path)?;
        }
        tracing::info!("logged in as {username}");
        Ok(token)
    }

    fn reauthenticate(&mut self) -> Result<()> {
        self.settings.auth.token.clear();
        self.prompt_login()
    }

    fn token(&self) -> Option<String> {
        let token = &self.settings.auth.token;
        (!token.is_empty()).then(|| token.clone())
    }
}
