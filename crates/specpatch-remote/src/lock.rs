use crate::http::{self, Reply, AUTH_PROVIDER, AUTH_PROVIDER_HEADER};
use specpatch_core::{AuthGate, Error, Result, SessionLock};

/// Client for the remote lock service: `PUT {url}/trylock/{name}` and
/// `PUT {url}/unlock/{name}`.
pub struct HttpLock {
    base_url: String,
    name: String,
    agent: ureq::Agent,
}

impl HttpLock {
    pub fn new(base_url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            name: name.into(),
            agent: http::agent(),
        }
    }

    fn put(&self, action: &str, auth: &dyn AuthGate) -> Result<Reply> {
        let url = http::join(&self.base_url, &format!("{action}/{}", self.name));
        tracing::debug!("PUT {url}");
        let resp = self
            .agent
            .put(&url)
            .header("Authorization", auth.token().unwrap_or_default())
            .header(AUTH_PROVIDER_HEADER, AUTH_PROVIDER)
            .send_empty()
            .map_err(|e| Error::Lock(format!("lock service unreachable: {e}")))?;
        Reply::read(resp).map_err(|e| Error::Lock(e.to_string()))
    }
}

/// The service reports the current holder as `{"error": {"data": <holder>}}`.
fn holder_of(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/data").map(|d| match d.as_str() {
                Some(s) => s.to_string(),
                None => d.to_string(),
            })
        })
        .unwrap_or_else(|| "<unknown>".to_string())
}

impl SessionLock for HttpLock {
    fn lock(&mut self, auth: &mut dyn AuthGate) -> Result<()> {
        tracing::info!("acquiring lock");
        let mut reply = self.put("trylock", auth)?;
        if reply.status == 401 {
            tracing::warn!("lock service rejected the auth token; logging in again");
            auth.reauthenticate()?;
            reply = self.put("trylock", auth)?;
        }
        match reply.status {
            _ if reply.is_success() => Ok(()),
            409 => Err(Error::LockHeld {
                holder: holder_of(&reply.body),
            }),
            401 => Err(Error::Lock(
                "could not acquire the lock: still unauthorized after logging in again".into(),
            )),
            status => Err(Error::Lock(format!(
                "could not acquire the lock: HTTP status code {status}: {}",
                reply.body
            ))),
        }
    }

    fn unlock(&mut self, auth: &mut dyn AuthGate) -> Result<()> {
        tracing::info!("releasing lock");
        let reply = self.put("unlock", auth)?;
        if reply.is_success() {
            Ok(())
        } else {
            Err(Error::Lock(format!(
                "could not release the lock: HTTP status code {}: {}",
                reply.status, reply.body
            )))
        }
    }
}
