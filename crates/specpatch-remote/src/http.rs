use std::time::Duration;
use ureq::http::header::CONTENT_TYPE;

const TIMEOUT: Duration = Duration::from_secs(30);

/// Generated specs are large; the ureq default of 10 MiB is not enough.
const BODY_LIMIT: u64 = 64 * 1024 * 1024;

pub(crate) const AUTH_PROVIDER_HEADER: &str = "X-Auth-Provider";
pub(crate) const AUTH_PROVIDER: &str = "ldap";

/// Agent that reports every HTTP status as a reply so callers can branch on it.
pub(crate) fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .http_status_as_error(false)
        .build()
        .new_agent()
}

/// Status, content type and body of a finished request.
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl Reply {
    pub fn read(mut resp: ureq::http::Response<ureq::Body>) -> Result<Self, ureq::Error> {
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .body_mut()
            .with_config()
            .limit(BODY_LIMIT)
            .read_to_string()?;
        Ok(Self {
            status,
            content_type,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
