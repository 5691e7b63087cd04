use crate::http::{self, Reply};
use specpatch_core::{Document, Error, Format, Result, Upstream};
use std::path::Path;

/// Fetches the upstream spec over http(s), or reads it from a local path.
pub struct HttpUpstream {
    agent: ureq::Agent,
}

impl Default for HttpUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpUpstream {
    pub fn new() -> Self {
        Self {
            agent: http::agent(),
        }
    }

    fn get(&self, url: &str) -> Result<Document> {
        tracing::debug!("GET {url}");
        let resp = self
            .agent
            .get(url)
            .call()
            .map_err(|e| Error::Upstream(format!("could not fetch {url}: {e}")))?;
        let reply = Reply::read(resp).map_err(|e| Error::Upstream(format!("{url}: {e}")))?;
        if !reply.is_success() {
            return Err(Error::Upstream(format!(
                "could not fetch {url}: got HTTP status code {}",
                reply.status
            )));
        }
        let hint = reply
            .content_type
            .as_deref()
            .filter(|ct| ct.contains("yaml"))
            .map(|_| Format::Yaml);
        decode(&reply.body, hint)
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Decode with `hint` when known; otherwise JSON first, then YAML.
fn decode(text: &str, hint: Option<Format>) -> Result<Document> {
    match hint {
        Some(format) => format.unmarshal(text),
        None => Format::Json
            .unmarshal(text)
            .or_else(|_| Format::Yaml.unmarshal(text)),
    }
}

fn format_of_path(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Some(Format::Yaml),
        Some("json") => Some(Format::Json),
        _ => None,
    }
}

impl Upstream for HttpUpstream {
    fn fetch(&self, location: &str) -> Result<Document> {
        if is_remote(location) {
            return self.get(location);
        }
        let path = Path::new(location);
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Upstream(format!("cannot read {location}: {e}")))?;
        decode(&text, format_of_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn reads_local_json_and_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let json_path = tmp.path().join("spec.json");
        let yaml_path = tmp.path().join("spec.yaml");
        std::fs::write(&json_path, r#"{"info": {"version": "1.0"}}"#).unwrap();
        std::fs::write(&yaml_path, "info:\n  version: '1.0'\n").unwrap();

        let upstream = HttpUpstream::new();
        let expected = json!({"info": {"version": "1.0"}});
        assert_eq!(upstream.fetch(json_path.to_str().unwrap()).unwrap(), expected);
        assert_eq!(upstream.fetch(yaml_path.to_str().unwrap()).unwrap(), expected);
    }

    #[test]
    fn missing_local_file_is_upstream_error() {
        let result = HttpUpstream::new().fetch("/nonexistent/spec.json");
        assert!(matches!(result, Err(Error::Upstream(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetches_yaml_by_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spec"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/yaml")
                    .set_body_string("info:\n  version: '2.0'\n"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/spec", server.uri());
        let doc = tokio::task::spawn_blocking(move || HttpUpstream::new().fetch(&url))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc, json!({"info": {"version": "2.0"}}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_error_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spec"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/spec", server.uri());
        let result = tokio::task::spawn_blocking(move || HttpUpstream::new().fetch(&url))
            .await
            .unwrap();
        match result {
            Err(Error::Upstream(msg)) => assert!(msg.contains("404")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
