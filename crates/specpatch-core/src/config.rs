use crate::render::Format;
use serde::{Deserialize, Serialize};

/// Project-wide API settings kept next to the baseline. Immutable after `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub spec_url: String,
    #[serde(default)]
    pub format: Format,
}

impl ApiConfig {
    pub fn new(spec_url: impl Into<String>, format: Format) -> Self {
        Self {
            spec_url: spec_url.into(),
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let cfg = ApiConfig::new("https://api.example.com/spec.json", Format::Yaml);
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["specUrl"], "https://api.example.com/spec.json");
        assert_eq!(json["format"], "yaml");
    }

    #[test]
    fn format_defaults_to_json() {
        let cfg: ApiConfig = serde_json::from_str(r#"{"specUrl":"http://x"}"#).unwrap();
        assert_eq!(cfg.format, Format::Json);
    }
}
