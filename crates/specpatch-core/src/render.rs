use crate::document::Document;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Indent used for JSON documents kept in the store.
pub const DEFAULT_JSON_INDENT: usize = 4;

/// Serialization format of a project, fixed at `init` and kept in `ApiConfig`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    pub fn extension(self) -> &'static str {
        self.name()
    }

    /// Render a document. JSON honours `indent` (0 = compact); YAML has a fixed layout.
    /// Output always ends with a newline so patches never carry a
    /// "no newline at end of file" marker.
    pub fn marshal(self, doc: &Document, indent: usize) -> Result<String> {
        match self {
            Format::Json => {
                let mut out = if indent == 0 {
                    serde_json::to_string(doc).map_err(|e| Error::format("document", e))?
                } else {
                    let pad = vec![b' '; indent];
                    let mut buf = Vec::new();
                    let formatter = serde_json::ser::PrettyFormatter::with_indent(&pad);
                    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                    doc.serialize(&mut ser)
                        .map_err(|e| Error::format("document", e))?;
                    String::from_utf8(buf).map_err(|e| Error::format("document", e))?
                };
                out.push('\n');
                Ok(out)
            }
            Format::Yaml => {
                let mut out =
                    serde_yaml::to_string(doc).map_err(|e| Error::format("document", e))?;
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }

    pub fn unmarshal(self, text: &str) -> Result<Document> {
        match self {
            Format::Json => serde_json::from_str(text).map_err(|e| Error::format("json", e)),
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| Error::format("yaml", e)),
        }
    }

    /// Parse then re-render, producing the canonical text for this format.
    pub fn normalize(self, text: &str, indent: usize) -> Result<String> {
        self.marshal(&self.unmarshal(text)?, indent)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(Error::Config(format!(
                "unknown format `{other}` (expected json or yaml)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_uses_requested_indent() {
        let doc = json!({"info": {"version": "1.0"}});
        let out = Format::Json.marshal(&doc, 2).unwrap();
        assert_eq!(out, "{\n  \"info\": {\n    \"version\": \"1.0\"\n  }\n}\n");
    }

    #[test]
    fn json_zero_indent_is_compact() {
        let doc = json!({"a": [1, 2]});
        assert_eq!(Format::Json.marshal(&doc, 0).unwrap(), "{\"a\":[1,2]}\n");
    }

    #[test]
    fn json_preserves_key_order() {
        let doc = Format::Json.unmarshal(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn yaml_decodes_to_same_tree_as_json() {
        let yaml = "info:\n  version: '1.0'\n  x: true\npaths: {}\n";
        let from_yaml = Format::Yaml.unmarshal(yaml).unwrap();
        assert_eq!(
            from_yaml,
            json!({"info": {"version": "1.0", "x": true}, "paths": {}})
        );
        let rendered = Format::Yaml.marshal(&from_yaml, 4).unwrap();
        assert_eq!(Format::Yaml.unmarshal(&rendered).unwrap(), from_yaml);
    }

    #[test]
    fn malformed_input_is_format_error() {
        let err = Format::Json.unmarshal("{not json").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn parse_format_names() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("YAML".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn normalize_reformats_minified_json() {
        let out = Format::Json.normalize(r#"{"a":{"b":1}}"#, 4).unwrap();
        assert_eq!(out, "{\n    \"a\": {\n        \"b\": 1\n    }\n}\n");
    }
}
