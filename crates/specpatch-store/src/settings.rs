use crate::write_atomic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use specpatch_core::render::DEFAULT_JSON_INDENT;
use specpatch_core::{Error, Result};
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_DIR: &str = "SPECPATCH_CONFIG_DIR";
pub const ENV_STORE_DIR: &str = "SPECPATCH_STORE_DIR";
pub const ENV_LOCK_URL: &str = "SPECPATCH_LOCK_URL";
pub const ENV_AUTH_URL: &str = "SPECPATCH_AUTH_URL";

/// Per-user settings: where the shared store lives, which lock and auth
/// services to talk to, and the cached credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: String,
}

fn default_indent() -> usize {
    DEFAULT_JSON_INDENT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: None,
            lock_url: None,
            auth_url: None,
            auth: AuthSettings::default(),
            indent: DEFAULT_JSON_INDENT,
        }
    }
}

/// Return the per-user settings file: `$SPECPATCH_CONFIG_DIR/config.json`,
/// else `<config dir>/specpatch/config.json` (falls back to `~/.specpatch/`).
pub fn settings_path() -> PathBuf {
    let dir = if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
        PathBuf::from(dir)
    } else if let Some(config) = dirs::config_dir() {
        config.join("specpatch")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".specpatch")
    } else {
        PathBuf::from(".specpatch-config")
    };
    dir.join("config.json")
}

impl Settings {
    /// Read settings from `path`. Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::storage(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&content).map_err(|e| Error::format(path.display().to_string(), e))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::format("settings", e))?;
        write_atomic(path, json.as_bytes())
    }

    /// Overlay environment overrides using `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_STORE_DIR) {
            self.store_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = lookup(ENV_LOCK_URL) {
            self.lock_url = Some(url);
        }
        if let Some(url) = lookup(ENV_AUTH_URL) {
            self.auth_url = Some(url);
        }
    }

    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| Error::format("settings", e))
    }

    /// Whole settings tree as JSON, for display.
    pub fn as_json(&self) -> Result<Value> {
        self.to_value()
    }

    /// Look up a dotted key such as `auth.username`.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut cur = self.to_value()?;
        for part in key.split('.') {
            let next = match cur.get_mut(part) {
                Some(v) => v.take(),
                None => return Ok(None),
            };
            cur = next;
        }
        Ok(Some(cur))
    }

    /// Set a dotted key. The raw value is parsed as bool, number or string and
    /// the result must still be valid settings.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut tree = self.to_value()?;
        let parts: Vec<&str> = key.split('.').collect();
        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| Error::Config("empty settings key".into()))?;

        let mut cur = &mut tree;
        for part in parents {
            let obj = cur
                .as_object_mut()
                .ok_or_else(|| Error::Config(format!("`{key}` does not name a settings object")))?;
            cur = obj
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        let obj = cur
            .as_object_mut()
            .ok_or_else(|| Error::Config(format!("`{key}` does not name a settings object")))?;
        obj.insert(last.to_string(), parse_value(raw));

        *self = serde_json::from_value(tree)
            .map_err(|e| Error::Config(format!("invalid value for `{key}`: {e}")))?;
        Ok(())
    }
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
fn parse_value(s: &str) -> Value {
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                Value::Number(n.into())
            } else {
                Value::String(s.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let s = Settings::load(&tmp.path().join("config.json")).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.indent, DEFAULT_JSON_INDENT);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        let mut s = Settings::default();
        s.lock_url = Some("https://lock.example.com".into());
        s.auth.username = "ops".into();
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn dotted_get_and_set() {
        let mut s = Settings::default();
        s.set("auth.username", "alice").unwrap();
        s.set("lockUrl", "https://lock.example.com").unwrap();
        s.set("indent", "2").unwrap();
        assert_eq!(s.auth.username, "alice");
        assert_eq!(s.lock_url.as_deref(), Some("https://lock.example.com"));
        assert_eq!(s.indent, 2);
        assert_eq!(
            s.get("auth.username").unwrap(),
            Some(Value::String("alice".into()))
        );
        assert_eq!(s.get("auth.nothing").unwrap(), None);
    }

    #[test]
    fn set_rejects_ill_typed_values() {
        let mut s = Settings::default();
        assert!(s.set("indent", "wide").is_err());
        assert_eq!(s.indent, DEFAULT_JSON_INDENT);
    }

    #[test]
    fn env_overrides_apply() {
        let mut s = Settings::default();
        s.apply_env(|k| match k {
            ENV_LOCK_URL => Some("http://lock".into()),
            ENV_STORE_DIR => Some("/srv/specs".into()),
            _ => None,
        });
        assert_eq!(s.lock_url.as_deref(), Some("http://lock"));
        assert_eq!(s.store_dir, Some(PathBuf::from("/srv/specs")));
        assert_eq!(s.auth_url, None);
    }
}
