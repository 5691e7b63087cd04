use crate::error::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Decoded API specification tree.
pub type Document = Value;

/// Attribute under `info` recording how many patches a document already contains.
pub const PATCH_LEVEL_KEY: &str = "x-sdk-patch-level";

const INFO_KEY: &str = "info";

/// Legacy `-SDK.<n>` version suffix, compiled once.
static LEGACY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-SDK\.(\d+)").unwrap());

/// Read the patch level marker. Lenient: a missing or non-numeric marker is level 0.
///
/// Documents written before the dedicated attribute existed encode the level
/// as a `-SDK.<n>` suffix on `info.version`; that form is still read when the
/// attribute is absent.
pub fn patch_level(doc: &Document) -> u32 {
    let Some(info) = doc.get(INFO_KEY) else {
        return 0;
    };
    match info.get(PATCH_LEVEL_KEY) {
        Some(marker) => numeric_marker(marker).unwrap_or(0),
        None => info
            .get("version")
            .and_then(Value::as_str)
            .and_then(legacy_level)
            .unwrap_or(0),
    }
}

fn numeric_marker(marker: &Value) -> Option<u32> {
    match marker {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn legacy_level(version: &str) -> Option<u32> {
    LEGACY_SUFFIX
        .captures(version)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Write or overwrite the marker in place, creating `info` when missing.
pub fn set_patch_level(doc: &mut Document, level: u32) -> Result<()> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| Error::format("document", "root is not an object"))?;
    let info = root
        .entry(INFO_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    let info = info
        .as_object_mut()
        .ok_or_else(|| Error::format("document", "`info` is not an object"))?;
    info.insert(PATCH_LEVEL_KEY.to_string(), Value::from(level));
    Ok(())
}
