//! Working copies handed to the operator during an edit session.

use specpatch_core::{patch_level, set_patch_level, Error, Format, Result};
use specpatch_store::write_atomic;
use std::path::{Path, PathBuf};

/// Default working file name inside `dir` for `format`.
pub fn default_work_file(dir: &Path, format: Format) -> PathBuf {
    dir.join(format!("spec-work.{}", format.extension()))
}

/// Default output of `compile` inside `dir` for `format`.
pub fn default_compile_file(dir: &Path, format: Format) -> PathBuf {
    dir.join(format!("spec-compiled.{}", format.extension()))
}

/// Refuse to clobber operator files.
pub fn ensure_absent(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::storage(
            format!("writing {}", path.display()),
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "file already exists; please remove it first",
            ),
        ));
    }
    Ok(())
}

pub fn read_work_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::storage(format!("reading work file {}", path.display()), e))
}

/// Make the document at `path` declare `level`, rewriting the file only when
/// its marker differs. Returns whether the file was rewritten.
pub fn fix_patch_level(path: &Path, level: u32, format: Format, indent: usize) -> Result<bool> {
    let text = read_work_file(path)?;
    let mut doc = format
        .unmarshal(&text)
        .map_err(|e| Error::format(path.display().to_string(), e))?;
    let current = patch_level(&doc);
    if current == level {
        return Ok(false);
    }
    tracing::debug!(
        "setting patch level of {} from {current} to {level}",
        path.display()
    );
    set_patch_level(&mut doc, level)?;
    write_atomic(path, format.marshal(&doc, indent)?.as_bytes())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fix_rewrites_only_on_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("spec.json");
        std::fs::write(&path, r#"{"info":{"version":"1.0"}}"#).unwrap();

        assert!(fix_patch_level(&path, 2, Format::Json, 4).unwrap());
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["info"]["x-sdk-patch-level"], json!(2));

        let before = std::fs::read_to_string(&path).unwrap();
        assert!(!fix_patch_level(&path, 2, Format::Json, 4).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn fix_rejects_unparseable_work_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("spec.json");
        std::fs::write(&path, "{ broken").unwrap();
        assert!(matches!(
            fix_patch_level(&path, 1, Format::Json, 4),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn ensure_absent_refuses_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = default_work_file(tmp.path(), Format::Yaml);
        assert!(path.ends_with("spec-work.yaml"));
        ensure_absent(&path).unwrap();
        std::fs::write(&path, "x").unwrap();
        assert!(matches!(ensure_absent(&path), Err(Error::Storage { .. })));
    }
}
