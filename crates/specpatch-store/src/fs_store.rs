use crate::spec_store::{patch_number, PatchIndex, SpecStore};
use crate::{remove_if_exists, write_atomic};
use specpatch_core::{ApiConfig, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const BASELINE_FILE: &str = "baseline";
const PATCHES_DIR: &str = "patches";
const API_CONFIG_FILE: &str = "api-config.json";

/// Directory-backed store. The directory may live on a shared mount.
///
/// ```text
/// <root>/api-config.json
/// <root>/baseline
/// <root>/patches/<n>.patch
/// <root>/patches/<n>.txt
/// ```
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn baseline_path(&self) -> PathBuf {
        self.root.join(BASELINE_FILE)
    }

    fn patches_dir(&self) -> PathBuf {
        self.root.join(PATCHES_DIR)
    }

    fn patch_path(&self, patch: u32) -> PathBuf {
        self.patches_dir().join(format!("{patch}.patch"))
    }

    fn description_path(&self, patch: u32) -> PathBuf {
        self.patches_dir().join(format!("{patch}.txt"))
    }

    fn api_config_path(&self) -> PathBuf {
        self.root.join(API_CONFIG_FILE)
    }

    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::storage(format!("reading {}", path.display()), e))
    }
}

impl SpecStore for FsStore {
    fn read_baseline(&self) -> Result<String> {
        self.read(&self.baseline_path())
    }

    fn write_baseline(&self, content: &str) -> Result<()> {
        write_atomic(&self.baseline_path(), content.as_bytes())
    }

    fn read_patch(&self, patch: u32) -> Result<String> {
        self.read(&self.patch_path(patch))
    }

    fn write_patch(&self, patch: u32, content: &str) -> Result<()> {
        write_atomic(&self.patch_path(patch), content.as_bytes())
    }

    fn read_patch_description(&self, patch: u32) -> Result<String> {
        let path = self.description_path(patch);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::debug!("no description for patch {patch} ({}): {e}", path.display());
                Ok(String::new())
            }
        }
    }

    fn write_patch_description(&self, patch: u32, content: &str) -> Result<()> {
        write_atomic(&self.description_path(patch), content.as_bytes())
    }

    fn remove_patch(&self, patch: u32) -> Result<()> {
        remove_if_exists(&self.patch_path(patch))?;
        self.remove_patch_description(patch)
    }

    fn remove_patch_description(&self, patch: u32) -> Result<()> {
        remove_if_exists(&self.description_path(patch)).map(|_| ())
    }

    fn fetch_patches(&self) -> Result<PatchIndex> {
        let dir = self.patches_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PatchIndex::new()),
            Err(e) => return Err(Error::storage(format!("listing {}", dir.display()), e)),
        };

        let mut index = PatchIndex::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::storage(format!("listing {}", dir.display()), e))?;
            let name = entry.file_name();
            if let Some(n) = name.to_str().and_then(patch_number) {
                index.insert(n, self.read_patch_description(n)?);
            }
        }
        Ok(index)
    }

    fn read_api_config(&self) -> Result<ApiConfig> {
        let path = self.api_config_path();
        let text = self.read(&path)?;
        serde_json::from_str(&text).map_err(|e| Error::format(path.display().to_string(), e))
    }

    fn write_api_config(&self, config: &ApiConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| Error::format("api config", e))?;
        write_atomic(&self.api_config_path(), json.as_bytes())
    }

    fn has_api_config(&self) -> Result<bool> {
        Ok(self.api_config_path().is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specpatch_core::Format;

    fn store() -> (tempfile::TempDir, FsStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsStore::new(tmp.path().join("store"));
        (tmp, store)
    }

    #[test]
    fn baseline_roundtrip() {
        let (_tmp, store) = store();
        store.write_baseline("{}\n").unwrap();
        assert_eq!(store.read_baseline().unwrap(), "{}\n");
    }

    #[test]
    fn missing_baseline_is_storage_error() {
        let (_tmp, store) = store();
        assert!(matches!(store.read_baseline(), Err(Error::Storage { .. })));
    }

    #[test]
    fn fetch_patches_sorts_numerically_and_ignores_other_files() {
        let (_tmp, store) = store();
        for n in [10, 2, 1] {
            store.write_patch(n, "x").unwrap();
        }
        store.write_patch_description(2, "second").unwrap();
        write_atomic(&store.patches_dir().join("foo.txt"), b"bar").unwrap();
        write_atomic(&store.patches_dir().join("notes.patch"), b"bar").unwrap();

        let index = store.fetch_patches().unwrap();
        let numbers: Vec<u32> = index.keys().copied().collect();
        assert_eq!(numbers, [1, 2, 10]);
        assert_eq!(index[&2], "second");
        assert_eq!(index[&1], "");
    }

    #[test]
    fn no_patches_dir_is_empty_chain() {
        let (_tmp, store) = store();
        assert!(store.fetch_patches().unwrap().is_empty());
    }

    #[test]
    fn missing_description_reads_empty() {
        let (_tmp, store) = store();
        store.write_patch(1, "x").unwrap();
        assert_eq!(store.read_patch_description(1).unwrap(), "");
    }

    #[test]
    fn remove_patch_drops_body_and_description() {
        let (_tmp, store) = store();
        store.write_patch(1, "x").unwrap();
        store.write_patch_description(1, "d").unwrap();
        store.remove_patch(1).unwrap();
        assert!(store.read_patch(1).is_err());
        assert_eq!(store.read_patch_description(1).unwrap(), "");
        assert!(store.fetch_patches().unwrap().is_empty());
    }

    #[test]
    fn api_config_roundtrip() {
        let (_tmp, store) = store();
        assert!(!store.has_api_config().unwrap());
        let cfg = ApiConfig::new("https://example.com/spec.yaml", Format::Yaml);
        store.write_api_config(&cfg).unwrap();
        assert!(store.has_api_config().unwrap());
        assert_eq!(store.read_api_config().unwrap(), cfg);
    }
}
