use crate::spec_store::{patch_number, PatchIndex, SpecStore};
use specpatch_core::{ApiConfig, Error, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-process store keyed like the directory layout. Clones share contents,
/// so a test can keep a handle while a `PatchChain` owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<BTreeMap<String, String>>>,
}

const BASELINE_KEY: &str = "baseline";
const API_CONFIG_KEY: &str = "api-config.json";

fn patch_key(patch: u32) -> String {
    format!("patches/{patch}.patch")
}

fn description_key(patch: u32) -> String {
    format!("patches/{patch}.txt")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get(&self, key: &str) -> Result<String> {
        self.objects().get(key).cloned().ok_or_else(|| {
            Error::storage(
                format!("reading {key}"),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such object"),
            )
        })
    }

    fn put(&self, key: String, content: &str) {
        self.objects().insert(key, content.to_string());
    }

    /// Every stored key, in order. Useful for asserting on layout.
    pub fn keys(&self) -> Vec<String> {
        self.objects().keys().cloned().collect()
    }
}

impl SpecStore for MemoryStore {
    fn read_baseline(&self) -> Result<String> {
        self.get(BASELINE_KEY)
    }

    fn write_baseline(&self, content: &str) -> Result<()> {
        self.put(BASELINE_KEY.to_string(), content);
        Ok(())
    }

    fn read_patch(&self, patch: u32) -> Result<String> {
        self.get(&patch_key(patch))
    }

    fn write_patch(&self, patch: u32, content: &str) -> Result<()> {
        self.put(patch_key(patch), content);
        Ok(())
    }

    fn read_patch_description(&self, patch: u32) -> Result<String> {
        Ok(self.get(&description_key(patch)).unwrap_or_default())
    }

    fn write_patch_description(&self, patch: u32, content: &str) -> Result<()> {
        self.put(description_key(patch), content);
        Ok(())
    }

    fn remove_patch(&self, patch: u32) -> Result<()> {
        self.objects().remove(&patch_key(patch));
        self.remove_patch_description(patch)
    }

    fn remove_patch_description(&self, patch: u32) -> Result<()> {
        self.objects().remove(&description_key(patch));
        Ok(())
    }

    fn fetch_patches(&self) -> Result<PatchIndex> {
        let numbers: Vec<u32> = self
            .objects()
            .keys()
            .filter_map(|k| k.strip_prefix("patches/"))
            .filter_map(patch_number)
            .collect();
        let mut index = PatchIndex::new();
        for n in numbers {
            index.insert(n, self.read_patch_description(n)?);
        }
        Ok(index)
    }

    fn read_api_config(&self) -> Result<ApiConfig> {
        let text = self.get(API_CONFIG_KEY)?;
        serde_json::from_str(&text).map_err(|e| Error::format(API_CONFIG_KEY, e))
    }

    fn write_api_config(&self, config: &ApiConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| Error::format("api config", e))?;
        self.put(API_CONFIG_KEY.to_string(), &json);
        Ok(())
    }

    fn has_api_config(&self) -> Result<bool> {
        Ok(self.objects().contains_key(API_CONFIG_KEY))
    }
}
