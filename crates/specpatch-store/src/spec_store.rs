use specpatch_core::{ApiConfig, Result};
use std::collections::BTreeMap;

/// Stored patches keyed by number (ascending integer order) with their descriptions.
pub type PatchIndex = BTreeMap<u32, String>;

/// Durable home of the baseline, the patch chain and the project `ApiConfig`.
///
/// Writes are last-writer-wins; serialization between operators is the
/// session lock's job, not the store's.
pub trait SpecStore {
    fn read_baseline(&self) -> Result<String>;
    fn write_baseline(&self, content: &str) -> Result<()>;

    fn read_patch(&self, patch: u32) -> Result<String>;
    fn write_patch(&self, patch: u32, content: &str) -> Result<()>;

    /// Empty string when no description was ever written.
    fn read_patch_description(&self, patch: u32) -> Result<String>;
    fn write_patch_description(&self, patch: u32, content: &str) -> Result<()>;

    /// Remove the patch body and its description.
    fn remove_patch(&self, patch: u32) -> Result<()>;
    fn remove_patch_description(&self, patch: u32) -> Result<()>;

    /// Enumerate stored `<n>.patch` keys with their descriptions.
    fn fetch_patches(&self) -> Result<PatchIndex>;

    fn read_api_config(&self) -> Result<ApiConfig>;
    fn write_api_config(&self, config: &ApiConfig) -> Result<()>;

    /// Whether `init` already ran against this store.
    fn has_api_config(&self) -> Result<bool>;
}

/// Parse a `<n>.patch` key name into its patch number.
pub(crate) fn patch_number(name: &str) -> Option<u32> {
    let digits = name.strip_suffix(".patch")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
