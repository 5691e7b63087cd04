//! The patch chain: a baseline document plus numbered unified diffs.
//!
//! The baseline carries a patch-level marker `L` saying patches `1..=L` are
//! already folded into it. Compiling to level `N` replays the stored patches
//! numbered `L+1..=N` in ascending numeric order onto the raw baseline text.

use specpatch_core::{
    patch_level, ApiConfig, Document, Error, Format, Result, Upstream,
};
use specpatch_store::{PatchIndex, SpecStore};

/// Outcome of a replay. `failed_at` names the first patch that did not apply;
/// `content` is then everything computed before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub content: String,
    pub failed_at: Option<u32>,
}

impl Compiled {
    pub fn is_complete(&self) -> bool {
        self.failed_at.is_none()
    }

    /// Turn a partial replay into `Error::PatchApply`.
    pub fn into_result(self) -> Result<String> {
        match self.failed_at {
            None => Ok(self.content),
            Some(patch) => Err(Error::PatchApply {
                patch,
                partial: self.content,
            }),
        }
    }
}

/// Upstream drift ready for review: a unified diff plus the normalized
/// upstream text that would become the new baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamUpdate {
    pub patch: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    UpToDate,
    Drift(UpstreamUpdate),
    /// Compiling to the upstream level hit a patch that no longer applies.
    Broken { patch: u32, partial: String },
}

/// Unified diff turning `from` into `to`.
pub fn unified_diff(from: &str, to: &str) -> String {
    diffy::create_patch(from, to).to_string()
}

fn apply_patch(base: &str, text: &str) -> std::result::Result<String, String> {
    let has_hunks = text.lines().any(|l| l.starts_with("@@"));
    if !has_hunks {
        // Diff of identical texts: a bare header, or nothing at all.
        let header_only = text.lines().any(|l| l.starts_with("--- "));
        return if text.trim().is_empty() || header_only {
            Ok(base.to_string())
        } else {
            Err("not a unified diff".to_string())
        };
    }
    let patch = diffy::Patch::from_str(text).map_err(|e| e.to_string())?;
    diffy::apply(base, &patch).map_err(|e| e.to_string())
}

pub struct PatchChain {
    store: Box<dyn SpecStore>,
    config: ApiConfig,
    baseline: String,
    version_level: u32,
    patches: PatchIndex,
    indent: usize,
}

impl PatchChain {
    /// Read the project config, baseline and patch index from `store`.
    pub fn load(store: Box<dyn SpecStore>, indent: usize) -> Result<Self> {
        let config = store.read_api_config()?;
        let baseline = store.read_baseline()?;
        let doc = config
            .format
            .unmarshal(&baseline)
            .map_err(|e| Error::format("baseline", e))?;
        let version_level = patch_level(&doc);
        let patches = store.fetch_patches()?;
        tracing::debug!(
            "loaded baseline at patch level {version_level} with {} stored patches",
            patches.len()
        );
        Ok(Self {
            store,
            config,
            baseline,
            version_level,
            patches,
            indent,
        })
    }

    /// Fetch `spec_url` and store it as the baseline of a fresh project.
    pub fn init(
        store: Box<dyn SpecStore>,
        upstream: &dyn Upstream,
        spec_url: &str,
        format: Format,
        indent: usize,
    ) -> Result<Self> {
        if store.has_api_config()? {
            return Err(Error::Config(
                "project is already initialized; remove the store to start over".into(),
            ));
        }
        tracing::info!("fetching {spec_url}");
        let doc = upstream.fetch(spec_url)?;
        let config = ApiConfig::new(spec_url, format);
        store.write_baseline(&format.marshal(&doc, indent)?)?;
        store.write_api_config(&config)?;
        Self::load(store, indent)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn format(&self) -> Format {
        self.config.format
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn patches(&self) -> &PatchIndex {
        &self.patches
    }

    pub fn has_patch(&self, patch: u32) -> bool {
        self.patches.contains_key(&patch)
    }

    /// Patch level folded into the baseline.
    pub fn version_patch_level(&self) -> u32 {
        self.version_level
    }

    /// Highest stored patch number, 0 when there are none.
    pub fn max_patch_level(&self) -> u32 {
        self.patches.keys().next_back().copied().unwrap_or(0)
    }

    /// Highest level the chain can reach: stored patches or the baseline
    /// itself, whichever is further.
    pub fn known_patch_level(&self) -> u32 {
        self.max_patch_level().max(self.version_level)
    }

    pub fn get_patch(&self, patch: u32) -> Result<String> {
        if !self.has_patch(patch) {
            return Err(Error::PatchLevel {
                requested: patch,
                max: self.max_patch_level(),
            });
        }
        self.store.read_patch(patch)
    }

    pub fn compile(&self, level: u32) -> Result<Compiled> {
        let known = self.known_patch_level();
        if level > known {
            return Err(Error::PatchLevel {
                requested: level,
                max: known,
            });
        }
        let mut content = self.baseline.clone();
        if level <= self.version_level {
            return Ok(Compiled {
                content,
                failed_at: None,
            });
        }

        let mut expected = self.version_level + 1;
        for &patch in self.patches.range(expected..=level).map(|(n, _)| n) {
            if patch != expected {
                tracing::warn!(
                    "patch chain has a gap: patches {expected}..{} are missing",
                    patch - 1
                );
            }
            tracing::debug!("applying patch {patch}");
            let text = self.store.read_patch(patch)?;
            match apply_patch(&content, &text) {
                Ok(next) => content = next,
                Err(reason) => {
                    tracing::warn!("patch {patch} does not apply: {reason}");
                    return Ok(Compiled {
                        content,
                        failed_at: Some(patch),
                    });
                }
            }
            expected = patch + 1;
        }
        Ok(Compiled {
            content,
            failed_at: None,
        })
    }

    /// Unified diff of everything the stored patches change on top of the baseline.
    pub fn changes(&self) -> Result<String> {
        let compiled = self.compile(self.known_patch_level())?.into_result()?;
        Ok(unified_diff(&self.baseline, &compiled))
    }

    /// Store the diff from `from` to `to` as patch `patch`. Sequencing is the
    /// caller's concern.
    pub fn create_patch(&mut self, patch: u32, from: &str, to: &str) -> Result<()> {
        tracing::info!("saving patch {patch}");
        self.store.write_patch(patch, &unified_diff(from, to))?;
        self.patches.entry(patch).or_default();
        Ok(())
    }

    pub fn describe_patch(&mut self, patch: u32, text: &str) -> Result<()> {
        self.store.write_patch_description(patch, text)?;
        if let Some(desc) = self.patches.get_mut(&patch) {
            *desc = text.to_string();
        }
        Ok(())
    }

    /// Delete a patch and its description. The rest of the chain is neither
    /// renumbered nor re-validated.
    pub fn remove_patch(&mut self, patch: u32) -> Result<()> {
        tracing::warn!(
            "removing patch {patch}; later patches are not renumbered and may no longer apply"
        );
        self.store.remove_patch(patch)?;
        self.patches.remove(&patch);
        Ok(())
    }

    /// Compare the upstream document against the chain.
    pub fn update_check(&self, upstream: &dyn Upstream) -> Result<UpdateCheck> {
        let doc = upstream.fetch(&self.config.spec_url)?;
        let upstream_level = patch_level(&doc);
        if self.version_level > upstream_level {
            return Err(Error::IllegalState(format!(
                "baseline patch level ({}) is greater than the upstream patch level ({upstream_level})",
                self.version_level
            )));
        }
        let known = self.known_patch_level();
        if upstream_level > known {
            return Err(Error::IllegalState(format!(
                "upstream patch level ({upstream_level}) is greater than the maximum patch level ({known})"
            )));
        }

        let format = self.format();
        let upstream_text = format.marshal(&doc, self.indent)?;
        let baseline_text = format.normalize(&self.baseline, self.indent)?;
        if upstream_level == self.version_level && upstream_text == baseline_text {
            return Ok(UpdateCheck::UpToDate);
        }

        let from = if upstream_level > 0 {
            let compiled = self.compile(upstream_level)?;
            if let Some(patch) = compiled.failed_at {
                return Ok(UpdateCheck::Broken {
                    patch,
                    partial: compiled.content,
                });
            }
            // Committed patches keep the operator's layout.
            format.normalize(&compiled.content, self.indent)?
        } else {
            baseline_text
        };
        Ok(UpdateCheck::Drift(UpstreamUpdate {
            patch: unified_diff(&from, &upstream_text),
            content: upstream_text,
        }))
    }

    /// Replace the stored baseline and refresh the folded patch level.
    pub fn update_baseline(&mut self, content: &str) -> Result<()> {
        let doc: Document = self
            .format()
            .unmarshal(content)
            .map_err(|e| Error::format("new baseline", e))?;
        self.store.write_baseline(content)?;
        self.baseline = content.to_string();
        self.version_level = patch_level(&doc);
        tracing::info!("baseline updated to patch level {}", self.version_level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use specpatch_core::set_patch_level;
    use specpatch_store::MemoryStore;

    const INDENT: usize = 4;

    struct FixedUpstream(Document);

    impl Upstream for FixedUpstream {
        fn fetch(&self, _location: &str) -> Result<Document> {
            Ok(self.0.clone())
        }
    }

    fn render(doc: &Document) -> String {
        Format::Json.marshal(doc, INDENT).unwrap()
    }

    /// Document `i` of a chain: a counter field and the marker for `i`.
    fn doc_at(i: u32) -> Document {
        let mut doc = json!({
            "info": {"title": "pets", "version": "1.0"},
            "paths": {},
        });
        for k in 1..=i {
            doc["paths"][format!("/p{k}")] = json!({"get": {"summary": format!("step {k}")}});
        }
        if i > 0 {
            set_patch_level(&mut doc, i).unwrap();
        }
        doc
    }

    /// Store with `doc_at(baseline)` as baseline and patches `1..=patches`
    /// each advancing `doc_at(n-1)` to `doc_at(n)`.
    fn seeded(baseline: u32, patches: u32) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .write_api_config(&ApiConfig::new("https://example.com/spec.json", Format::Json))
            .unwrap();
        store.write_baseline(&render(&doc_at(baseline))).unwrap();
        for n in 1..=patches {
            let diff = unified_diff(&render(&doc_at(n - 1)), &render(&doc_at(n)));
            store.write_patch(n, &diff).unwrap();
        }
        store
    }

    fn load(store: &MemoryStore) -> PatchChain {
        PatchChain::load(Box::new(store.clone()), INDENT).unwrap()
    }

    #[test]
    fn compile_at_folded_level_returns_baseline_verbatim() {
        for level in [0, 1, 3] {
            let store = seeded(level, 0);
            let chain = load(&store);
            assert_eq!(chain.version_patch_level(), level);
            let compiled = chain.compile(level).unwrap();
            assert!(compiled.is_complete());
            assert_eq!(compiled.content, store.read_baseline().unwrap());
        }
    }

    #[test]
    fn compile_beyond_chain_is_patch_level_error() {
        let chain = load(&seeded(0, 2));
        assert!(matches!(
            chain.compile(3),
            Err(Error::PatchLevel {
                requested: 3,
                max: 2
            })
        ));
    }

    #[test]
    fn every_level_reproduces_its_document() {
        // 11 patches: numeric order must not be confused with "1, 10, 11, 2".
        let chain = load(&seeded(0, 11));
        assert_eq!(chain.max_patch_level(), 11);
        for level in 0..=11 {
            let compiled = chain.compile(level).unwrap();
            assert_eq!(compiled.content, render(&doc_at(level)), "level {level}");
        }
    }

    #[test]
    fn folded_patches_are_never_replayed() {
        // Patches 1 and 2 would not apply to a level-2 baseline.
        let store = seeded(2, 3);
        let chain = load(&store);
        assert_eq!(chain.compile(3).unwrap().content, render(&doc_at(3)));
    }

    #[test]
    fn broken_patch_keeps_partial_content() {
        let store = seeded(0, 1);
        let stale = unified_diff("alpha\nbeta\ngamma\n", "alpha\ndelta\ngamma\n");
        store.write_patch(2, &stale).unwrap();
        let chain = load(&store);

        let compiled = chain.compile(2).unwrap();
        assert_eq!(compiled.failed_at, Some(2));
        assert_eq!(compiled.content, render(&doc_at(1)));
        match compiled.into_result() {
            Err(Error::PatchApply { patch, partial }) => {
                assert_eq!(patch, 2);
                assert_eq!(partial, render(&doc_at(1)));
            }
            other => panic!("expected PatchApply, got {other:?}"),
        }
    }

    #[test]
    fn malformed_patch_text_is_a_failure() {
        let store = seeded(0, 1);
        store.write_patch(2, "this is not a diff\n").unwrap();
        let chain = load(&store);
        assert_eq!(chain.compile(2).unwrap().failed_at, Some(2));
    }

    #[test]
    fn created_patch_replays_exactly() {
        let store = seeded(0, 0);
        let mut chain = load(&store);
        let edited = render(&doc_at(1));
        let base = chain.baseline().to_string();
        chain.create_patch(1, &base, &edited).unwrap();
        chain.describe_patch(1, "add /p1").unwrap();

        assert_eq!(chain.compile(1).unwrap().content, edited);
        assert_eq!(load(&store).patches()[&1], "add /p1");
    }

    #[test]
    fn changes_span_the_whole_chain() {
        let chain = load(&seeded(0, 2));
        let changes = chain.changes().unwrap();
        assert!(changes.contains("+        \"/p1\": {"));
        assert!(changes.contains("+        \"/p2\": {"));
        assert!(load(&seeded(0, 0)).changes().unwrap().find("@@").is_none());
    }

    #[test]
    fn remove_patch_does_not_renumber() {
        let store = seeded(0, 3);
        let mut chain = load(&store);
        chain.remove_patch(2).unwrap();
        assert_eq!(chain.patches().keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(load(&store).max_patch_level(), 3);
        assert!(chain.get_patch(2).is_err());
    }

    #[test]
    fn matching_upstream_is_up_to_date() {
        let chain = load(&seeded(2, 2));
        let upstream = FixedUpstream(doc_at(2));
        assert_eq!(chain.update_check(&upstream).unwrap(), UpdateCheck::UpToDate);
    }

    #[test]
    fn baseline_ahead_of_upstream_is_illegal() {
        let chain = load(&seeded(3, 0));
        let upstream = FixedUpstream(doc_at(1));
        assert!(matches!(
            chain.update_check(&upstream),
            Err(Error::IllegalState(_))
        ));
    }

    #[test]
    fn upstream_ahead_of_chain_is_illegal() {
        let chain = load(&seeded(0, 1));
        let upstream = FixedUpstream(doc_at(2));
        assert!(matches!(
            chain.update_check(&upstream),
            Err(Error::IllegalState(_))
        ));
    }

    #[test]
    fn drift_at_level_zero_diffs_against_baseline() {
        let chain = load(&seeded(0, 0));
        let mut newer = doc_at(0);
        newer["info"]["version"] = json!("1.1");
        let upstream = FixedUpstream(newer.clone());

        let UpdateCheck::Drift(update) = chain.update_check(&upstream).unwrap() else {
            panic!("expected drift");
        };
        assert_eq!(update.content, render(&newer));
        let patch = diffy::Patch::from_str(&update.patch).unwrap();
        assert_eq!(diffy::apply(chain.baseline(), &patch).unwrap(), update.content);
    }

    #[test]
    fn drift_at_upstream_level_diffs_against_compiled_content() {
        let chain = load(&seeded(0, 2));
        let mut newer = doc_at(2);
        newer["info"]["version"] = json!("2.0");
        let upstream = FixedUpstream(newer.clone());

        let UpdateCheck::Drift(update) = chain.update_check(&upstream).unwrap() else {
            panic!("expected drift");
        };
        let compiled = chain.compile(2).unwrap().content;
        let patch = diffy::Patch::from_str(&update.patch).unwrap();
        assert_eq!(diffy::apply(&compiled, &patch).unwrap(), render(&newer));
        assert!(!update.patch.contains("+        \"/p1\""));
    }

    #[test]
    fn drift_ignores_layout_of_committed_patches() {
        let store = seeded(0, 0);
        let two_space = Format::Json.marshal(&doc_at(1), 2).unwrap();
        store
            .write_patch(1, &unified_diff(&render(&doc_at(0)), &two_space))
            .unwrap();
        let chain = load(&store);
        assert_eq!(chain.compile(1).unwrap().content, two_space);

        let UpdateCheck::Drift(update) = chain.update_check(&FixedUpstream(doc_at(1))).unwrap()
        else {
            panic!("expected drift: upstream is ahead of the baseline");
        };
        assert!(!update.patch.contains("@@"), "unexpected hunks:\n{}", update.patch);
        assert_eq!(update.content, render(&doc_at(1)));
    }

    #[test]
    fn drift_through_broken_chain_reports_patch() {
        let store = seeded(0, 1);
        store
            .write_patch(2, &unified_diff("a\nb\nc\n", "a\nx\nc\n"))
            .unwrap();
        let chain = load(&store);
        let upstream = FixedUpstream(doc_at(2));
        assert!(matches!(
            chain.update_check(&upstream).unwrap(),
            UpdateCheck::Broken { patch: 2, .. }
        ));
    }

    #[test]
    fn update_baseline_refreshes_level() {
        let store = seeded(0, 2);
        let mut chain = load(&store);
        chain.update_baseline(&render(&doc_at(2))).unwrap();
        assert_eq!(chain.version_patch_level(), 2);
        assert_eq!(load(&store).version_patch_level(), 2);
        assert!(chain.update_baseline("{ not json").is_err());
        assert_eq!(chain.version_patch_level(), 2);
    }

    #[test]
    fn load_reports_missing_and_corrupt_baselines() {
        let store = MemoryStore::new();
        store
            .write_api_config(&ApiConfig::new("spec.json", Format::Json))
            .unwrap();
        assert!(matches!(
            PatchChain::load(Box::new(store.clone()), INDENT),
            Err(Error::Storage { .. })
        ));
        store.write_baseline("{ nope").unwrap();
        assert!(matches!(
            PatchChain::load(Box::new(store), INDENT),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn init_stores_rendered_upstream_once() {
        let store = MemoryStore::new();
        let upstream = FixedUpstream(doc_at(0));
        let chain = PatchChain::init(
            Box::new(store.clone()),
            &upstream,
            "https://example.com/spec.json",
            Format::Json,
            INDENT,
        )
        .unwrap();
        assert_eq!(chain.baseline(), render(&doc_at(0)));
        assert_eq!(chain.config().spec_url, "https://example.com/spec.json");
        assert_eq!(chain.max_patch_level(), 0);

        let again = PatchChain::init(
            Box::new(store),
            &upstream,
            "https://example.com/spec.json",
            Format::Json,
            INDENT,
        );
        assert!(matches!(again, Err(Error::Config(_))));
    }
}
