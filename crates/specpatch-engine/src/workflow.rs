//! Edit, commit, abort, update and patch administration, each composing the
//! lock, the patch chain and the persisted session state in a fixed order.

use crate::chain::{PatchChain, UpdateCheck};
use crate::workfile::{
    default_compile_file, default_work_file, ensure_absent, fix_patch_level, read_work_file,
};
use specpatch_core::{
    AuthGate, Confirm, Error, Result, SessionLock, SessionState, Transition, Upstream,
};
use specpatch_store::{remove_if_exists, write_atomic, PatchIndex, SessionFile};
use std::path::{Path, PathBuf};

/// Outside-world collaborators a workflow runs against.
pub struct Capabilities {
    pub auth: Box<dyn AuthGate>,
    pub lock: Box<dyn SessionLock>,
    pub confirm: Box<dyn Confirm>,
    pub upstream: Box<dyn Upstream>,
}

/// A started edit: the patch being produced and its working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub patch: u32,
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate,
    /// `--check`: the review diff was written, nothing else changed.
    Available { file: PathBuf },
    /// The operator did not accept the new baseline.
    Declined { file: PathBuf },
    Applied { file: PathBuf, level: u32 },
}

pub struct Workflow {
    chain: PatchChain,
    session: SessionFile,
    auth: Box<dyn AuthGate>,
    session_lock: Box<dyn SessionLock>,
    confirm: Box<dyn Confirm>,
    upstream: Box<dyn Upstream>,
    work_dir: PathBuf,
}

impl Workflow {
    /// `work_dir` is where default working files are created.
    pub fn new(
        chain: PatchChain,
        session: SessionFile,
        caps: Capabilities,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            chain,
            session,
            auth: caps.auth,
            session_lock: caps.lock,
            confirm: caps.confirm,
            upstream: caps.upstream,
            work_dir: work_dir.into(),
        }
    }

    pub fn chain(&self) -> &PatchChain {
        &self.chain
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    // ── Lock handling ──

    fn release_lock(&mut self) {
        if let Err(e) = self.session_lock.unlock(self.auth.as_mut()) {
            tracing::warn!("could not release the lock: {e}");
        }
    }

    /// Run `f` under the lock and release it afterwards, whatever happened.
    fn locked<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.auth.check()?;
        self.session_lock.lock(self.auth.as_mut())?;
        let result = f(self);
        self.release_lock();
        result
    }

    /// Run `f` under the lock, keeping it only if `f` left an edit session open.
    fn open_session<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.session_lock.lock(self.auth.as_mut())?;
        let result = f(self);
        if result.is_err() && self.session.state().is_idle() {
            self.release_lock();
        }
        result
    }

    /// Save `partial` to `file` and park the session on the broken patch.
    fn record_failure<T>(&mut self, patch: u32, partial: String, file: PathBuf) -> Result<T> {
        ensure_absent(&file)?;
        self.auth.check()?;
        self.open_session(move |w| {
            write_atomic(&file, partial.as_bytes())?;
            w.session.transition(Transition::PatchFailed {
                patch,
                file: file.clone(),
            })?;
            tracing::warn!(
                "applying patch {patch} failed; edit {} and run `specpatch commit` to fix the patch",
                file.display()
            );
            Err(Error::PatchApply { patch, partial })
        })
    }

    // ── Edit session ──

    /// Resolve the patch number an edit will produce. `0` picks the next new
    /// patch when the baseline has caught up with the chain, the last stored
    /// patch otherwise.
    pub fn edit_target(&self, requested: u32) -> Result<u32> {
        let folded = self.chain.version_patch_level();
        let max = self.chain.max_patch_level();
        let known = self.chain.known_patch_level();
        if requested == 0 {
            return Ok(if folded >= max { known + 1 } else { max });
        }
        if requested <= folded {
            return Err(Error::PatchFolded {
                patch: requested,
                level: folded,
            });
        }
        if requested > known + 1 {
            return Err(Error::PatchLevel {
                requested,
                max: known,
            });
        }
        Ok(requested)
    }

    pub fn edit(&mut self, requested: u32, output: Option<PathBuf>) -> Result<EditSession> {
        self.auth.check()?;
        self.session.state().require_idle("start editing")?;
        let target = self.edit_target(requested)?;
        let file = output.unwrap_or_else(|| default_work_file(&self.work_dir, self.chain.format()));
        ensure_absent(&file)?;
        let level = target.min(self.chain.known_patch_level());

        self.open_session(move |w| {
            let compiled = w.chain.compile(level)?;
            write_atomic(&file, compiled.content.as_bytes())?;
            if let Some(patch) = compiled.failed_at {
                w.session.transition(Transition::PatchFailed {
                    patch,
                    file: file.clone(),
                })?;
                return Err(Error::PatchApply {
                    patch,
                    partial: compiled.content,
                });
            }
            w.session.transition(Transition::BeginEdit {
                patch: target,
                file: file.clone(),
            })?;
            tracing::info!(
                "compiled spec saved as {}; changes will be saved in patch {target}",
                file.display()
            );
            Ok(EditSession {
                patch: target,
                file,
            })
        })
    }

    /// Store the working file as the patch being edited and close the session.
    pub fn commit(&mut self, message: Option<&str>) -> Result<u32> {
        let (patch, file) = {
            let (patch, file) = self.session.state().require_edit("commit")?;
            (patch, file.to_path_buf())
        };
        let previous = self.chain.compile(patch.saturating_sub(1))?.into_result()?;
        fix_patch_level(&file, patch, self.chain.format(), self.chain.indent())?;
        let content = read_work_file(&file)?;

        self.chain.create_patch(patch, &previous, &content)?;
        if let Some(text) = message {
            self.chain.describe_patch(patch, text)?;
        }
        self.session.transition(Transition::Commit)?;
        self.release_lock();
        tracing::info!("removing work file {}", file.display());
        remove_if_exists(&file)?;
        Ok(patch)
    }

    /// Drop the edit session and its working file. Returns `false` when the
    /// operator declined.
    pub fn abort(&mut self) -> Result<bool> {
        let (patch, file) = {
            let (patch, file) = self.session.state().require_edit("abort")?;
            (patch, file.to_path_buf())
        };
        let prompt = format!(
            "abort the edit session for patch {patch}? {} will be erased",
            file.display()
        );
        if !self.confirm.confirm(&prompt) {
            tracing::info!("bailing out");
            return Ok(false);
        }
        self.release_lock();
        if remove_if_exists(&file)? {
            tracing::warn!("removed {}", file.display());
        }
        self.session.transition(Transition::Abort)?;
        Ok(true)
    }

    // ── Upstream ──

    /// Reconcile against upstream. The review diff goes to `output`; with
    /// `check` nothing else is touched.
    pub fn update(&mut self, output: &Path, check: bool) -> Result<UpdateOutcome> {
        let update = match self.chain.update_check(self.upstream.as_ref())? {
            UpdateCheck::UpToDate => {
                tracing::info!("no upstream updates found");
                return Ok(UpdateOutcome::UpToDate);
            }
            UpdateCheck::Broken { patch, partial } => {
                if check {
                    return Err(Error::PatchApply { patch, partial });
                }
                self.session.state().require_idle("update the baseline")?;
                let file = default_work_file(&self.work_dir, self.chain.format());
                return self.record_failure(patch, partial, file);
            }
            UpdateCheck::Drift(update) => update,
        };

        tracing::warn!("updates found upstream");
        self.session.state().require_idle("update the baseline")?;
        write_atomic(output, update.patch.as_bytes())?;
        tracing::info!("upstream update saved to {}", output.display());
        let file = output.to_path_buf();
        if check {
            return Ok(UpdateOutcome::Available { file });
        }
        if !self
            .confirm
            .confirm("replace the baseline with the upstream version?")
        {
            return Ok(UpdateOutcome::Declined { file });
        }

        let content = update.content;
        self.locked(|w| w.chain.update_baseline(&content))?;
        Ok(UpdateOutcome::Applied {
            file,
            level: self.chain.version_patch_level(),
        })
    }

    // ── Read-only views ──

    /// Write the spec compiled to `level` (default: the whole chain).
    pub fn compile_to(&mut self, output: Option<PathBuf>, level: Option<u32>) -> Result<PathBuf> {
        self.session.state().require_idle("compile")?;
        let level = level.unwrap_or_else(|| self.chain.known_patch_level());
        let file =
            output.unwrap_or_else(|| default_compile_file(&self.work_dir, self.chain.format()));
        ensure_absent(&file)?;
        let compiled = self.chain.compile(level)?;
        if let Some(patch) = compiled.failed_at {
            return self.record_failure(patch, compiled.content, file);
        }
        write_atomic(&file, compiled.content.as_bytes())?;
        tracing::info!("compiled spec saved as {}", file.display());
        Ok(file)
    }

    /// Unified diff of everything the stored patches change.
    pub fn changes(&self) -> Result<String> {
        self.chain.changes()
    }

    // ── Patch administration ──

    pub fn list_patches(&self) -> &PatchIndex {
        self.chain.patches()
    }

    pub fn get_patch(&self, patch: u32) -> Result<String> {
        self.chain.get_patch(patch)
    }

    fn require_patch(&self, patch: u32) -> Result<()> {
        if self.chain.has_patch(patch) {
            Ok(())
        } else {
            Err(Error::PatchLevel {
                requested: patch,
                max: self.chain.max_patch_level(),
            })
        }
    }

    /// Set the description of `patch` (default: the last one).
    pub fn describe_patch(&mut self, patch: Option<u32>, text: &str) -> Result<u32> {
        let patch = patch.unwrap_or_else(|| self.chain.max_patch_level());
        self.require_patch(patch)?;
        tracing::info!("saving description of patch {patch}");
        self.locked(|w| w.chain.describe_patch(patch, text))?;
        Ok(patch)
    }

    /// Delete a stored patch after confirmation. Returns `false` when declined.
    pub fn remove_patch(&mut self, patch: u32) -> Result<bool> {
        self.session.state().require_idle("remove a patch")?;
        self.require_patch(patch)?;
        tracing::warn!(
            "removing patch {patch} breaks the chain: later patches keep their numbers and may no longer apply"
        );
        if !self.confirm.confirm(&format!("remove patch {patch}?")) {
            return Ok(false);
        }
        self.locked(|w| w.chain.remove_patch(patch))?;
        Ok(true)
    }

    // ── Session and lock commands ──

    /// Force the session back to idle. The lock is left alone.
    pub fn reset(&mut self) -> Result<bool> {
        if !self.confirm.confirm("reset the session state to IDLE?") {
            return Ok(false);
        }
        self.session.transition(Transition::Reset)?;
        Ok(true)
    }

    pub fn lock(&mut self) -> Result<()> {
        self.auth.check()?;
        self.session_lock.lock(self.auth.as_mut())
    }

    pub fn unlock(&mut self) -> Result<()> {
        self.session_lock.unlock(self.auth.as_mut())
    }
}
