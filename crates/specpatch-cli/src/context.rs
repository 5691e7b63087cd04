use crate::prompt::TerminalConfirm;
use anyhow::Context as _;
use specpatch_core::{AlwaysConfirm, AuthGate, Confirm, NoAuth, SessionLock, LOCK_NAME};
use specpatch_engine::{Capabilities, PatchChain, Workflow};
use specpatch_remote::{EnvOrPrompt, HttpAuth, HttpLock, HttpUpstream};
use specpatch_store::settings::settings_path;
use specpatch_store::{
    FsStore, LocalLock, ProjectPaths, SessionFile, Settings, SpecStore, WorkspaceGuard,
};
use std::path::{Path, PathBuf};

/// Everything one invocation needs: where the project lives, the user
/// settings and the global flags.
pub struct Context {
    pub cwd: PathBuf,
    pub paths: ProjectPaths,
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub yes: bool,
}

impl Context {
    pub fn load(yes: bool) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let root = ProjectPaths::find_root(&cwd).unwrap_or_else(|| cwd.clone());
        let settings_path = settings_path();
        let mut settings = Settings::load(&settings_path)?;
        settings.apply_env(|k| std::env::var(k).ok());
        Ok(Self {
            paths: ProjectPaths::discover(root),
            cwd,
            settings,
            settings_path,
            yes,
        })
    }

    /// Interpret an operator-supplied path relative to where they ran us.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.paths.resolve_store_dir(self.settings.store_dir.as_deref())
    }

    pub fn store(&self) -> Box<dyn SpecStore> {
        Box::new(FsStore::new(self.store_dir()))
    }

    pub fn require_project(&self) -> anyhow::Result<()> {
        if !self.paths.is_initialized() {
            anyhow::bail!("not a specpatch project (no .specpatch/ found); run `specpatch init` first");
        }
        Ok(())
    }

    fn holder(&self) -> String {
        let username = &self.settings.auth.username;
        if !username.is_empty() {
            return username.clone();
        }
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn auth(&self) -> Box<dyn AuthGate> {
        match &self.settings.auth_url {
            Some(url) => Box::new(
                HttpAuth::new(url.clone(), self.settings.clone(), Box::new(EnvOrPrompt))
                    .persist_to(&self.settings_path),
            ),
            None => Box::new(NoAuth),
        }
    }

    pub fn session_lock(&self) -> Box<dyn SessionLock> {
        match &self.settings.lock_url {
            Some(url) => Box::new(HttpLock::new(url.clone(), LOCK_NAME)),
            None => Box::new(LocalLock::new(self.store_dir(), LOCK_NAME, self.holder())),
        }
    }

    pub fn confirm(&self) -> Box<dyn Confirm> {
        if self.yes {
            Box::new(AlwaysConfirm)
        } else {
            Box::new(TerminalConfirm)
        }
    }

    pub fn chain(&self) -> anyhow::Result<PatchChain> {
        self.require_project()?;
        let store_dir = self.store_dir();
        PatchChain::load(self.store(), self.settings.indent)
            .with_context(|| format!("loading project from {}", store_dir.display()))
    }

    /// Open the project for a state-changing command. The guard must be held
    /// for as long as the workflow is in use.
    pub fn workflow(&self) -> anyhow::Result<(WorkspaceGuard, Workflow)> {
        self.require_project()?;
        let guard = WorkspaceGuard::acquire(&self.paths)?;
        let chain = self.chain()?;
        let session = SessionFile::load(&self.paths.state_json)?;
        let caps = Capabilities {
            auth: self.auth(),
            lock: self.session_lock(),
            confirm: self.confirm(),
            upstream: Box::new(HttpUpstream::new()),
        };
        Ok((guard, Workflow::new(chain, session, caps, &self.cwd)))
    }
}
