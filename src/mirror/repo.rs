//! Repository mirror
//!
//! `Mirror` keeps a local working copy of one remote repository current:
//! it clones when the working copy is missing and pulls otherwise. Every
//! transition is written to the shared `StatusTracker`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use super::git::{GitCli, GitError, Vcs};
use super::lock::{MirrorLock, lock_path_for};
use crate::config::ServerConfig;
use crate::status::{MirrorState, StatusTracker};

/// Errors returned by mirror refreshes.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Clone or pull failed.
    #[error(transparent)]
    Git(#[from] GitError),
    /// An underlying IO operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Another process held the mirror lock for too long.
    #[error("mirror lock acquisition failed: {0}")]
    LockFailed(String),
}

/// What a successful refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Cloned,
    Pulled,
}

pub struct Mirror {
    remote_url: String,
    path: PathBuf,
    vcs: Box<dyn Vcs>,
    status: Arc<StatusTracker>,
    /// Held for the whole clone-or-pull so at most one runs at a time.
    gate: Mutex<()>,
    /// `None` waits for the cross-process lock indefinitely.
    lock_timeout: Option<Duration>,
}

impl Mirror {
    /// Create a mirror of `remote_url` at `path`, backed by the git CLI.
    pub fn new(
        remote_url: impl Into<String>,
        path: impl Into<PathBuf>,
        status: Arc<StatusTracker>,
    ) -> Self {
        Self {
            remote_url: remote_url.into(),
            path: path.into(),
            vcs: Box::new(GitCli::new()),
            status,
            gate: Mutex::new(()),
            lock_timeout: None,
        }
    }

    /// Mirror `config.repo_url` into `config.mirror_dir` with the git CLI.
    pub fn from_config(config: &ServerConfig, status: Arc<StatusTracker>) -> Self {
        let mirror = Self::new(&config.repo_url, &config.mirror_dir, status);
        match config.lock_timeout {
            Some(timeout) => mirror.with_lock_timeout(timeout),
            None => mirror,
        }
    }

    /// Swap the version-control backend.
    pub fn with_vcs(mut self, vcs: impl Vcs + 'static) -> Self {
        self.vcs = Box::new(vcs);
        self
    }

    /// Give up on the cross-process lock after `timeout` instead of waiting
    /// for it indefinitely.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Local working copy path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone the repository if it is absent, pull it otherwise.
    ///
    /// Concurrent callers queue on the refresh gate and each run their own
    /// refresh once the previous one finishes. On failure the status is set
    /// to `error` and the error is returned; the working copy is left as git
    /// left it.
    pub fn ensure_fresh(&self) -> Result<Refresh, MirrorError> {
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());

        match self.refresh_locked() {
            Ok(refresh) => Ok(refresh),
            Err(err) => {
                log::error!("Repository refresh failed: {}", err);
                self.status
                    .update(MirrorState::Error, format!("Repository error: {}", err));
                Err(err)
            }
        }
    }

    fn refresh_locked(&self) -> Result<Refresh, MirrorError> {
        let lock_path = lock_path_for(&self.path);
        let acquired = match self.lock_timeout {
            Some(timeout) => MirrorLock::acquire(&lock_path, timeout),
            None => MirrorLock::acquire_blocking(&lock_path),
        };
        let _lock = match acquired {
            Ok(lock) => lock,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                return Err(MirrorError::LockFailed(e.to_string()));
            }
            Err(e) => return Err(MirrorError::Io(e)),
        };

        if !self.path.exists() {
            log::info!("Cloning {} into {}", self.remote_url, self.path.display());
            self.status
                .update(MirrorState::Cloning, "Cloning repository...");
            self.vcs.clone_repo(&self.remote_url, &self.path)?;
            self.status
                .update(MirrorState::Running, "Repository cloned successfully");
            log::info!("Cloned repository");
            Ok(Refresh::Cloned)
        } else {
            log::info!("Pulling repository updates");
            self.status
                .update(MirrorState::Pulling, "Pulling latest changes...");
            self.vcs.pull(&self.path)?;
            self.status
                .update(MirrorState::Running, "Repository updated successfully");
            log::info!("Pulled repository updates");
            Ok(Refresh::Pulled)
        }
    }
}

/// In-memory stand-in for git used by mirror and server tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Clones by writing `files` under the destination; pulls are no-ops.
    #[derive(Clone, Default)]
    pub struct FakeVcs {
        pub files: Vec<String>,
        pub fail_with: Option<String>,
        pub delay: Duration,
        pub clones: Arc<AtomicUsize>,
        pub pulls: Arc<AtomicUsize>,
        in_flight: Arc<AtomicBool>,
        pub overlapped: Arc<AtomicBool>,
    }

    impl FakeVcs {
        pub fn with_files(files: &[&str]) -> Self {
            Self {
                files: files.iter().map(|f| f.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::default()
            }
        }

        fn enter(&self) {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            std::thread::sleep(self.delay);
        }

        fn leave(&self) {
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }

    impl Vcs for FakeVcs {
        fn clone_repo(&self, _url: &str, dest: &Path) -> Result<(), GitError> {
            self.enter();
            self.clones.fetch_add(1, Ordering::SeqCst);
            let result = match &self.fail_with {
                Some(msg) => Err(GitError::CloneError(msg.clone())),
                None => {
                    std::fs::create_dir_all(dest)?;
                    for file in &self.files {
                        let path = dest.join(file);
                        if let Some(parent) = path.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(path, b"img")?;
                    }
                    Ok(())
                }
            };
            self.leave();
            result
        }

        fn pull(&self, _dest: &Path) -> Result<(), GitError> {
            self.enter();
            self.pulls.fetch_add(1, Ordering::SeqCst);
            self.leave();
            match &self.fail_with {
                Some(msg) => Err(GitError::PullError(msg.clone())),
                None => Ok(()),
            }
        }
    }
}
