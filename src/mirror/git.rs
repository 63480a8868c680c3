//! Git operations using a hybrid CLI + libgit2 approach.
//!
//! **CLI (with hardening) for operations that touch the network:**
//! - `clone_repo` - full, non-bare clone of the remote into a working copy
//! - `pull` - fast-forward the working copy's current branch from origin
//!
//! **libgit2 for local read operations:**
//! - `open_repository` - open an existing working copy
//! - `resolve_head` - read the checked-out branch and commit
//! - `repository_exists` - simple path validation

use git2::Repository;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors returned by git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// libgit2 reported an error.
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
    /// Repository path does not contain a git repo.
    #[error("repository not found at {0}")]
    NotFound(String),
    /// Output parsing or unexpected git data.
    #[error("failed to parse git data: {0}")]
    ParseError(String),
    /// Clone failed.
    #[error("clone failed: {0}")]
    CloneError(String),
    /// Pull failed.
    #[error("pull failed: {0}")]
    PullError(String),
    /// Underlying IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid inputs were provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Version-control operations the mirror needs.
///
/// `GitCli` is the production implementation.
pub trait Vcs: Send + Sync {
    /// Create a working copy of `url` at `dest`.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError>;

    /// Bring the working copy at `dest` up to date with its upstream.
    fn pull(&self, dest: &Path) -> Result<(), GitError>;
}

/// Validate that a remote URL is safe to hand to the git CLI.
///
/// Rejects:
/// - Empty strings
/// - Strings starting with `-` (could be interpreted as flags)
/// - Strings containing null bytes or control characters
fn validate_remote(value: &str) -> Result<(), GitError> {
    if value.is_empty() {
        return Err(GitError::InvalidInput(
            "remote URL cannot be empty".to_string(),
        ));
    }
    if value.starts_with('-') {
        return Err(GitError::InvalidInput(
            "remote URL cannot start with '-'".to_string(),
        ));
    }
    if value.bytes().any(|b| b == 0 || b < 0x20) {
        return Err(GitError::InvalidInput(
            "remote URL cannot contain null or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Git CLI wrapper with security hardening.
pub struct GitCli {
    git_path: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Create a new GitCli instance using the system git.
    pub fn new() -> Self {
        Self {
            git_path: "git".into(),
        }
    }

    /// Create a hardened Command with security settings.
    ///
    /// Applies:
    /// - `GIT_LFS_SKIP_SMUDGE=1` - skip LFS file downloads
    /// - `GIT_TERMINAL_PROMPT=0` - disable interactive prompts
    /// - `core.hooksPath=` - disable hooks execution
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.env("GIT_LFS_SKIP_SMUDGE", "1");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.args(["-c", "core.hooksPath="]);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Report the installed git version, if git can be run at all.
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.git_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Vcs for GitCli {
    /// Clone the remote into a fresh working copy.
    ///
    /// If the clone fails and `dest` did not exist beforehand, whatever git
    /// left behind is removed so the next attempt clones again.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        validate_remote(url)?;

        let dest_existed = dest.exists();

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let dest_str = dest.to_str().ok_or_else(|| {
            GitError::ParseError("destination path is not valid UTF-8".to_string())
        })?;

        let output = self
            .command()
            .arg("clone")
            .arg("--")
            .arg(url)
            .arg(dest_str)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !dest_existed {
                let _ = std::fs::remove_dir_all(dest);
            }
            return Err(GitError::CloneError(stderr.trim().to_string()));
        }

        Ok(())
    }

    /// Fetch and fast-forward the current branch from origin.
    ///
    /// The mirror never carries local commits, so a fast-forward is always
    /// what a merge would produce; anything else is reported as a failure.
    fn pull(&self, dest: &Path) -> Result<(), GitError> {
        // Fail early with a clear error if the path is not a working copy.
        open_repository(dest)?;

        let dest_str = dest
            .to_str()
            .ok_or_else(|| GitError::ParseError("mirror path is not valid UTF-8".to_string()))?;

        let output = self
            .command()
            .arg("-C")
            .arg(dest_str)
            .args(["pull", "--ff-only"])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::PullError(stderr.trim().to_string()));
        }

        match open_repository(dest).and_then(|repo| resolve_head(&repo)) {
            Ok((branch, commit)) => log::debug!("mirror at {}@{}", branch, short_sha(&commit)),
            Err(e) => log::warn!("pulled, but could not resolve HEAD: {}", e),
        }

        Ok(())
    }
}

/// Open an existing repository at the given path.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    let repo = Repository::open(path).map_err(|e| {
        if e.code() == git2::ErrorCode::NotFound {
            GitError::NotFound(path.display().to_string())
        } else {
            GitError::Git(e)
        }
    })?;
    Ok(repo)
}

/// Resolve the checked-out branch name and HEAD commit of a working copy.
///
/// Returns (branch_name, commit_sha) e.g. ("master", "abc123...")
pub fn resolve_head(repo: &Repository) -> Result<(String, String), GitError> {
    let head = repo.head()?;
    let ref_name = head
        .name()
        .ok_or_else(|| GitError::ParseError("HEAD reference has no name".to_string()))?;

    let branch_name = ref_name
        .strip_prefix("refs/heads/")
        .ok_or_else(|| {
            GitError::ParseError(format!(
                "unexpected HEAD format: expected 'refs/heads/<branch>', got '{}'",
                ref_name
            ))
        })?
        .to_string();

    let commit = head.peel_to_commit()?;
    Ok((branch_name, commit.id().to_string()))
}

/// Check if a path contains a valid git repository.
pub fn repository_exists(path: &Path) -> bool {
    Repository::open(path).is_ok()
}

/// First 12 characters of a commit SHA, for display.
pub fn short_sha(commit: &str) -> &str {
    if commit.len() > 12 {
        &commit[..12]
    } else {
        commit
    }
}

/// Helpers for tests that drive a real `git` binary against a local upstream.
#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;
    use std::process::Command;

    pub fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub fn require_git() -> bool {
        if git_available() {
            true
        } else {
            eprintln!("skipping test: git binary not available");
            false
        }
    }

    pub fn git(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.name=wallsync",
                "-c",
                "user.email=wallsync@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .output()
            .expect("failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Create a non-bare upstream repository with the given files committed.
    pub fn init_upstream(dir: &Path, files: &[&str]) {
        std::fs::create_dir_all(dir).expect("create upstream dir");
        git(dir, &["init", "-q"]);
        commit_files(dir, files, "initial");
    }

    /// Write empty files (creating parent dirs) and commit them.
    pub fn commit_files(dir: &Path, files: &[&str], message: &str) {
        for file in files {
            let path = dir.join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create parent dir");
            }
            std::fs::write(&path, b"img").expect("write file");
        }
        git(dir, &["add", "-A"]);
        git(dir, &["commit", "-q", "--allow-empty", "-m", message]);
    }
}
