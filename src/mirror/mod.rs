//! Local mirror of the wallpaper repository

mod git;
mod lock;
mod repo;

pub use git::{GitCli, GitError, Vcs, open_repository, repository_exists, resolve_head, short_sha};
pub use repo::{Mirror, MirrorError, Refresh};

#[cfg(test)]
pub(crate) use repo::testing::FakeVcs;
