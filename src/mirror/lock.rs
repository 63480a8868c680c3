//! Cross-process guard for the working copy.
//!
//! The in-process refresh gate only serializes threads of one server. Two
//! servers pointed at the same temp directory would still race on `.git`,
//! so the mirror also takes an advisory `flock` on `<mirror>.lock`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(500);

/// Path of the lock file guarding `mirror_dir`: a sibling named `<dir>.lock`.
pub fn lock_path_for(mirror_dir: &Path) -> PathBuf {
    let mut name = mirror_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "mirror".into());
    name.push(".lock");
    mirror_dir.with_file_name(name)
}

/// Exclusive lock on the mirror; released on drop.
#[derive(Debug)]
pub struct MirrorLock {
    file: File,
}

impl MirrorLock {
    /// Block until the lock is held, however long that takes.
    pub fn acquire_blocking(lock_path: &Path) -> io::Result<Self> {
        let file = open_lock_file(lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    /// Block until the lock is held or `timeout` elapses.
    ///
    /// Timing out yields an error of kind `TimedOut`.
    pub fn acquire(lock_path: &Path, timeout: Duration) -> io::Result<Self> {
        let file = open_lock_file(lock_path)?;

        let start = Instant::now();
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file }),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if start.elapsed() >= timeout {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!(
                                "timed out after {:?} waiting for {}",
                                timeout,
                                lock_path.display()
                            ),
                        ));
                    }
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Take the lock only if nobody else holds it.
    #[cfg(test)]
    pub fn try_acquire(lock_path: &Path) -> io::Result<Option<Self>> {
        let file = open_lock_file(lock_path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for MirrorLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn open_lock_file(lock_path: &Path) -> io::Result<File> {
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
}
