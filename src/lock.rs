//! File-based locking for single-writer safety.
//!
//! Cross-platform (fs2) advisory locks on NAME.lock:
//! - Exclusive: read-write handles; one at a time, no readers alongside.
//! - Shared: read-only handles; any number of them.
//!
//! Lock is released on Drop.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

pub struct LockGuard {
    file: std::fs::File,
    mode: LockMode,
}

impl LockGuard {
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn open_lock_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("open lock file {}", path.display()))
}

/// Try to take the lock without blocking; Err if someone else holds it.
pub fn try_acquire_lock(path: &Path, mode: LockMode) -> Result<LockGuard> {
    let file = open_lock_file(path)?;
    match mode {
        LockMode::Shared => file
            .try_lock_shared()
            .with_context(|| format!("relation is locked for writing: {}", path.display()))?,
        LockMode::Exclusive => file
            .try_lock_exclusive()
            .with_context(|| format!("relation is already open: {}", path.display()))?,
    }
    Ok(LockGuard {
        file,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_excludes_everyone() {
        let path = std::env::temp_dir().join(format!(
            "malh-lock-{}-{}.lock",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        {
            let g = try_acquire_lock(&path, LockMode::Exclusive).unwrap();
            assert_eq!(g.mode(), LockMode::Exclusive);
            assert!(try_acquire_lock(&path, LockMode::Exclusive).is_err());
            assert!(try_acquire_lock(&path, LockMode::Shared).is_err());
        }
        let a = try_acquire_lock(&path, LockMode::Shared).unwrap();
        let _b = try_acquire_lock(&path, LockMode::Shared).unwrap();
        assert!(try_acquire_lock(&path, LockMode::Exclusive).is_err());
        drop(a);
        let _ = std::fs::remove_file(&path);
    }
}
