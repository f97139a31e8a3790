use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use tracing::warn;

/// Locks older than this are assumed to belong to a dead process.
const STALE_LOCK_SECS: i64 = 60;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write `content` to `path` via a sibling temp file, fsync, then rename.
/// The temp file is removed if any step before the rename fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let temp_path = dir.join(format!(
        ".{:x}.{}.{}.tmp",
        Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        std::process::id(),
        TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    let written = write_synced(&temp_path, content)
        .with_context(|| format!("cannot write temp file for {}", path.display()))
        .and_then(|()| {
            std::fs::rename(&temp_path, path)
                .with_context(|| format!("cannot rename temp to {}", path.display()))
        });
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    written
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Advisory `.lock` file next to a preference file. Released on drop.
///
/// Created with `create_new`, so at most one holder exists at a time. The
/// file holds the owner PID and the acquisition timestamp; only a lock whose
/// timestamp parses and is older than [`STALE_LOCK_SECS`] is reclaimed.
pub struct PrefsLock {
    lock_path: PathBuf,
}

impl PrefsLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        let lock_path = PathBuf::from(lock_name);

        match create_lock_file(&lock_path) {
            Ok(()) => return Ok(Self { lock_path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("cannot acquire lock {}", lock_path.display()))
            }
        }

        if !is_stale(&lock_path) {
            bail!(
                "preferences are locked by another process (lock: {})",
                lock_path.display()
            );
        }
        warn!(lock = %lock_path.display(), "removing stale preference lock");
        let _ = std::fs::remove_file(&lock_path);

        match create_lock_file(&lock_path) {
            Ok(()) => Ok(Self { lock_path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(anyhow!(
                "preferences are locked by another process (lock: {})",
                lock_path.display()
            )),
            Err(e) => {
                Err(e).with_context(|| format!("cannot acquire lock {}", lock_path.display()))
            }
        }
    }
}

fn create_lock_file(lock_path: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)?;
    let body = format!("{}\n{}\n", std::process::id(), Utc::now().timestamp());
    if let Err(e) = file.write_all(body.as_bytes()) {
        drop(file);
        let _ = std::fs::remove_file(lock_path);
        return Err(e);
    }
    Ok(())
}

/// A lock is stale only when its timestamp is readable and old. An empty or
/// half-written file belongs to a holder that is still creating it.
fn is_stale(lock_path: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(lock_path) else {
        return false;
    };
    content
        .lines()
        .nth(1)
        .and_then(|l| l.trim().parse::<i64>().ok())
        .is_some_and(|ts| Utc::now().timestamp() - ts > STALE_LOCK_SECS)
}

impl Drop for PrefsLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lock_path);
    }
}
