//! Directory-backed slot store.
//!
//! Lets separate processes share a slot: each slot is one file at
//! `<root>/<path segments>/<name>.json`. Writes go to a temporary file that is
//! then renamed over the slot, so a reader sees either the old or the new blob.
//! An entry older than `expires` days (by modification time) reads as absent;
//! `expires == 0` disables expiry.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use tracing::trace;

use crate::core::{Store, StoreError, StoreResult};
use crate::sync::Settings;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Distinguishes temp files of concurrent writers within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-per-slot [`Store`] rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the slot described by `settings`.
    pub fn slot_path(&self, settings: &Settings) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(
            settings
                .path()
                .split('/')
                .filter(|segment| !segment.is_empty() && *segment != "." && *segment != ".."),
        );
        path.push(format!("{}.json", settings.name()));
        path
    }

    fn is_expired(settings: &Settings, modified: SystemTime) -> bool {
        if settings.expires() == 0 {
            return false;
        }
        let lifetime = Duration::from_secs(u64::from(settings.expires()) * SECS_PER_DAY);
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age >= lifetime,
            Err(_) => false,
        }
    }
}

impl Store for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    fn get(&self, settings: &Settings) -> StoreResult<Option<String>> {
        let path = self.slot_path(settings);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if Self::is_expired(settings, metadata.modified()?) {
            trace!(path = %path.display(), "slot file expired");
            return Ok(None);
        }

        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => Err(StoreError::InvalidEncoding),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, settings: &Settings, blob: &str) -> StoreResult<()> {
        let path = self.slot_path(settings);
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "slot path has no parent"))?;
        fs::create_dir_all(dir)?;

        let tmp = dir.join(format!(
            ".{}.json.{}-{}.tmp",
            settings.name(),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = write_and_rename(&tmp, &path, blob) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        trace!(path = %path.display(), bytes = blob.len(), "wrote slot file");
        Ok(())
    }
}

fn write_and_rename(tmp: &Path, path: &Path, blob: &str) -> io::Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(blob.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, path)
}
