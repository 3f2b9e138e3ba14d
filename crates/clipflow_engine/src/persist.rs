use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clipflow_logging::clip_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("slot name {0:?} is not a plain file name")]
    InvalidSlot(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure a directory exists; create if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// True when `name` is a single path component with no directory parts.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().is_some_and(|n| n == name) && name != ".."
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let mut tmp = self.begin()?;
        tmp.write_all(content)?;
        self.commit(tmp, filename)
    }

    /// Opens a temp file in the target directory for incremental writes.
    pub(crate) fn begin(&self) -> Result<NamedTempFile, PersistError> {
        ensure_dir(&self.dir)?;
        Ok(NamedTempFile::new_in(&self.dir)?)
    }

    /// Flushes `tmp` and moves it over `{dir}/{filename}`.
    pub(crate) fn commit(
        &self,
        mut tmp: NamedTempFile,
        filename: &str,
    ) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Named persistent key-value slots, one file each, under a state directory.
#[derive(Debug, Clone)]
pub struct SlotStore {
    dir: PathBuf,
}

impl SlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads a slot. A slot that was never written reads as `None`.
    pub fn read(&self, slot: &str) -> Result<Option<String>, PersistError> {
        let path = self.slot_path(slot)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Overwrites a slot atomically.
    pub fn write(&self, slot: &str, content: &str) -> Result<(), PersistError> {
        self.slot_path(slot)?;
        let path = AtomicFileWriter::new(self.dir.clone()).write(slot, content.as_bytes())?;
        clip_debug!("wrote slot {:?} ({} bytes) to {:?}", slot, content.len(), path);
        Ok(())
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, PersistError> {
        if !is_plain_file_name(slot) {
            return Err(PersistError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(slot))
    }
}
