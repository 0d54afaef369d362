use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::ProgressError;
use crate::ports::outbound::SessionStore;

/// File-backed slot store.
///
/// Each slot is one JSON file in `dir`, replaced atomically via a temp file
/// and rename so readers never observe a torn write.
pub struct FileSessionStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        tracing::debug!("[progress] Session store at {}", dir.display());
        Self {
            dir,
            write_lock: Mutex::new(()),
        }
    }

    /// Directory holding the slot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, ProgressError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !slot.starts_with('.');
        if !valid {
            return Err(ProgressError::StorageWrite(format!(
                "invalid slot name {slot:?}"
            )));
        }
        Ok(self.dir.join(format!("{slot}.json")))
    }
}

impl SessionStore for FileSessionStore {
    fn read_slot(&self, slot: &str) -> Result<Option<String>, ProgressError> {
        let path = self
            .slot_path(slot)
            .map_err(|e| ProgressError::StorageRead(e.to_string()))?;

        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProgressError::StorageRead(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }

    fn write_slot(&self, slot: &str, contents: &str) -> Result<(), ProgressError> {
        let path = self.slot_path(slot)?;
        let io_err = |e: std::io::Error| ProgressError::StorageWrite(format!("{}: {e}", path.display()));

        let _guard = self.write_lock.lock();
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Write atomically via temp file
        let temp_path = path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&temp_path, &path).map_err(io_err)?;

        Ok(())
    }
}
