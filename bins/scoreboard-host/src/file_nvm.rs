//! File-backed non-volatile memory.
//!
//! Lets the host tool open the same settings image a device would hold. The
//! whole image is kept in memory and written back on every flush.
//!
//! A flush writes a temporary file next to the image and renames it over
//! the image, so a failed flush leaves the previous image intact.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use scoreboard_core::nvm::{NonVolatileMemory, NvmError, ERASED_BYTE};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Settings image stored in a regular file.
#[derive(Debug)]
pub struct FileNvm {
    path: PathBuf,
    cache: Vec<u8>,
    initialized: bool,
}

impl FileNvm {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Vec::new(),
            initialized: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the image; the temporary file must live there
    /// for the rename to stay on one filesystem.
    fn image_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl NonVolatileMemory for FileNvm {
    fn initialize(&mut self, region_size: usize) -> Result<(), NvmError> {
        if !self.initialized {
            self.cache = match fs::read(&self.path) {
                Ok(bytes) => {
                    debug!("Read {} bytes from {}", bytes.len(), self.path.display());
                    bytes
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    info!("No image at {}, starting erased", self.path.display());
                    Vec::new()
                }
                Err(e) => return Err(e.into()),
            };
            self.initialized = true;
        }
        if self.cache.len() < region_size {
            self.cache.resize(region_size, ERASED_BYTE);
        }
        Ok(())
    }

    fn region_size(&self) -> usize {
        self.cache.len()
    }

    fn read_byte(&self, offset: usize) -> u8 {
        self.cache[offset]
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self.cache[offset] = value;
    }

    fn flush(&mut self) -> Result<(), NvmError> {
        if !self.initialized {
            return Err(NvmError::NotInitialized);
        }

        let mut staged = NamedTempFile::new_in(self.image_dir())?;
        staged.write_all(&self.cache)?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| NvmError::Io(e.error))?;

        debug!("Wrote {} bytes to {}", self.cache.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoreboard_core::{PersistentSettingsStore, SettingsError};
    use tempfile::TempDir;

    fn write_credentials(store: &mut PersistentSettingsStore<FileNvm>, ssid: &str) {
        store.set_ssid(ssid).unwrap();
        store.set_password("secret").unwrap();
        store.commit().unwrap();
    }

    #[test]
    fn test_missing_file_starts_erased() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nv.bin");

        let mut nvm = FileNvm::new(&path);
        nvm.initialize(16).unwrap();
        assert_eq!(nvm.region_size(), 16);
        assert_eq!(nvm.read_byte(0), ERASED_BYTE);
        assert!(!path.exists());
    }

    #[test]
    fn test_flush_before_initialize_fails() {
        let dir = TempDir::new().unwrap();
        let mut nvm = FileNvm::new(dir.path().join("nv.bin"));
        assert!(matches!(nvm.flush(), Err(NvmError::NotInitialized)));
    }

    #[test]
    fn test_settings_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nv.bin");

        let mut store = PersistentSettingsStore::new(FileNvm::new(&path)).unwrap();
        write_credentials(&mut store, "hall");
        drop(store);

        assert_eq!(fs::metadata(&path).unwrap().len(), 512);

        let store = PersistentSettingsStore::new(FileNvm::new(&path)).unwrap();
        assert!(store.is_valid());
        assert_eq!(store.ssid().unwrap(), "hall");
        assert_eq!(store.password().unwrap(), "secret");
    }

    #[test]
    fn test_flush_replaces_image_instead_of_rewriting_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nv.bin");
        let snapshot = dir.path().join("snapshot.bin");

        let mut store = PersistentSettingsStore::new(FileNvm::new(&path)).unwrap();
        write_credentials(&mut store, "first");

        // A hard link pins the committed image's contents.
        fs::hard_link(&path, &snapshot).unwrap();
        write_credentials(&mut store, "second");

        let old = PersistentSettingsStore::new(FileNvm::new(&snapshot)).unwrap();
        assert_eq!(old.ssid().unwrap(), "first");
        let new = PersistentSettingsStore::new(FileNvm::new(&path)).unwrap();
        assert_eq!(new.ssid().unwrap(), "second");

        // No staging files are left next to the image.
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_failed_rename_reports_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nv.bin");

        let mut store = PersistentSettingsStore::new(FileNvm::new(&path)).unwrap();
        write_credentials(&mut store, "kept");

        // Put a non-empty directory where the image was so the rename fails.
        fs::rename(&path, dir.path().join("kept.bin")).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), b"x").unwrap();

        store.set_ssid("lost").unwrap();
        let err = store.commit().unwrap_err();
        assert!(matches!(
            err,
            SettingsError::PersistFailure(NvmError::Io(_))
        ));
        assert_eq!(store.ssid().unwrap(), "lost");

        // The directory is untouched and no staging file leaked.
        assert!(path.is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
        assert_eq!(fs::read_dir(&path).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_flush_keeps_previous_image() {
        let dir = TempDir::new().unwrap();
        let device_dir = dir.path().join("device");
        fs::create_dir(&device_dir).unwrap();
        let path = device_dir.join("nv.bin");
        let snapshot = dir.path().join("snapshot.bin");

        let mut store = PersistentSettingsStore::new(FileNvm::new(&path)).unwrap();
        write_credentials(&mut store, "kept");
        let committed = fs::read(&path).unwrap();
        fs::hard_link(&path, &snapshot).unwrap();

        // With the directory gone the staging file cannot be created.
        fs::remove_dir_all(&device_dir).unwrap();
        store.set_ssid("lost").unwrap();
        let err = store.commit().unwrap_err();
        assert!(matches!(
            err,
            SettingsError::PersistFailure(NvmError::Io(_))
        ));

        assert_eq!(fs::read(&snapshot).unwrap(), committed);
        let reopened = PersistentSettingsStore::new(FileNvm::new(&snapshot)).unwrap();
        assert_eq!(reopened.ssid().unwrap(), "kept");
    }

    #[test]
    fn test_unreadable_image_fails_open() {
        let dir = TempDir::new().unwrap();
        // A directory where the image should be cannot be read as bytes.
        let result = PersistentSettingsStore::new(FileNvm::new(dir.path()));
        assert!(matches!(
            result,
            Err(SettingsError::Nvm(NvmError::Io(_)))
        ));
    }
}
