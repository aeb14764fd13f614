//! JSON-file storage for the library
//!
//! Every read takes a shared advisory lock on `<data_file>.lock`; every
//! read-modify-write cycle holds the exclusive lock for its whole duration
//! and replaces the file atomically (temp file in the same directory,
//! fsync, rename). An in-process mutex serializes writers inside one
//! server, the file lock serializes separate processes.

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use crate::library::Library;
use crate::metrics;
use fs4::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Storage accessor for one library file
pub struct LibraryStore {
    path: PathBuf,
    lock_path: Option<PathBuf>,
    writer: Mutex<()>,
}

#[derive(Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Holds an advisory lock until dropped
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path, mode: LockMode) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| AppError::Storage {
                message: format!("Failed to open lock file {}: {}", path.display(), e),
            })?;

        match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        }
        .map_err(|e| AppError::Storage {
            message: format!("Failed to lock {}: {}", path.display(), e),
        })?;

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl LibraryStore {
    /// Create a store for the configured file; nothing is read yet
    pub fn new(config: &StorageConfig) -> Self {
        let lock_path = config.file_locking.then(|| {
            let mut name = config.data_file.as_os_str().to_owned();
            name.push(".lock");
            PathBuf::from(name)
        });

        Self {
            path: config.data_file.clone(),
            lock_path,
            writer: Mutex::new(()),
        }
    }

    /// Store at an explicit path with locking enabled
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::new(&StorageConfig {
            data_file: path.into(),
            file_locking: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self, mode: LockMode) -> Result<Option<FileLock>> {
        match &self.lock_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                FileLock::acquire(path, mode).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Read the library; a missing file is an empty library
    pub fn load(&self) -> Result<Library> {
        let _guard = self.lock(LockMode::Shared)?;
        self.read_unlocked()
    }

    fn read_unlocked(&self) -> Result<Library> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Library file missing, starting empty");
                return Ok(Library::new());
            }
            Err(e) => {
                return Err(AppError::Storage {
                    message: format!("Failed to read {}: {}", self.path.display(), e),
                })
            }
        };

        let library = Library::from_json(&raw).map_err(|e| AppError::CorruptLibrary {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        metrics::record_library_size(library.paper_count(), library.citation_count());
        Ok(library)
    }

    fn write_unlocked(&self, library: &Library) -> Result<()> {
        let json = library.to_json_pretty()?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| AppError::Storage {
            message: format!("Failed to replace {}: {}", self.path.display(), e.error),
        })?;

        metrics::record_library_size(library.paper_count(), library.citation_count());
        Ok(())
    }

    /// Overwrite the file with `library`
    pub fn save(&self, library: &Library) -> Result<()> {
        let _writer = self.writer.lock().map_err(|_| AppError::Internal {
            message: "Library writer mutex poisoned".to_string(),
        })?;
        let _guard = self.lock(LockMode::Exclusive)?;
        self.write_unlocked(library)
    }

    /// Load, apply `f`, and save if `f` succeeds, all under the exclusive lock.
    ///
    /// When `f` fails nothing is written.
    pub fn update<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Library) -> Result<T>,
    {
        let start = Instant::now();
        let _writer = self.writer.lock().map_err(|_| AppError::Internal {
            message: "Library writer mutex poisoned".to_string(),
        })?;
        let _guard = self.lock(LockMode::Exclusive)?;

        let mut library = self.read_unlocked()?;
        let value = f(&mut library)?;
        self.write_unlocked(&library)?;

        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_mutation(operation, elapsed);
        info!(
            operation,
            path = %self.path.display(),
            papers = library.paper_count(),
            citations = library.citation_count(),
            "Library updated"
        );
        Ok(value)
    }

    /// Check the file can be read and parsed
    pub fn check(&self) -> Result<()> {
        self.load().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperDraft;
    use std::sync::Arc;

    fn draft(title: &str) -> PaperDraft {
        PaperDraft {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_is_empty_library() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::at(dir.path().join("library.json"));

        let library = store.load().unwrap();
        assert!(library.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        fs::write(&path, "{ not json").unwrap();

        let err = LibraryStore::at(&path).load().unwrap_err();
        assert!(matches!(err, AppError::CorruptLibrary { .. }));
    }

    #[test]
    fn test_load_save_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        let store = LibraryStore::at(&path);

        store
            .update("seed", |lib| {
                lib.add_paper(draft("A"))?;
                lib.add_paper(draft("B"))?;
                lib.add_citation("0002", "0001")?;
                Ok(())
            })
            .unwrap();
        let before = fs::read(&path).unwrap();

        let library = store.load().unwrap();
        store.save(&library).unwrap();
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_free_form_fields_keep_their_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        let raw = r#"{
  "papers": [
    {
      "id": "0001",
      "title": "Origins",
      "journal": "Nature",
      "author": "Curie",
      "pi": "Curie",
      "year": "1998",
      "url": "",
      "authors": []
    }
  ],
  "citations": []
}
"#;
        fs::write(&path, raw).unwrap();

        let store = LibraryStore::at(&path);
        let library = store.load().unwrap();
        store.save(&library).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), raw);
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        let store = LibraryStore::at(&path);
        store.update("seed", |lib| lib.add_paper(draft("A")).map(|_| ())).unwrap();
        let before = fs::read(&path).unwrap();

        let err = store
            .update("delete_paper", |lib| lib.delete_paper("missing"))
            .unwrap_err();
        assert!(matches!(err, AppError::PaperNotFound { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::at(dir.path().join("library.json"));
        store.update("seed", |lib| lib.add_paper(draft("A")).map(|_| ())).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["library.json", "library.json.lock"]);
    }

    #[test]
    fn test_unlocked_store_creates_no_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::new(&StorageConfig {
            data_file: dir.path().join("library.json"),
            file_locking: false,
        });
        store.update("seed", |lib| lib.add_paper(draft("A")).map(|_| ())).unwrap();
        assert!(!dir.path().join("library.json.lock").exists());
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LibraryStore::at(dir.path().join("library.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .update("add_paper", |lib| {
                            lib.add_paper(PaperDraft {
                                id: Some(format!("p{}", i)),
                                title: format!("Paper {}", i),
                                ..Default::default()
                            })
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.load().unwrap().paper_count(), 8);
    }

    #[test]
    fn test_reads_keyed_file_and_rewrites_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        fs::write(
            &path,
            r#"{"papers": {"0001": {"title": "A", "author": "X", "year": "2001", "url": ""}}, "citations": {"0001": []}}"#,
        )
        .unwrap();

        let store = LibraryStore::at(&path);
        let library = store.load().unwrap();
        store.save(&library).unwrap();

        let rewritten: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(rewritten["papers"].is_array());
        assert_eq!(rewritten["papers"][0]["id"], "0001");
        assert_eq!(rewritten["citations"], serde_json::json!([]));
    }
}
