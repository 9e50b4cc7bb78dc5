use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::StoreError;

/// Where the commands file lives.
pub trait Store {
    /// `Ok(None)` when nothing has been written yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    fn save(&self, bytes: &[u8]) -> Result<(), StoreError>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for FileStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                action: "reading",
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                action: "creating directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, bytes).map_err(|source| StoreError::Io {
            action: "writing",
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store. Clones share the same contents, which lets a caller keep
/// a handle after giving one to a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    contents: RefCell<Option<Vec<u8>>>,
    fail_saves: Cell<bool>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.inner.contents.replace(Some(bytes.into()));
        store
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.inner.contents.borrow().clone()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.fail_saves.set(fail);
    }

    pub fn save_count(&self) -> usize {
        self.inner.saves.get()
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.contents())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if self.inner.fail_saves.get() {
            return Err(StoreError::Unavailable("memory store is read-only".into()));
        }
        self.inner.contents.replace(Some(bytes.to_vec()));
        self.inner.saves.set(self.inner.saves.get() + 1);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested/deeper/commands.json"));
        store.save(b"[]").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(&b"[]"[..]));
    }

    #[test]
    fn file_store_reports_path_on_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let store = FileStore::new(blocker.join("commands.json"));
        let err = store.save(b"[]").unwrap_err();
        assert!(err.to_string().contains("file"), "{err}");
    }

    #[test]
    fn memory_store_shares_contents_between_clones() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save(b"abc").unwrap();
        assert_eq!(handle.contents().as_deref(), Some(&b"abc"[..]));
        handle.set_fail_saves(true);
        assert!(store.save(b"def").is_err());
        assert_eq!(store.save_count(), 1);
    }
}
