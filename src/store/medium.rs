/// Synchronous key/value media the state store persists through.
///
///   - `FileMedium`   — one `<key>.json` file per key in a data directory.
///                      Writes go to `<key>.json.tmp` and are renamed over
///                      the record, so a reader never sees half a write.
///   - `MemoryMedium` — shared in-process map. Clones share storage, which
///                      lets a test keep a handle after giving one away.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("access to `{key}` failed: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("storage is read-only, `{key}` left unchanged")]
    ReadOnly { key: String },
}

/// The persistence capability: addressed by key, values are opaque strings.
pub trait StorageMedium {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ── File-backed ──

pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileMedium { dir: dir.into() }
    }

    /// Pick a writable data directory.
    ///   1. Next to the executable (portable installs)
    ///   2. `~/.local/share/questmap`
    ///   3. CWD
    pub fn default_dir() -> PathBuf {
        if let Ok(exe) = std::env::current_exe() {
            let resolved = exe.canonicalize().unwrap_or(exe);
            if let Some(parent) = resolved.parent() {
                let marker = parent.join(".write_test_questmap");
                if fs::write(&marker, "").is_ok() {
                    let _ = fs::remove_file(&marker);
                    return parent.to_path_buf();
                }
            }
        }

        if let Ok(home) = std::env::var("HOME") {
            let xdg = PathBuf::from(&home).join(".local/share/questmap");
            if fs::create_dir_all(&xdg).is_ok() {
                return xdg;
            }
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    #[allow(dead_code)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageMedium for FileMedium {
    fn get(&self, key: &str) -> Option<String> {
        // Undecodable bytes still count as a present (corrupt) record.
        fs::read(self.record_path(key))
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source: io::Error| StorageError::Io { key: key.to_string(), source };
        let path = self.record_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            io_err(source)
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.record_path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(StorageError::Io { key: key.to_string(), source: e })
            }
            _ => Ok(()),
        }
    }
}

// ── In-memory ──

#[derive(Default)]
struct MemoryInner {
    records: HashMap<String, String>,
    writes: usize,
    quota: Option<usize>,
    read_only: bool,
}

#[derive(Clone, Default)]
pub struct MemoryMedium {
    inner: Rc<RefCell<MemoryInner>>,
}

#[allow(dead_code)]
impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw record without counting it as a write.
    pub fn with_record(self, key: &str, value: &str) -> Self {
        self.inner.borrow_mut().records.insert(key.to_string(), value.to_string());
        self
    }

    /// Reject any value longer than `quota` bytes. `None` lifts the limit.
    pub fn set_quota(&self, quota: Option<usize>) {
        self.inner.borrow_mut().quota = quota;
    }

    /// Refuse every `set` and `remove` while on.
    pub fn set_read_only(&self, read_only: bool) {
        self.inner.borrow_mut().read_only = read_only;
    }

    /// Successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().records.get(key).cloned()
    }
}

impl StorageMedium for MemoryMedium {
    fn get(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.read_only {
            return Err(StorageError::ReadOnly { key: key.to_string() });
        }
        if let Some(quota) = inner.quota {
            if value.len() > quota {
                return Err(StorageError::QuotaExceeded { needed: value.len(), quota });
            }
        }
        inner.records.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.read_only {
            return Err(StorageError::ReadOnly { key: key.to_string() });
        }
        inner.records.remove(key);
        Ok(())
    }
}
