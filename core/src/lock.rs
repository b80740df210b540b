use crate::error::{Result, StorageError};
use crate::persist::IndexPaths;
use fs2::FileExt;
use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

lazy_static! {
    static ref REGISTRY: Mutex<HashMap<PathBuf, Weak<RwLock<()>>>> = Mutex::new(HashMap::new());
}

/// Serializes mutations of one collection.
///
/// Two layers: a process-wide `RwLock` per collection root (threads in this
/// process), then an advisory lock on `.search/lock` (other processes).
/// Writers hold both exclusively; readers hold both shared.
#[derive(Clone)]
pub struct CollectionLock {
    inner: Arc<RwLock<()>>,
    file: PathBuf,
}

impl CollectionLock {
    pub fn for_paths(paths: &IndexPaths) -> Self {
        let key = registry_key(&paths.root);
        let mut registry = REGISTRY.lock();
        registry.retain(|_, lock| lock.strong_count() > 0);
        let inner = match registry.get(&key).and_then(Weak::upgrade) {
            Some(inner) => inner,
            None => {
                let inner = Arc::new(RwLock::new(()));
                registry.insert(key, Arc::downgrade(&inner));
                inner
            }
        };
        Self { inner, file: paths.lock_file() }
    }

    pub fn exclusive<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = self.inner.write();
        if let Some(dir) = self.file.parent() {
            fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
        }
        let file = self.open_rw().map_err(|source| StorageError::Lock { path: self.file.clone(), source })?;
        FileExt::lock_exclusive(&file).map_err(|source| StorageError::Lock { path: self.file.clone(), source })?;
        let out = f();
        let _ = FileExt::unlock(&file);
        out
    }

    /// Readers never create anything: without `.search/` there is nothing
    /// to protect, and a lock file that cannot be created is only opened.
    pub fn shared<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = self.inner.read();
        let file = match self.open_for_read()? {
            Some(file) => file,
            None => return f(),
        };
        FileExt::lock_shared(&file).map_err(|source| StorageError::Lock { path: self.file.clone(), source })?;
        let out = f();
        let _ = FileExt::unlock(&file);
        out
    }

    fn open_rw(&self) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.file)
    }

    fn open_for_read(&self) -> Result<Option<File>> {
        if !self.file.parent().is_some_and(Path::is_dir) {
            return Ok(None);
        }
        if let Ok(file) = self.open_rw() {
            return Ok(Some(file));
        }
        match File::open(&self.file) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Lock { path: self.file.clone(), source }),
        }
    }
}

/// Absolute path of `dir` with its longest existing prefix canonicalized,
/// so a collection maps to one key whether or not `.search/` exists yet.
fn registry_key(dir: &Path) -> PathBuf {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        env::current_dir().map(|cwd| cwd.join(dir)).unwrap_or_else(|_| dir.to_path_buf())
    };
    for ancestor in absolute.ancestors() {
        if let Ok(canonical) = ancestor.canonicalize() {
            return match absolute.strip_prefix(ancestor) {
                Ok(rest) if !rest.as_os_str().is_empty() => canonical.join(rest),
                _ => canonical,
            };
        }
    }
    absolute
}
