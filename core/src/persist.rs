use crate::error::{Result, StorageError};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Directory, relative to a collection root, that holds all index state.
pub const INDEX_DIR: &str = ".search";

/// Posting and keyword files above this size are rejected instead of read.
pub const MAX_SHARD_BYTES: u64 = 64 * 1024 * 1024;

/// Separator between entries in posting and keyword files.
pub const SEPARATOR: u8 = 0;

/// Resolves every path of a collection's `.search/` tree.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(collection_root: P) -> Self {
        Self { root: collection_root.as_ref().join(INDEX_DIR) }
    }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn keyword_dir(&self) -> PathBuf { self.root.join("keyword") }
    pub fn index_dir(&self) -> PathBuf { self.root.join("index") }
    pub fn lock_file(&self) -> PathBuf { self.root.join("lock") }
    pub fn keyword(&self, id: u64) -> PathBuf { self.keyword_dir().join(id.to_string()) }
}

/// Create the `.search/`, `keyword/` and `index/` directories if missing.
pub fn ensure_layout(paths: &IndexPaths) -> Result<()> {
    for dir in [paths.root.clone(), paths.keyword_dir(), paths.index_dir()] {
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
    }
    Ok(())
}

/// Read a whole file, returning `None` when it does not exist.
///
/// Files larger than [`MAX_SHARD_BYTES`] fail with [`StorageError::Oversized`]
/// before any allocation happens.
pub fn read_bounded(path: &Path) -> Result<Option<Vec<u8>>> {
    let mut f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    let len = f.metadata().map_err(|e| StorageError::io(path, e))?.len();
    if len > MAX_SHARD_BYTES {
        return Err(StorageError::Oversized { path: path.to_path_buf(), len, limit: MAX_SHARD_BYTES });
    }
    let mut buf = Vec::with_capacity(len as usize);
    // take() guards against the file growing between stat and read
    (&mut f)
        .take(MAX_SHARD_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| StorageError::io(path, e))?;
    if buf.len() as u64 > MAX_SHARD_BYTES {
        return Err(StorageError::Oversized { path: path.to_path_buf(), len: buf.len() as u64, limit: MAX_SHARD_BYTES });
    }
    Ok(Some(buf))
}

/// Replace `path` with `bytes` via temp file + fsync + rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut f = File::create(&tmp).map_err(|e| StorageError::io(&tmp, e))?;
        f.write_all(bytes).map_err(|e| StorageError::io(&tmp, e))?;
        f.sync_all().map_err(|e| StorageError::io(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))
}

/// Remove a file; a file that is already gone is fine.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Split a separator-delimited buffer into its non-empty chunks.
pub fn split_entries(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    buf.split(|b| *b == SEPARATOR).filter(|chunk| !chunk.is_empty())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
