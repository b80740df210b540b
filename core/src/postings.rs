use crate::error::{Result, StorageError};
use crate::hash::TermHash;
use crate::index::DocId;
use crate::persist::{read_bounded, remove_if_exists, split_entries, write_atomic, IndexPaths, SEPARATOR};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Posting lists sharded as `index/<XX>/<38 hex>` by term digest.
///
/// Each file holds decimal ids terminated by NUL, in append order.
pub struct PostingStore {
    dir: PathBuf,
}

impl PostingStore {
    pub fn new(paths: &IndexPaths) -> Self {
        Self { dir: paths.index_dir() }
    }

    fn shard_dir(&self, hash: &TermHash) -> PathBuf {
        self.dir.join(hash.shard_dir())
    }

    /// Full path of the shard holding `term`'s postings.
    pub fn shard_path(&self, term: &str) -> PathBuf {
        let hash = TermHash::of(term);
        self.shard_dir(&hash).join(hash.shard_file())
    }

    pub fn append(&self, term: &str, id: DocId) -> Result<()> {
        let hash = TermHash::of(term);
        let dir = self.shard_dir(&hash);
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        let path = dir.join(hash.shard_file());
        let mut record = id.to_string().into_bytes();
        record.push(SEPARATOR);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        f.write_all(&record).map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!(term, id, "posting appended");
        Ok(())
    }

    /// Ids recorded for `term`; a missing shard means no postings.
    pub fn read(&self, term: &str) -> Result<Vec<DocId>> {
        let path = self.shard_path(term);
        match read_bounded(&path)? {
            Some(buf) => decode_ids(&path, &buf),
            None => Ok(Vec::new()),
        }
    }

    /// Drop every occurrence of `id` from `term`'s shard, deleting the file
    /// and then its directory once they are empty.
    pub fn remove(&self, term: &str, id: DocId) -> Result<()> {
        let hash = TermHash::of(term);
        let dir = self.shard_dir(&hash);
        let path = dir.join(hash.shard_file());
        let buf = match read_bounded(&path)? {
            Some(buf) => buf,
            None => return Ok(()),
        };
        let needle = id.to_string();
        let mut rest = Vec::with_capacity(buf.len());
        for chunk in split_entries(&buf) {
            if chunk == needle.as_bytes() {
                continue;
            }
            rest.extend_from_slice(chunk);
            rest.push(SEPARATOR);
        }
        if rest.is_empty() {
            remove_if_exists(&path)?;
            remove_dir_if_empty(&dir)?;
        } else if rest.len() != buf.len() {
            write_atomic(&path, &rest)?;
        }
        tracing::debug!(term, id, "posting removed");
        Ok(())
    }
}

fn decode_ids(path: &Path, buf: &[u8]) -> Result<Vec<DocId>> {
    split_entries(buf)
        .map(|chunk| {
            std::str::from_utf8(chunk)
                .ok()
                .and_then(|s| s.parse::<DocId>().ok())
                .ok_or_else(|| StorageError::Corrupt {
                    path: path.to_path_buf(),
                    detail: format!("bad id chunk {:?}", String::from_utf8_lossy(chunk)),
                })
        })
        .collect()
}

fn remove_dir_if_empty(dir: &Path) -> Result<()> {
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StorageError::io(dir, e)),
    };
    if entries.next().is_some() {
        return Ok(());
    }
    match fs::remove_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(dir, e)),
    }
}
