use crate::error::{Result, StorageError};
use crate::index::DocId;
use crate::persist::{read_bounded, remove_if_exists, split_entries, write_atomic, IndexPaths, SEPARATOR};
use std::collections::BTreeSet;

/// One file per document id listing the terms that were indexed for it,
/// so delete can find the shards to clean without re-tokenizing.
pub struct KeywordStore {
    paths: IndexPaths,
}

impl KeywordStore {
    pub fn new(paths: &IndexPaths) -> Self {
        Self { paths: paths.clone() }
    }

    pub fn write(&self, id: DocId, terms: &BTreeSet<String>) -> Result<()> {
        let mut buf = Vec::with_capacity(terms.iter().map(|t| t.len() + 1).sum());
        for term in terms {
            buf.extend_from_slice(term.as_bytes());
            buf.push(SEPARATOR);
        }
        write_atomic(&self.paths.keyword(id), &buf)
    }

    /// Terms recorded for `id`, or `None` if no such document was written.
    pub fn read(&self, id: DocId) -> Result<Option<BTreeSet<String>>> {
        let path = self.paths.keyword(id);
        let buf = match read_bounded(&path)? {
            Some(buf) => buf,
            None => return Ok(None),
        };
        let mut terms = BTreeSet::new();
        for chunk in split_entries(&buf) {
            let term = std::str::from_utf8(chunk).map_err(|e| StorageError::Corrupt {
                path: path.clone(),
                detail: e.to_string(),
            })?;
            terms.insert(term.to_string());
        }
        Ok(Some(terms))
    }

    pub fn delete(&self, id: DocId) -> Result<()> {
        remove_if_exists(&self.paths.keyword(id))
    }
}
