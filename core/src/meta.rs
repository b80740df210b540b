use crate::error::{Result, StorageError};
use crate::index::MetaRecord;
use crate::persist::{read_bounded, write_atomic, IndexPaths};
use std::path::PathBuf;

/// Reads and writes `.search/meta.json`.
pub struct MetaStore {
    path: PathBuf,
}

impl MetaStore {
    pub fn new(paths: &IndexPaths) -> Self {
        Self { path: paths.meta() }
    }

    /// Load the record, creating and persisting an empty one if absent.
    pub fn load(&self) -> Result<MetaRecord> {
        match read_bounded(&self.path)? {
            Some(buf) => serde_json::from_slice(&buf)
                .map_err(|source| StorageError::Meta { path: self.path.clone(), source }),
            None => {
                let meta = MetaRecord::new();
                self.save(&meta)?;
                Ok(meta)
            }
        }
    }

    pub fn save(&self, meta: &MetaRecord) -> Result<()> {
        let json = serde_json::to_vec(meta)
            .map_err(|source| StorageError::Meta { path: self.path.clone(), source })?;
        write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::ensure_layout;
    use tempfile::tempdir;

    #[test]
    fn first_load_persists_empty_record() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        ensure_layout(&paths).unwrap();
        let store = MetaStore::new(&paths);
        assert_eq!(store.load().unwrap(), MetaRecord::new());
        assert!(paths.meta().exists());
    }

    #[test]
    fn corrupt_json_is_an_error() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        ensure_layout(&paths).unwrap();
        std::fs::write(paths.meta(), b"{not json").unwrap();
        assert!(matches!(MetaStore::new(&paths).load(), Err(StorageError::Meta { .. })));
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        ensure_layout(&paths).unwrap();
        let store = MetaStore::new(&paths);
        let mut meta = store.load().unwrap();
        let id = meta.next_id();
        meta.bind(id, "notes");
        store.save(&meta).unwrap();
        assert_eq!(store.load().unwrap().id_of("notes"), Some(1));
    }
}
