use crate::error::{Result, StorageError};
use crate::index::{DocId, MetaRecord};
use crate::keywords::KeywordStore;
use crate::lock::CollectionLock;
use crate::meta::MetaStore;
use crate::persist::{ensure_layout, read_bounded, IndexPaths};
use crate::postings::PostingStore;
use crate::query;
use crate::seed::DocumentSource;
use crate::tokenizer::split_terms;
use std::path::{Path, PathBuf};

/// Full-text index of one collection, stored under `<root>/.search/`.
///
/// Values are cheap; every call loads the meta record fresh and holds the
/// collection lock for its whole duration.
pub struct SearchIndex {
    collection_root: PathBuf,
    paths: IndexPaths,
    lock: CollectionLock,
}

impl SearchIndex {
    pub fn new<P: AsRef<Path>>(collection_root: P) -> Self {
        let paths = IndexPaths::new(&collection_root);
        let lock = CollectionLock::for_paths(&paths);
        Self { collection_root: collection_root.as_ref().to_path_buf(), paths, lock }
    }

    pub fn paths(&self) -> &IndexPaths { &self.paths }

    /// Create the directory scaffolding if it is missing.
    pub fn init(&self) -> Result<()> {
        ensure_layout(&self.paths)
    }

    /// Index `content` under `title`. An already indexed title is deleted
    /// first and comes back with a fresh, larger id.
    pub fn insert_or_update(&self, title: &str, content: &str) -> Result<DocId> {
        self.lock.exclusive(|| Session::open(&self.paths)?.insert_or_update(title, content))
    }

    /// Remove `title` from the index. Returns `false` if it was not indexed.
    pub fn delete(&self, title: &str) -> Result<bool> {
        self.lock.exclusive(|| Ok(Session::open(&self.paths)?.delete(title)?.is_some()))
    }

    /// Titles matching every known term of `query`, most recent first.
    /// A query without terms lists the whole collection.
    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        self.lock.shared(|| {
            let meta = self.peek_meta()?;
            query::run(query, &meta, &PostingStore::new(&self.paths))
        })
    }

    /// Every indexed title, most recent first.
    pub fn titles(&self) -> Result<Vec<String>> {
        self.search("")
    }

    pub fn contains(&self, title: &str) -> Result<bool> {
        self.lock.shared(|| Ok(self.peek_meta()?.id_of(title).is_some()))
    }

    pub fn len(&self) -> Result<usize> {
        self.lock.shared(|| Ok(self.peek_meta()?.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Index every document of `source`, oldest first, so that id order
    /// follows modification time. Returns the number of documents indexed.
    pub fn seed<S: DocumentSource + ?Sized>(&self, source: &S) -> Result<usize> {
        self.lock.exclusive(|| self.seed_locked(source))
    }

    /// Seed from `source` only if the collection is empty. Returns whether
    /// seeding ran.
    pub fn ensure_seeded<S: DocumentSource + ?Sized>(&self, source: &S) -> Result<bool> {
        self.lock.exclusive(|| {
            if !self.peek_meta()?.is_empty() {
                return Ok(false);
            }
            self.seed_locked(source)?;
            Ok(true)
        })
    }

    fn seed_locked<S: DocumentSource + ?Sized>(&self, source: &S) -> Result<usize> {
        let mut docs = source.documents()?;
        docs.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.title.cmp(&b.title)));
        let mut session = Session::open(&self.paths)?;
        for doc in &docs {
            session.insert_or_update(&doc.title, &doc.content)?;
        }
        tracing::info!(root = %self.collection_root.display(), documents = docs.len(), "collection seeded");
        Ok(docs.len())
    }

    /// Meta record as stored, without creating it when absent.
    fn peek_meta(&self) -> Result<MetaRecord> {
        let path = self.paths.meta();
        match read_bounded(&path)? {
            Some(buf) => serde_json::from_slice(&buf).map_err(|source| StorageError::Meta { path, source }),
            None => Ok(MetaRecord::new()),
        }
    }
}

/// Stores plus the meta record loaded for one locked operation.
struct Session {
    meta_store: MetaStore,
    postings: PostingStore,
    keywords: KeywordStore,
    meta: MetaRecord,
}

impl Session {
    fn open(paths: &IndexPaths) -> Result<Self> {
        ensure_layout(paths)?;
        let meta_store = MetaStore::new(paths);
        let meta = meta_store.load()?;
        Ok(Self { meta_store, postings: PostingStore::new(paths), keywords: KeywordStore::new(paths), meta })
    }

    fn insert_or_update(&mut self, title: &str, content: &str) -> Result<DocId> {
        if self.meta.id_of(title).is_some() {
            self.delete(title)?;
        }
        let terms = split_terms(&format!("{title} {content}"));
        let id = self.meta.next_id();
        self.meta.bind(id, title);

        for (written, term) in terms.iter().enumerate() {
            if let Err(e) = self.postings.append(term, id) {
                // undo the shards already touched so no orphan id survives
                for done in terms.iter().take(written + 1) {
                    let _ = self.postings.remove(done, id);
                }
                self.meta.unbind(title);
                return Err(e);
            }
        }
        if let Err(e) = self.keywords.write(id, &terms).and_then(|_| self.meta_store.save(&self.meta)) {
            for term in &terms {
                let _ = self.postings.remove(term, id);
            }
            let _ = self.keywords.delete(id);
            self.meta.unbind(title);
            return Err(e);
        }
        tracing::info!(title, id, terms = terms.len(), "document indexed");
        Ok(id)
    }

    fn delete(&mut self, title: &str) -> Result<Option<DocId>> {
        let Some(id) = self.meta.id_of(title) else {
            return Ok(None);
        };
        if let Some(terms) = self.keywords.read(id)? {
            for term in &terms {
                self.postings.remove(term, id)?;
            }
        }
        self.keywords.delete(id)?;
        self.meta.unbind(title);
        self.meta_store.save(&self.meta)?;
        tracing::info!(title, id, "document deleted");
        Ok(Some(id))
    }
}
