use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Monotonic document id; a larger id means a more recent insert or update.
pub type DocId = u64;

/// The persisted id <-> title mapping of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRecord {
    #[serde(rename = "id-title", default)]
    pub id_title: BTreeMap<DocId, String>,
    #[serde(rename = "title-id", default)]
    pub title_id: BTreeMap<String, DocId>,
    #[serde(rename = "maxid", default)]
    pub max_id: DocId,
}

impl MetaRecord {
    pub fn new() -> Self { Self::default() }

    /// Reserve the next id. The caller persists the record afterwards.
    pub fn next_id(&mut self) -> DocId {
        self.max_id += 1;
        self.max_id
    }

    pub fn id_of(&self, title: &str) -> Option<DocId> {
        self.title_id.get(title).copied()
    }

    pub fn title_of(&self, id: DocId) -> Option<&str> {
        self.id_title.get(&id).map(String::as_str)
    }

    pub fn bind(&mut self, id: DocId, title: &str) {
        self.id_title.insert(id, title.to_string());
        self.title_id.insert(title.to_string(), id);
    }

    /// Remove both directions of `title`'s mapping, returning its id.
    pub fn unbind(&mut self, title: &str) -> Option<DocId> {
        let id = self.title_id.remove(title)?;
        self.id_title.remove(&id);
        Some(id)
    }

    /// Every title, most recent (largest id) first.
    pub fn titles_by_recency(&self) -> Vec<String> {
        self.id_title.values().rev().cloned().collect()
    }

    pub fn len(&self) -> usize { self.id_title.len() }
    pub fn is_empty(&self) -> bool { self.id_title.is_empty() }
}
