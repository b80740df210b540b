use crate::error::{Result, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// A document as handed over by the document store for bulk indexing.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub title: String,
    pub modified: SystemTime,
    pub content: String,
}

/// Anything that can enumerate the documents of one collection.
pub trait DocumentSource {
    fn documents(&self) -> Result<Vec<SourceDocument>>;
}

/// The `*.md` files directly inside a directory. A document's title is its
/// file name up to the first `.`.
pub struct MarkdownDir {
    dir: PathBuf,
}

impl MarkdownDir {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }
}

impl DocumentSource for MarkdownDir {
    fn documents(&self) -> Result<Vec<SourceDocument>> {
        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.dir.clone());
                StorageError::io(path, e.into())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let Some(title) = path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|name| name.split('.').next())
                .filter(|t| !t.is_empty())
            else {
                continue;
            };
            let modified = entry
                .metadata()
                .map_err(|e| StorageError::io(path, e.into()))?
                .modified()
                .map_err(|e| StorageError::io(path, e))?;
            let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
            docs.push(SourceDocument { title: title.to_string(), modified, content });
        }
        Ok(docs)
    }
}
