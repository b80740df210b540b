//! File-backed full-text index for a personal document collection.
//!
//! Postings are sharded by the SHA-1 of each term under `<root>/.search/index`,
//! every document's term set is kept under `.search/keyword` for cleanup, and
//! `.search/meta.json` maps ids to titles. Queries intersect the posting lists
//! of their terms and rank hits by id, newest first.

pub mod engine;
pub mod error;
pub mod hash;
pub mod index;
pub mod keywords;
pub mod lock;
pub mod meta;
pub mod persist;
pub mod postings;
pub mod query;
pub mod seed;
pub mod tokenizer;

pub use engine::SearchIndex;
pub use error::{Result, StorageError};
pub use index::{DocId, MetaRecord};
pub use seed::{DocumentSource, MarkdownDir, SourceDocument};
