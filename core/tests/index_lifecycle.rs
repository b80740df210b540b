use notedex_core::persist::MAX_SHARD_BYTES;
use notedex_core::postings::PostingStore;
use notedex_core::{MarkdownDir, MetaRecord, SearchIndex};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn open(dir: &Path) -> SearchIndex {
    let index = SearchIndex::new(dir);
    index.init().unwrap();
    index
}

fn read_meta(index: &SearchIndex) -> MetaRecord {
    serde_json::from_slice(&fs::read(index.paths().meta()).unwrap()).unwrap()
}

#[test]
fn init_creates_scaffolding() {
    let dir = tempdir().unwrap();
    open(dir.path());
    assert!(dir.path().join(".search/keyword").is_dir());
    assert!(dir.path().join(".search/index").is_dir());
}

#[test]
fn apple_banana_scenario() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("apple", "a fruit").unwrap();
    index.insert_or_update("banana", "a fruit too").unwrap();

    assert_eq!(index.search("").unwrap(), vec!["banana", "apple"]);
    assert_eq!(index.search("fruit").unwrap(), vec!["banana", "apple"]);
    assert_eq!(index.search("apple").unwrap(), vec!["apple"]);

    assert!(index.delete("banana").unwrap());
    assert_eq!(index.search("").unwrap(), vec!["apple"]);
    assert_eq!(index.search("fruit").unwrap(), vec!["apple"]);
}

#[test]
fn every_extracted_term_finds_the_document() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    let (title, content) = ("Trip plan", "Book 东京 hotel, pack_list & passport!");
    index.insert_or_update(title, content).unwrap();
    for term in notedex_core::tokenizer::split_terms(&format!("{title} {content}")) {
        assert_eq!(index.search(&term).unwrap(), vec![title], "{term}");
    }
}

#[test]
fn delete_removes_postings_and_empty_shards() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("keep", "shared words").unwrap();
    index.insert_or_update("drop", "shared unique zebra").unwrap();
    let postings = PostingStore::new(index.paths());
    let zebra = postings.shard_path("zebra");
    assert!(zebra.exists());

    index.delete("drop").unwrap();
    assert!(index.search("zebra").unwrap().is_empty());
    assert_eq!(index.search("shared").unwrap(), vec!["keep"]);
    assert!(!zebra.exists());
    assert!(!dir.path().join(".search/keyword/2").exists());

    // no shard directory may be left empty
    for entry in fs::read_dir(index.paths().index_dir()).unwrap() {
        let shard_dir = entry.unwrap().path();
        assert!(fs::read_dir(&shard_dir).unwrap().next().is_some(), "{}", shard_dir.display());
    }
}

#[test]
fn deleting_everything_empties_the_index_tree() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("only", "lonely document body").unwrap();
    index.delete("only").unwrap();
    assert_eq!(fs::read_dir(index.paths().index_dir()).unwrap().count(), 0);
    assert_eq!(fs::read_dir(index.paths().keyword_dir()).unwrap().count(), 0);
}

#[test]
fn update_moves_document_to_front() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    assert_eq!(index.insert_or_update("a", "first").unwrap(), 1);
    assert_eq!(index.insert_or_update("b", "second").unwrap(), 2);
    assert_eq!(index.search("").unwrap(), vec!["b", "a"]);

    assert_eq!(index.insert_or_update("a", "rewritten").unwrap(), 3);
    assert_eq!(index.search("").unwrap(), vec!["a", "b"]);
    assert!(index.search("first").unwrap().is_empty());
    assert_eq!(index.search("rewritten").unwrap(), vec!["a"]);

    let meta = read_meta(&index);
    assert_eq!(meta.max_id, 3);
    assert_eq!(meta.id_of("a"), Some(3));
    assert_eq!(meta.title_of(1), None);
}

#[test]
fn terms_are_and_combined() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("one", "red apple").unwrap();
    index.insert_or_update("two", "red cherry").unwrap();
    index.insert_or_update("three", "green apple").unwrap();
    assert_eq!(index.search("red").unwrap().len(), 2);
    assert_eq!(index.search("apple").unwrap().len(), 2);
    assert_eq!(index.search("red apple").unwrap(), vec!["one"]);
    assert!(index.search("green cherry").unwrap().is_empty());
}

#[test]
fn unknown_query_terms_are_ignored() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("one", "red apple").unwrap();
    assert_eq!(index.search("apple zebra").unwrap(), vec!["one"]);
    assert!(index.search("zebra").unwrap().is_empty());
}

#[test]
fn deleting_unknown_title_changes_nothing() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("present", "body").unwrap();
    let before = fs::read(index.paths().meta()).unwrap();
    assert!(!index.delete("absent").unwrap());
    assert_eq!(fs::read(index.paths().meta()).unwrap(), before);
}

#[test]
fn punctuation_query_lists_everything() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("x", "alpha").unwrap();
    index.insert_or_update("y", "beta").unwrap();
    assert_eq!(index.search("").unwrap(), index.search(" ,.!? 123 。").unwrap());
    assert_eq!(index.titles().unwrap(), vec!["y", "x"]);
}

#[test]
fn empty_collection_searches_empty() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    assert!(index.search("").unwrap().is_empty());
    assert!(index.search("anything").unwrap().is_empty());
    assert!(index.is_empty().unwrap());
}

#[test]
fn cjk_substrings_match() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("笔记", "搜索引擎很好用").unwrap();
    index.insert_or_update("other", "unrelated").unwrap();
    assert_eq!(index.search("引擎").unwrap(), vec!["笔记"]);
    assert_eq!(index.search("搜索引擎").unwrap(), vec!["笔记"]);
}

#[test]
fn on_disk_format_matches_layout() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("apple", "fruit").unwrap();

    let meta: serde_json::Value = serde_json::from_slice(&fs::read(index.paths().meta()).unwrap()).unwrap();
    assert_eq!(meta, serde_json::json!({
        "id-title": { "1": "apple" },
        "title-id": { "apple": 1 },
        "maxid": 1
    }));
    assert_eq!(fs::read(dir.path().join(".search/keyword/1")).unwrap(), b"apple\0fruit\0");
    let shard = PostingStore::new(index.paths()).shard_path("fruit");
    assert_eq!(fs::read(shard).unwrap(), b"1\0");
}

#[test]
fn oversized_shard_is_skipped_by_search() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("doc", "fruit salad").unwrap();
    let shard = PostingStore::new(index.paths()).shard_path("fruit");
    fs::File::options().write(true).open(&shard).unwrap().set_len(MAX_SHARD_BYTES + 1).unwrap();
    assert!(index.search("fruit").unwrap().is_empty());
    assert_eq!(index.search("fruit salad").unwrap(), vec!["doc"]);
}

#[test]
fn failed_insert_leaves_no_partial_state() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("keep", "alpha").unwrap();
    let postings = PostingStore::new(index.paths());

    // a regular file where the shard directory of "zzz" belongs
    let blocked = postings.shard_path("zzz").parent().unwrap().to_path_buf();
    fs::write(&blocked, b"in the way").unwrap();

    assert!(index.insert_or_update("bad", "alpha zzz").is_err());
    assert_eq!(index.search("").unwrap(), vec!["keep"]);
    assert_eq!(postings.read("alpha").unwrap(), vec![1]);
    assert!(!postings.shard_path("bad").exists());
    assert!(!dir.path().join(".search/keyword/2").exists());
    assert!(!index.contains("bad").unwrap());

    fs::remove_file(&blocked).unwrap();
    assert_eq!(index.insert_or_update("bad", "alpha zzz").unwrap(), 2);
    assert_eq!(index.search("alpha zzz").unwrap(), vec!["bad"]);
    assert_eq!(index.search("alpha").unwrap(), vec!["bad", "keep"]);
}

#[test]
fn search_on_unbuilt_collection_writes_nothing() {
    let dir = tempdir().unwrap();
    let index = SearchIndex::new(dir.path());
    assert!(index.search("").unwrap().is_empty());
    assert!(index.search("anything").unwrap().is_empty());
    assert!(!index.contains("x").unwrap());
    assert!(!dir.path().join(".search").exists());
}

#[test]
fn contains_and_len_follow_lifecycle() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    index.insert_or_update("a", "x").unwrap();
    index.insert_or_update("b", "y").unwrap();
    assert!(index.contains("a").unwrap());
    assert_eq!(index.len().unwrap(), 2);
    index.delete("a").unwrap();
    assert!(!index.contains("a").unwrap());
    assert_eq!(index.len().unwrap(), 1);
}

#[test]
fn seed_orders_by_modification_time() {
    let docs = tempdir().unwrap();
    let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    for (i, name) in ["newest", "oldest", "middle"].iter().enumerate() {
        let path = docs.path().join(format!("{name}.md"));
        fs::write(&path, format!("shared body {name}")).unwrap();
        let offset = match i { 0 => 300, 1 => 100, _ => 200 };
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(base + Duration::from_secs(offset))
            .unwrap();
    }

    let dir = tempdir().unwrap();
    let index = open(dir.path());
    let source = MarkdownDir::new(docs.path());
    assert!(index.ensure_seeded(&source).unwrap());
    assert_eq!(index.search("shared").unwrap(), vec!["newest", "middle", "oldest"]);

    // already seeded: nothing changes
    assert!(!index.ensure_seeded(&source).unwrap());
    assert_eq!(read_meta(&index).max_id, 3);
}

#[test]
fn concurrent_writers_do_not_lose_updates() {
    let dir = tempdir().unwrap();
    open(dir.path());
    let root = dir.path().to_path_buf();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let root = root.clone();
            std::thread::spawn(move || {
                let index = SearchIndex::new(&root);
                for i in 0..10 {
                    index.insert_or_update(&format!("t{t}-{i}"), "common words").unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let index = SearchIndex::new(&root);
    assert_eq!(index.len().unwrap(), 40);
    assert_eq!(index.search("common").unwrap().len(), 40);
    assert_eq!(read_meta(&index).max_id, 40);
}
