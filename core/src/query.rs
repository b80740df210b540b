use crate::error::Result;
use crate::index::{DocId, MetaRecord};
use crate::postings::PostingStore;
use crate::tokenizer::split_terms;
use std::collections::HashMap;

/// Ids present in every list, each paired with its minimum per-list
/// occurrence count. Order of the result is unspecified.
pub fn intersection(lists: &[Vec<DocId>]) -> Vec<(DocId, usize)> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    let mut counts = occurrences(first);
    for list in rest {
        let current = occurrences(list);
        counts.retain(|id, count| match current.get(id) {
            Some(&n) => {
                *count = (*count).min(n);
                true
            }
            None => false,
        });
    }
    counts.into_iter().collect()
}

fn occurrences(list: &[DocId]) -> HashMap<DocId, usize> {
    let mut counts = HashMap::with_capacity(list.len());
    for &id in list {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

/// Run an AND query against `postings`, returning titles most recent first.
///
/// An empty term set lists the whole collection. Terms with no postings, or
/// whose shard cannot be read, are left out of the intersection rather than
/// forcing an empty answer.
pub fn run(query: &str, meta: &MetaRecord, postings: &PostingStore) -> Result<Vec<String>> {
    let terms = split_terms(query);
    if terms.is_empty() {
        return Ok(meta.titles_by_recency());
    }
    let mut lists = Vec::with_capacity(terms.len());
    for term in &terms {
        match postings.read(term) {
            Ok(ids) if !ids.is_empty() => lists.push(ids),
            Ok(_) => {}
            Err(e) => tracing::warn!(term = term.as_str(), error = %e, "skipping unreadable posting list"),
        }
    }
    let mut ids: Vec<DocId> = intersection(&lists).into_iter().map(|(id, _)| id).collect();
    ids.sort_unstable_by(|a, b| b.cmp(a));
    Ok(ids
        .into_iter()
        .filter_map(|id| meta.title_of(id).map(str::to_string))
        .collect())
}
