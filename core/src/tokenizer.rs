use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

/// Terms longer than this (after trimming) are never indexed or queried.
pub const MAX_TERM_CHARS: usize = 10;

/// Characters stripped from both ends of every token.
const TRIM_CHARS: &str = "\"\n\t `1234567890|～~!@#$%^&*()_-+=,.<>/?':;；：[]{}\\！，￥…（）—《》。？【】、”“";

lazy_static! {
    // CJK runs first so a Latin word never swallows adjacent ideographs.
    static ref RE: Regex = Regex::new(concat!(
        r"(?u)[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]+",
        r"|[[\p{L}\p{N}]--[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]]",
        r"[[\p{L}\p{N}_']--[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]]*",
    ))
    .expect("valid regex");
    static ref CJK: Regex = Regex::new(r"^[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]").expect("valid regex");
}

/// Split text into lower-cased candidate terms using NFKC normalization.
///
/// Words are emitted whole, plus their `_`/`'` separated parts. CJK runs have
/// no word boundaries to go by, so every character and every adjacent pair is
/// emitted instead; a query for any substring of a run then hits its pieces.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for mat in RE.find_iter(&normalized) {
        let token = mat.as_str();
        if CJK.is_match(token) {
            let chars: Vec<char> = token.chars().collect();
            for (i, c) in chars.iter().enumerate() {
                tokens.push(c.to_string());
                if let Some(next) = chars.get(i + 1) {
                    tokens.push([*c, *next].iter().collect());
                }
            }
            continue;
        }
        tokens.push(token.to_string());
        if token.contains(is_joiner) {
            tokens.extend(
                token
                    .split(is_joiner)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string),
            );
        }
    }
    tokens
}

fn is_joiner(c: char) -> bool {
    c == '_' || c == '\''
}

/// Normalize text into the deduplicated term set used both for indexing and
/// for queries.
pub fn split_terms(text: &str) -> BTreeSet<String> {
    tokenize(&text.to_lowercase())
        .into_iter()
        .filter_map(|token| {
            let term = token.trim_matches(|c: char| TRIM_CHARS.contains(c));
            if term.is_empty() || term.chars().count() > MAX_TERM_CHARS {
                return None;
            }
            Some(term.to_string())
        })
        .collect()
}
