use sha1::{Digest, Sha1};
use std::fmt::Write;

/// SHA-1 digest of a normalized term, used only to address its shard.
///
/// Two distinct terms with the same digest would share a shard; that case
/// is not detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermHash([u8; 20]);

impl TermHash {
    pub fn of(term: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(term.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Shard directory name: the first digest byte as 2 hex chars.
    pub fn shard_dir(&self) -> String { to_hex(&self.0[..1]) }

    /// Shard file name: the remaining 19 bytes as 38 hex chars.
    pub fn shard_file(&self) -> String { to_hex(&self.0[1..]) }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}
