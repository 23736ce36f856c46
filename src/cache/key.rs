//! Cache Key Module
//!
//! Derives the storage key of a memoized call from the callable's name and
//! the representations of its arguments.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cache::args::CacheArgs;
use crate::cache::repr::Repr;

/// Suffix of the access-time record stored next to each entry.
pub const ATIME_SUFFIX: &str = ":atime";

// == Cache Key ==
/// Hex-encoded SHA-256 digest identifying one (callable, arguments) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of every key in hex characters.
    pub const LEN: usize = 64;

    /// Parses a key from its hex form. Returns None unless `raw` is exactly
    /// 64 lowercase hex characters.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let valid = raw.len() == Self::LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the access-time record belonging to this entry.
    pub fn atime_key(&self) -> String {
        format!("{}{}", self.0, ATIME_SUFFIX)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// == Derive Key ==
/// Derives the cache key for a call.
///
/// The digest is fed the callable name, then each positional representation in
/// order, then `"name:" + repr` for each keyword argument in ascending name
/// order. Keyword order at the call site therefore never changes the key.
///
/// Every part is framed with a tag byte and its length, so `sum(1, 23)` and
/// `sum(12, 3)` (or `f(12)` and `f1(2)`) never feed the same bytes.
pub fn derive_key(
    name: &str,
    positional: &[&dyn Repr],
    keywords: &[(&str, &dyn Repr)],
    repr: &dyn Fn(&dyn Repr) -> String,
) -> CacheKey {
    let mut hasher = Sha256::new();
    feed(&mut hasher, NAME_TAG, name);

    for arg in positional {
        feed(&mut hasher, POSITIONAL_TAG, &repr(*arg));
    }

    let mut sorted: Vec<&(&str, &dyn Repr)> = keywords.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for (keyword, value) in sorted {
        feed(&mut hasher, KEYWORD_TAG, &format!("{}:{}", keyword, repr(*value)));
    }

    CacheKey(hex::encode(hasher.finalize()))
}

const NAME_TAG: u8 = b'n';
const POSITIONAL_TAG: u8 = b'p';
const KEYWORD_TAG: u8 = b'k';

/// Feeds one tagged, length-prefixed part into the digest.
fn feed(hasher: &mut Sha256, tag: u8, part: &str) {
    hasher.update([tag]);
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part.as_bytes());
}

/// Derives the cache key for `args` passed to the callable `name`.
pub fn derive_for<A: CacheArgs + ?Sized>(
    name: &str,
    args: &A,
    repr: &dyn Fn(&dyn Repr) -> String,
) -> CacheKey {
    derive_key(name, &args.positional(), &args.keywords(), repr)
}
