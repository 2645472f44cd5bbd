//! Presence-based token matching against the catalog index.
//!
//! Matching is set-intersection, not search: scrub punctuation, split the
//! text into tokens, normalize each token with the catalog's own rule, and
//! probe the index. A hit contributes the catalog's canonical code, never
//! the raw token, so the result always reads the way the catalog does.
//!
//! There is deliberately no substring matching: a code glued into a longer
//! token with characters outside the scrub list stays glued and misses.
//! Tokenization is whitespace/punctuation-bounded only.

use std::collections::{BTreeSet, HashSet};

use crate::catalog::CatalogIndex;
use crate::normalize::{normalize_key, scrub_punctuation};

/// Match every distinct token of `text` against the index. Repeated
/// occurrences collapse: the result is a set of canonical codes, and an
/// empty set is the normal "nothing matched" outcome, not a failure.
pub fn match_text(text: &str, index: &CatalogIndex) -> BTreeSet<String> {
    let scrubbed = scrub_punctuation(text);
    let tokens: HashSet<&str> = scrubbed.split_whitespace().collect();

    let mut matched = BTreeSet::new();
    for token in tokens {
        let key = normalize_key(token);
        if key.is_empty() {
            continue;
        }
        if let Some(code) = index.lookup(&key) {
            matched.insert(code.to_string());
        }
    }
    matched
}
