//! Code normalization and punctuation scrubbing.
//!
//! One rule, two call sites: the catalog index builds its keys with
//! [`normalize_key`], and the token matcher normalizes document tokens with
//! the same function. The two sides MUST stay identical: a key built under
//! one rule and a token normalized under another will never meet in the map,
//! and matching fails silently.

/// Separator characters deleted during normalization. Catalog codes render
/// these inconsistently across documents ("70415-202", "70415/202",
/// "70415.202") while meaning the same part.
const SEPARATORS: [char; 3] = ['-', '/', '.'];

/// Punctuation replaced by a space before tokenization. Replacement, not
/// deletion: deleting would fuse the tokens on either side into one.
const PUNCTUATION: [char; 10] = ['(', ')', ',', ':', ';', '!', '?', '"', '\'', '`'];

/// Reduce a code (or candidate token) to its lookup key: every separator and
/// whitespace character removed, remaining characters ASCII-uppercased.
///
/// Uppercasing makes matching case-insensitive; scanned documents routinely
/// lowercase alphanumeric codes that the catalog stores in caps.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !SEPARATORS.contains(c) && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Replace list punctuation with spaces so that "(70415-202)," tokenizes to
/// the bare code. Characters outside [`PUNCTUATION`] pass through untouched
/// and stay part of their token.
pub fn scrub_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if PUNCTUATION.contains(&c) { ' ' } else { c })
        .collect()
}
