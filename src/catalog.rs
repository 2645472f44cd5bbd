//! Catalog loading and the normalized-key index.
//!
//! The reference catalog is an XLSX workbook whose first worksheet carries a
//! header row; one configured column holds the part codes. Loading produces a
//! [`CatalogIndex`]: a map from normalized key to the canonical code exactly
//! as stored, plus the retained rows for detail display. The index is built
//! once per catalog fingerprint and is immutable afterwards.
//!
//! Canonical codes keep their stored formatting (leading zeros, separators,
//! case) because that is what the user recognizes in the result table. Only
//! the lookup keys are normalized.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::normalize::normalize_key;

/// Maximum decompressed bytes read from a single ZIP entry
/// (decompression-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Catalog loading failure. All variants are fatal to the load: no partial
/// index is ever returned.
#[derive(Debug)]
pub enum CatalogError {
    /// The resource is unreadable: missing file, bad ZIP container, or
    /// malformed sheet XML.
    Load(String),
    /// The configured code column is absent from the header row.
    Schema(String),
    /// Two distinct codes normalize to the same key under
    /// [`CollisionPolicy::Fail`].
    Collision {
        key: String,
        first: String,
        second: String,
    },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Load(e) => write!(f, "catalog could not be read: {}", e),
            CatalogError::Schema(e) => write!(f, "catalog schema error: {}", e),
            CatalogError::Collision { key, first, second } => write!(
                f,
                "catalog codes '{}' and '{}' collide on normalized key '{}'",
                first, second, key
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

/// What to do when two distinct catalog codes normalize to the same key.
///
/// The catalog owner decides: `overwrite` keeps the later row and logs a
/// warning; `fail` rejects the whole catalog so the collision gets fixed at
/// the source.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    #[default]
    Overwrite,
    Fail,
}

/// One catalog row: the canonical code plus every named cell of the row, in
/// sheet order, passed through untouched for detail display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogRow {
    pub code: String,
    pub attrs: Vec<(String, String)>,
}

/// Normalized-key → canonical-code map plus the retained row collection.
#[derive(Debug)]
pub struct CatalogIndex {
    map: HashMap<String, String>,
    rows: Vec<CatalogRow>,
    fingerprint: String,
}

impl CatalogIndex {
    /// Build the index from already-loaded rows. Rows whose code normalizes
    /// to an empty key index nothing (they stay in the row collection).
    pub fn build(
        rows: Vec<CatalogRow>,
        fingerprint: String,
        policy: CollisionPolicy,
    ) -> Result<Self, CatalogError> {
        let mut map: HashMap<String, String> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let key = normalize_key(&row.code);
            if key.is_empty() {
                continue;
            }
            match map.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(row.code.clone());
                }
                Entry::Occupied(mut slot) => {
                    if slot.get() == &row.code {
                        continue;
                    }
                    match policy {
                        CollisionPolicy::Fail => {
                            return Err(CatalogError::Collision {
                                key: slot.key().clone(),
                                first: slot.get().clone(),
                                second: row.code.clone(),
                            });
                        }
                        CollisionPolicy::Overwrite => {
                            log::warn!(
                                "catalog codes '{}' and '{}' normalize to the same key '{}'; keeping the later one",
                                slot.get(),
                                row.code,
                                slot.key()
                            );
                            slot.insert(row.code.clone());
                        }
                    }
                }
            }
        }
        Ok(CatalogIndex {
            map,
            rows,
            fingerprint,
        })
    }

    /// Canonical code for an already-normalized key.
    pub fn lookup(&self, normalized: &str) -> Option<&str> {
        self.map.get(normalized).map(String::as_str)
    }

    /// Number of distinct normalized keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// SHA-256 of the catalog bytes this index was built from. Cache
    /// identity: a session rebuilds only when this changes.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    /// Detail rows whose canonical code is in the matched set, in sheet
    /// order. Duplicate rows for the same code are all included.
    pub fn rows_for(&self, codes: &BTreeSet<String>) -> Vec<CatalogRow> {
        self.rows
            .iter()
            .filter(|row| codes.contains(&row.code))
            .cloned()
            .collect()
    }
}

/// Hex SHA-256 of the raw catalog bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Load an XLSX catalog: first worksheet, header row, `code_column` holding
/// the part codes. Rows with an empty code cell are skipped without error.
pub fn load_catalog(
    bytes: &[u8],
    code_column: &str,
    policy: CollisionPolicy,
) -> Result<CatalogIndex, CatalogError> {
    let mut sheet_rows = read_first_sheet(bytes)?.into_iter();
    let header = sheet_rows.next().ok_or_else(|| {
        CatalogError::Schema("catalog sheet is empty; expected a header row".to_string())
    })?;

    let code_col = header
        .iter()
        .find(|cell| cell.value.trim() == code_column)
        .map(|cell| cell.col.clone())
        .ok_or_else(|| {
            CatalogError::Schema(format!(
                "column '{}' not found in catalog header",
                code_column
            ))
        })?;
    let header_by_col: HashMap<String, String> = header
        .into_iter()
        .filter(|cell| !cell.value.trim().is_empty())
        .map(|cell| (cell.col, cell.value))
        .collect();

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let mut code: Option<String> = None;
        let mut attrs = Vec::new();
        for cell in cells {
            let Some(name) = header_by_col.get(&cell.col) else {
                continue;
            };
            if cell.value.is_empty() {
                continue;
            }
            if cell.col == code_col {
                code = Some(cell.value.clone());
            }
            attrs.push((name.clone(), cell.value));
        }
        match code {
            Some(code) if !code.trim().is_empty() => rows.push(CatalogRow { code, attrs }),
            _ => log::debug!("catalog row without a code skipped"),
        }
    }

    CatalogIndex::build(rows, fingerprint(bytes), policy)
}

/// One parsed sheet cell: column letters plus resolved text.
struct RawCell {
    col: String,
    value: String,
}

#[derive(Clone, Copy)]
enum CellKind {
    Shared,
    Inline,
    Literal,
}

fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<RawCell>>, CatalogError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| CatalogError::Load(e.to_string()))?;
    let shared = read_shared_strings(&mut archive)?;
    let sheet_name = first_worksheet_name(&mut archive)?;
    let sheet_xml = read_zip_entry_bounded(&mut archive, &sheet_name, MAX_XML_ENTRY_BYTES)?;
    parse_sheet_rows(&sheet_xml, &shared)
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, CatalogError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| CatalogError::Load(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| CatalogError::Load(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(CatalogError::Load(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn first_worksheet_name(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<String, CatalogError> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
        .into_iter()
        .next()
        .ok_or_else(|| CatalogError::Load("workbook contains no worksheets".to_string()))
}

/// Shared-string table, rich-text runs concatenated per entry. A workbook
/// with no string cells has no sharedStrings.xml at all; that is not an
/// error.
fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, CatalogError> {
    let xml = match archive.by_name("xl/sharedStrings.xml") {
        Ok(entry) => {
            let mut out = Vec::new();
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut out)
                .map_err(|e| CatalogError::Load(e.to_string()))?;
            if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(CatalogError::Load(
                    "xl/sharedStrings.xml exceeds size limit".to_string(),
                ));
            }
            out
        }
        Err(_) => return Ok(Vec::new()),
    };

    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                    current.clear();
                } else if in_si && e.local_name().as_ref() == b"t" {
                    in_t = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) => {
                if in_t {
                    current.push_str(te.unescape().unwrap_or_default().as_ref());
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_t = false;
                } else if e.local_name().as_ref() == b"si" {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(CatalogError::Load(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn parse_sheet_rows(xml: &[u8], shared: &[String]) -> Result<Vec<Vec<RawCell>>, CatalogError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut rows: Vec<Vec<RawCell>> = Vec::new();
    let mut row: Vec<RawCell> = Vec::new();
    let mut in_row = false;
    let mut col = String::new();
    let mut kind = CellKind::Literal;
    let mut pending = String::new();
    let mut in_value = false;
    let mut cell_index = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    in_row = true;
                    row.clear();
                    cell_index = 0;
                }
                b"c" if in_row => {
                    col = cell_column(&e, cell_index)?;
                    kind = cell_kind(&e)?;
                    pending.clear();
                }
                b"v" => in_value = true,
                b"t" if matches!(kind, CellKind::Inline) => in_value = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Empty(e)) => {
                // Self-closing <c/> carries no value; record it so header
                // alignment stays positional when the r attribute is absent.
                if in_row && e.local_name().as_ref() == b"c" {
                    let col = cell_column(&e, cell_index)?;
                    row.push(RawCell {
                        col,
                        value: String::new(),
                    });
                    cell_index += 1;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) => {
                if in_value {
                    pending.push_str(te.unescape().unwrap_or_default().as_ref());
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" if in_row => {
                    let value = match kind {
                        CellKind::Shared => pending
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|i| shared.get(i))
                            .cloned()
                            .unwrap_or_default(),
                        _ => pending.clone(),
                    };
                    row.push(RawCell {
                        col: std::mem::take(&mut col),
                        value,
                    });
                    kind = CellKind::Literal;
                    cell_index += 1;
                }
                b"row" => {
                    in_row = false;
                    rows.push(std::mem::take(&mut row));
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(CatalogError::Load(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

/// Column letters from the cell's `r` attribute ("BC12" → "BC"), falling
/// back to the cell's position when the writer omitted the attribute.
fn cell_column(
    e: &quick_xml::events::BytesStart<'_>,
    cell_index: usize,
) -> Result<String, CatalogError> {
    let r = e
        .try_get_attribute("r")
        .map_err(|err| CatalogError::Load(err.to_string()))?;
    if let Some(attr) = r {
        let reference = String::from_utf8_lossy(&attr.value).to_string();
        let letters: String = reference.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        if !letters.is_empty() {
            return Ok(letters);
        }
    }
    Ok(column_letters(cell_index))
}

fn cell_kind(e: &quick_xml::events::BytesStart<'_>) -> Result<CellKind, CatalogError> {
    let t = e
        .try_get_attribute("t")
        .map_err(|err| CatalogError::Load(err.to_string()))?;
    Ok(match t {
        Some(attr) if attr.value.as_ref() == b"s" => CellKind::Shared,
        Some(attr) if attr.value.as_ref() == b"inlineStr" => CellKind::Inline,
        _ => CellKind::Literal,
    })
}

/// 0 → "A", 25 → "Z", 26 → "AA".
fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str) -> CatalogRow {
        CatalogRow {
            code: code.to_string(),
            attrs: vec![("Code".to_string(), code.to_string())],
        }
    }

    #[test]
    fn build_maps_normalized_key_to_canonical_code() {
        let index = CatalogIndex::build(
            vec![row("70415-202"), row("AB.100")],
            "fp".to_string(),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("70415202"), Some("70415-202"));
        assert_eq!(index.lookup("AB100"), Some("AB.100"));
        assert_eq!(index.lookup("70415-202"), None);
    }

    #[test]
    fn collision_overwrite_keeps_later_row() {
        let index = CatalogIndex::build(
            vec![row("70415-202"), row("70415/202")],
            "fp".to_string(),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("70415202"), Some("70415/202"));
    }

    #[test]
    fn collision_fail_names_both_codes() {
        let err = CatalogIndex::build(
            vec![row("70415-202"), row("70415/202")],
            "fp".to_string(),
            CollisionPolicy::Fail,
        )
        .unwrap_err();
        match err {
            CatalogError::Collision { key, first, second } => {
                assert_eq!(key, "70415202");
                assert_eq!(first, "70415-202");
                assert_eq!(second, "70415/202");
            }
            other => panic!("expected collision, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_rows_are_not_a_collision() {
        let index = CatalogIndex::build(
            vec![row("70415-202"), row("70415-202")],
            "fp".to_string(),
            CollisionPolicy::Fail,
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.rows().len(), 2);
    }

    #[test]
    fn separator_only_code_indexes_nothing() {
        let index = CatalogIndex::build(
            vec![row("-/.")],
            "fp".to_string(),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        assert!(index.is_empty());
        assert_eq!(index.rows().len(), 1);
    }

    #[test]
    fn empty_catalog_builds_empty_index() {
        let index =
            CatalogIndex::build(Vec::new(), "fp".to_string(), CollisionPolicy::Overwrite).unwrap();
        assert!(index.is_empty());
        assert!(index.rows().is_empty());
    }

    #[test]
    fn rows_for_filters_by_matched_code() {
        let index = CatalogIndex::build(
            vec![row("70415-202"), row("AB.100"), row("ZZ-9")],
            "fp".to_string(),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        let matched: BTreeSet<String> =
            ["70415-202".to_string(), "ZZ-9".to_string()].into_iter().collect();
        let rows = index.rows_for(&matched);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "70415-202");
        assert_eq!(rows[1].code, "ZZ-9");
    }

    #[test]
    fn column_letters_round_trip() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = fingerprint(b"catalog-a");
        assert_eq!(a, fingerprint(b"catalog-a"));
        assert_ne!(a, fingerprint(b"catalog-b"));
        assert_eq!(a.len(), 64);
    }
}
