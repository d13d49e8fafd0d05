use std::collections::HashMap;

use super::{CatalogDecoder, CategoryRecord, DecodedFile, RecordKind};

/// Decoder for `.lst` category hierarchy files
///
/// Each line assigns one field of one record: `III T = value`, where `III` is
/// the zero-padded record index and `T` the field code. `G` carries the GUID,
/// `N` the name and `P` the index of the parent record. Other field codes
/// (the legacy program also writes `E`) are accepted but have no effect.
pub struct CategoryDecoder;

impl CatalogDecoder for CategoryDecoder {
    fn decode(&self, source_file: &str, text: &str) -> DecodedFile {
        DecodedFile::Categories(decode_categories(source_file, text))
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Categories
    }
}

/// One `III T = value` assignment
#[derive(Debug, PartialEq)]
struct FieldLine<'a> {
    index: &'a str,
    code: char,
    value: &'a str,
}

/// Record under construction; `parent_index` is resolved to a GUID afterwards
#[derive(Debug)]
struct PendingCategory {
    sort_order: u32,
    source_guid: Option<String>,
    name: Option<String>,
    parent_index: Option<u32>,
}

impl PendingCategory {
    fn new(sort_order: u32) -> Self {
        Self {
            sort_order,
            source_guid: None,
            name: None,
            parent_index: None,
        }
    }

    fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Decode the text of a category file into records in file order
pub fn decode_categories(source_file: &str, text: &str) -> Vec<CategoryRecord> {
    let mut finished: Vec<PendingCategory> = Vec::new();
    let mut current: Option<(&str, PendingCategory)> = None;

    for line in text.split('\n') {
        let Some(field) = parse_field_line(line.trim()) else {
            continue;
        };

        let starts_new = current
            .as_ref()
            .map_or(true, |(index, _)| *index != field.index);
        if starts_new {
            if let Some((_, done)) = current.take() {
                if done.has_name() {
                    finished.push(done);
                }
            }
            // the index is three ASCII digits, so this cannot fail
            let sort_order = field.index.parse().unwrap_or_default();
            current = Some((field.index, PendingCategory::new(sort_order)));
        }

        if let Some((_, pending)) = current.as_mut() {
            apply_field(pending, &field);
        }
    }

    if let Some((_, done)) = current {
        if done.has_name() {
            finished.push(done);
        }
    }

    resolve_parents(source_file, finished)
}

fn apply_field(pending: &mut PendingCategory, field: &FieldLine<'_>) {
    match field.code {
        'G' => pending.source_guid = Some(field.value.to_string()),
        'N' => pending.name = Some(field.value.to_string()),
        'P' => pending.parent_index = field.value.parse().ok(),
        _ => {}
    }
}

/// Second pass: swap parent indices for the GUIDs found at those indices
fn resolve_parents(source_file: &str, pending: Vec<PendingCategory>) -> Vec<CategoryRecord> {
    let guid_by_index: HashMap<u32, &str> = pending
        .iter()
        .filter_map(|p| p.source_guid.as_deref().map(|guid| (p.sort_order, guid)))
        .collect();

    pending
        .iter()
        .map(|p| CategoryRecord {
            sort_order: p.sort_order,
            source_guid: p.source_guid.clone(),
            name: p.name.clone().unwrap_or_default(),
            parent_guid: p
                .parent_index
                .and_then(|idx| guid_by_index.get(&idx))
                .map(|guid| guid.to_string()),
            source_file: source_file.to_string(),
        })
        .collect()
}

/// Match `^\d{3}[A-Za-z]\s*=\s*(.*)$` against an already trimmed line
fn parse_field_line(line: &str) -> Option<FieldLine<'_>> {
    let bytes = line.as_bytes();
    if bytes.len() < 5 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let code = bytes[3];
    if !code.is_ascii_alphabetic() {
        return None;
    }

    // bytes 0..4 are ASCII, so slicing at 4 is on a char boundary
    let rest = line[4..].trim_start();
    let value = rest.strip_prefix('=')?.trim();

    Some(FieldLine {
        index: &line[..3],
        code: code as char,
        value,
    })
}
