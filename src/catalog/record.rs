use serde::Serialize;

use crate::units;

/// A node of the category hierarchy decoded from a `.lst` file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    /// 3-digit positional index of the record in its file
    pub sort_order: u32,
    /// GUID assigned by the legacy program
    pub source_guid: Option<String>,
    /// Display name (never empty)
    pub name: String,
    /// GUID of the parent category, resolved within the same file
    pub parent_guid: Option<String>,
    /// File name the record was decoded from
    pub source_file: String,
}

/// A priced catalog item decoded from a `.pos` file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRecord {
    pub name: String,
    pub short_text: Option<String>,
    pub long_text: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub unit_code: Option<String>,
    pub category_guid: Option<String>,
    pub source_id: Option<String>,
    pub price_value1: Option<f64>,
    pub price_value2: Option<f64>,
    pub source_file: String,
}

impl PositionRecord {
    /// Start a record with only its name and provenance set
    pub fn new(name: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_text: None,
            long_text: None,
            description: None,
            unit: None,
            unit_code: None,
            category_guid: None,
            source_id: None,
            price_value1: None,
            price_value2: None,
            source_file: source_file.into(),
        }
    }

    /// Human-readable label for the unit, if the abbreviation is known
    pub fn unit_label(&self) -> Option<&'static str> {
        self.unit.as_deref().and_then(units::describe_unit)
    }
}

/// Which record stream a file decodes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Categories,
    Positions,
}

/// Records decoded from one source file
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFile {
    Categories(Vec<CategoryRecord>),
    Positions(Vec<PositionRecord>),
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Categories => "categories",
            RecordKind::Positions => "positions",
        }
    }
}

impl DecodedFile {
    pub fn kind(&self) -> RecordKind {
        match self {
            DecodedFile::Categories(_) => RecordKind::Categories,
            DecodedFile::Positions(_) => RecordKind::Positions,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DecodedFile::Categories(records) => records.len(),
            DecodedFile::Positions(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
