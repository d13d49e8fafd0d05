use serde::Serialize;

use crate::catalog::RecordKind;

/// Outcome of importing one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// All decoded records were handed to the store
    Imported,
    /// The file decoded to zero records
    Empty,
    /// The file could not be read, or at least one store write failed
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Imported => "imported",
            FileStatus::Empty => "empty",
            FileStatus::Failed => "failed",
        }
    }
}

/// Per-file line of the import report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub source_file: String,
    pub kind: RecordKind,
    /// SHA-256 of the raw file bytes; absent when the file could not be read
    pub sha256: Option<String>,
    /// Records produced by the decoder
    pub decoded: usize,
    /// Rows the store reports as written
    pub written: usize,
    /// Decoded records the store did not write (duplicate or missing GUID)
    pub skipped: usize,
    pub status: FileStatus,
    pub errors: Vec<String>,
}

impl FileReport {
    pub fn new(source_file: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            source_file: source_file.into(),
            kind,
            sha256: None,
            decoded: 0,
            written: 0,
            skipped: 0,
            status: FileStatus::Imported,
            errors: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == FileStatus::Failed
    }
}

/// Result of a whole import run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub files: Vec<FileReport>,
    /// Whether existing rows were cleared before importing
    pub cleaned: bool,
}

impl ImportReport {
    fn written_for(&self, kind: RecordKind) -> usize {
        self.files
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.written)
            .sum()
    }

    pub fn categories_written(&self) -> usize {
        self.written_for(RecordKind::Categories)
    }

    pub fn positions_written(&self) -> usize {
        self.written_for(RecordKind::Positions)
    }

    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_failed()).count()
    }

    pub fn file(&self, source_file: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.source_file == source_file)
    }
}
