mod error;
mod report;


pub use error::ImportError;
pub use report::{FileReport, FileStatus, ImportReport};

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::{
    CategoryRecord, DecodedFile, DecoderRegistry, PositionRecord, RecordKind,
};
use crate::encoding::{decode_cp437, read_raw};

/// Rows per position insert, as the legacy import wrote them
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Destination for decoded records
///
/// Implemented by [`crate::store::CatalogStore`]; the importer only needs
/// these four writes.
pub trait CatalogSink {
    /// Remove everything a previous import wrote
    fn clear(&mut self) -> anyhow::Result<()>;

    /// Insert categories keyed by GUID; duplicates are ignored. Returns rows inserted.
    fn upsert_categories(&mut self, records: &[CategoryRecord]) -> anyhow::Result<usize>;

    /// Append one batch of positions. Returns rows inserted.
    fn insert_positions(&mut self, records: &[PositionRecord]) -> anyhow::Result<usize>;

    /// Keep the per-file outcome for provenance
    fn record_file(&mut self, report: &FileReport) -> anyhow::Result<()>;
}

/// Settings for one import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Directory holding the `.lst` and `.pos` files
    pub source_dir: PathBuf,
    /// Positions written per store call
    pub batch_size: usize,
    /// Clear previously imported rows first
    pub clean: bool,
}

impl ImportConfig {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            clean: false,
        }
    }

    /// Set the position batch size (0 is treated as 1)
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }
}

/// A catalog file found in the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: RecordKind,
}

/// Runs the decoders over a source directory and writes the records to a sink
pub struct Importer {
    config: ImportConfig,
    registry: DecoderRegistry,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self::with_registry(config, DecoderRegistry::new())
    }

    pub fn with_registry(config: ImportConfig, registry: DecoderRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// List the catalog files to import: categories first, then positions,
    /// each sorted by file name. Backup files (`.bak` in the name) are skipped.
    pub fn discover(&self) -> Result<Vec<SourceFile>, ImportError> {
        let dir = &self.config.source_dir;
        if !dir.is_dir() {
            return Err(ImportError::SourceDirMissing(dir.clone()));
        }

        debug!(
            decoders = self.registry.decoder_count(),
            extensions = ?self.registry.registered_extensions(),
            "scanning source directory"
        );
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.contains(".bak") {
                debug!(file = %file_name, "backup file skipped");
                continue;
            }
            let Some(decoder) = self.registry.select(&file_name) else {
                continue;
            };
            files.push(SourceFile {
                path: entry.into_path(),
                file_name,
                kind: decoder.kind(),
            });
        }

        files.sort_by(|a, b| {
            kind_rank(a.kind)
                .cmp(&kind_rank(b.kind))
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(files)
    }

    /// Import every discovered file into `sink`.
    ///
    /// Unreadable files and failed writes are recorded in the report and the
    /// run moves on; only a missing source directory, a failing directory
    /// listing or a failing clean step abort the run.
    pub fn run<S: CatalogSink>(&self, sink: &mut S) -> Result<ImportReport, ImportError> {
        let files = self.discover()?;
        info!(
            source = %self.config.source_dir.display(),
            files = files.len(),
            "starting catalog import"
        );

        let mut report = ImportReport::default();
        if self.config.clean {
            info!("clearing previously imported rows");
            sink.clear()?;
            report.cleaned = true;
        }

        for file in &files {
            let file_report = self.import_file(file, sink);
            if let Err(e) = sink.record_file(&file_report) {
                let error = format!("{:#}", e);
                warn!(file = %file.file_name, %error, "could not record file outcome");
            }
            report.files.push(file_report);
        }

        info!(
            categories = report.categories_written(),
            positions = report.positions_written(),
            failed = report.failed_files(),
            "catalog import finished"
        );
        Ok(report)
    }

    fn import_file<S: CatalogSink>(&self, file: &SourceFile, sink: &mut S) -> FileReport {
        let mut report = FileReport::new(&file.file_name, file.kind);

        let bytes = match read_raw(&file.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(file = %file.file_name, error = %err, "file skipped");
                report.status = FileStatus::Failed;
                report.errors.push(err.to_string());
                return report;
            }
        };
        report.sha256 = Some(hash_bytes(&bytes));

        let text = decode_cp437(&bytes);
        let Some(decoder) = self.registry.select(&file.file_name) else {
            return report;
        };
        let decoded = decoder.decode(&file.file_name, &text);
        report.decoded = decoded.len();
        debug!(file = %file.file_name, records = decoded.len(), "decoded");

        if decoded.is_empty() {
            warn!(file = %file.file_name, "no records found");
            report.status = FileStatus::Empty;
            return report;
        }

        match decoded {
            DecodedFile::Categories(records) => match sink.upsert_categories(&records) {
                Ok(written) => report.written = written,
                Err(e) => {
                    let error = format!("{:#}", e);
                    warn!(file = %file.file_name, %error, "category upsert failed");
                    report.errors.push(error);
                }
            },
            DecodedFile::Positions(records) => {
                for (i, batch) in records.chunks(self.config.batch_size.max(1)).enumerate() {
                    match sink.insert_positions(batch) {
                        Ok(written) => report.written += written,
                        Err(e) => {
                            let error = format!("batch {}: {:#}", i + 1, e);
                            warn!(file = %file.file_name, %error, "batch failed");
                            report.errors.push(error);
                        }
                    }
                }
            }
        }

        report.skipped = report.decoded.saturating_sub(report.written);
        if report.errors.is_empty() {
            info!(file = %file.file_name, kind = file.kind.as_str(), written = report.written, "imported");
        } else {
            report.status = FileStatus::Failed;
        }
        report
    }
}

fn kind_rank(kind: RecordKind) -> u8 {
    match kind {
        RecordKind::Categories => 0,
        RecordKind::Positions => 1,
    }
}

/// Compute SHA256 hash of raw file bytes
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// File name component of a path, for provenance
pub fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
