// Public API exports
pub mod catalog;
pub mod encoding;
pub mod import;
pub mod store;
pub mod units;

// Re-export main types for convenience
pub use catalog::{
    CatalogDecoder, CategoryDecoder, CategoryRecord, DecodedFile, DecoderRegistry,
    PositionDecoder, PositionRecord, RecordKind, decode_categories, decode_positions,
};

pub use encoding::{decode_cp437, read_cp437, read_raw};

pub use import::{
    CatalogSink, DEFAULT_BATCH_SIZE, FileReport, FileStatus, ImportConfig, ImportError,
    ImportReport, Importer,
};

pub use store::{CatalogStats, CatalogStore};

pub use units::describe_unit;
