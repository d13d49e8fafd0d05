mod category;
mod position;
mod record;
mod registry;

#[cfg(test)]
mod tests;

pub use category::{CategoryDecoder, decode_categories};
pub use position::{PositionDecoder, decode_positions};
pub use record::{CategoryRecord, DecodedFile, PositionRecord, RecordKind};
pub use registry::DecoderRegistry;

/// Core trait implemented by the catalog file decoders
///
/// Decoding is a pure function of the text: malformed lines and incomplete
/// records are skipped rather than reported, so there is no error path.
pub trait CatalogDecoder: Send + Sync {
    /// Decode already code-page-decoded text into records
    ///
    /// # Arguments
    /// * `source_file` - File name recorded on every record for provenance
    /// * `text` - Full file content
    fn decode(&self, source_file: &str, text: &str) -> DecodedFile;

    /// The record stream this decoder produces
    fn kind(&self) -> RecordKind;
}
