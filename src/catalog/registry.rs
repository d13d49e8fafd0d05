use super::{CatalogDecoder, CategoryDecoder, PositionDecoder};
use std::collections::HashMap;
use std::path::Path;

/// Extension-keyed dispatch table for the catalog decoders
pub struct DecoderRegistry {
    /// Lower-cased extension -> decoder
    map: HashMap<String, Box<dyn CatalogDecoder>>,
}

impl DecoderRegistry {
    /// Create a registry with the `lst` and `pos` decoders
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("lst", CategoryDecoder);
        registry.register("pos", PositionDecoder);
        registry
    }

    fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Register a decoder for a file extension (without dot, any case)
    pub fn register(&mut self, extension: &str, decoder: impl CatalogDecoder + 'static) {
        self.map.insert(extension.to_lowercase(), Box::new(decoder));
    }

    /// Select the decoder for a path, or `None` if its extension is not handled
    pub fn select(&self, path: &str) -> Option<&dyn CatalogDecoder> {
        let ext = extension_of(path)?;
        self.map.get(&ext).map(|d| &**d)
    }

    pub fn decoder_count(&self) -> usize {
        self.map.len()
    }

    /// List all registered extensions, sorted
    pub fn registered_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.map.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
}
