use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source directory not found: {}", .0.display())]
    SourceDirMissing(PathBuf),

    #[error("Failed to list source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
