use std::path::PathBuf;

use q2raster_common::DecodeError;
use thiserror::Error;

/// Failure loading a `Model`: either file access or format decode, with the
/// offending path attached since the decoders themselves only see bytes.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to decode {path}: {source}")]
    Decode { path: PathBuf, #[source] source: DecodeError },
}
