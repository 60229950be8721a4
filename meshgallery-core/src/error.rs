/// Error types for mesh decoding, content retrieval and ingestion
use thiserror::Error;

/// Failure to turn raw bytes into a renderable mesh
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooSmall(usize),
    #[error("STL declares {declared} triangles but only {available} fit in the file")]
    Truncated { declared: usize, available: usize },
    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),
    #[error("mesh contains no triangles")]
    Empty,
}

/// Failure reported by a content source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no content at {0}")]
    NotFound(String),
    #[error("failed to read {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },
    #[error("content at {0} is not valid UTF-8")]
    NotText(String),
}

/// Failure of a single ingestion attempt
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: MeshError,
    },
}
