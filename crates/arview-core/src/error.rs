//! Error types shared across arview

use thiserror::Error;

/// Failure to fetch or decode a model asset
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

/// Errors raised by the model swap controller
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Model index {index} out of range (catalog has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Failed to load model {identifier}: {source}")]
    LoadFailure {
        identifier: String,
        #[source]
        source: LoadError,
    },
    #[error("Unknown load ticket (generation {0})")]
    UnknownTicket(u64),
}

/// Errors raised while building an asset catalog
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Asset catalog is empty")]
    Empty,
    #[error("Duplicate catalog entry: {0}")]
    Duplicate(String),
    #[error("Initial selection {index} out of range (catalog has {len} entries)")]
    InitialOutOfRange { index: usize, len: usize },
}
