//! Error types for store operations.

use std::path::PathBuf;

use thiserror::Error;

use exdir_npy::NpyError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum ExdirError {
    /// The candidate object name was rejected by the active naming policy.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The target directory already exists.
    #[error("'{0}' already exists")]
    AlreadyExists(PathBuf),

    /// The directory exists but holds the wrong kind of object.
    #[error("type conflict at '{path}': {reason}")]
    TypeConflict { path: PathBuf, reason: String },

    /// The path has no "file"-typed ancestor.
    #[error("path '{0}' is not inside an exdir store")]
    NotInStore(PathBuf),

    /// The named object does not exist.
    #[error("object not found: '{0}'")]
    NotFound(PathBuf),

    /// Attempted to mutate a store opened read-only.
    #[error("store is opened read-only")]
    ReadOnly,

    /// A plugin recorded at write time is missing from the registry.
    #[error("plugin '{plugin}' was used to write '{dataset}' but is not registered")]
    PluginUnavailable { plugin: String, dataset: String },

    /// Attempted to iterate over a rank-0 dataset.
    #[error("cannot iterate over scalar dataset '{0}'")]
    ScalarIteration(String),

    /// Attempted to take the length of a rank-0 dataset.
    #[error("cannot take the length of scalar dataset '{0}'")]
    ScalarLength(String),

    /// The string is not a valid object type name.
    #[error("'{0}' is not a valid object type")]
    InvalidType(String),

    /// Error from the array-file codec.
    #[error("array codec error: {0}")]
    Npy(#[from] NpyError),

    /// Error from the sidecar text codec.
    #[error("sidecar codec error: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, ExdirError>;
