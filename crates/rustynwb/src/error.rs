//! Error types for the NWB object layer.

use crate::io::data_type::ElementType;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, recording or reading NWB objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A create-type operation was attempted while the IO is recording or
    /// was opened read-only.
    #[error("structural mutation denied at {0}: objects cannot be modified in the current state")]
    StructuralMutationDenied(String),
    /// No factory is registered for the given type name.
    #[error("type not registered: {0}")]
    TypeNotRegistered(String),
    /// The `namespace` or `neurodata_type` attribute is missing at a path.
    #[error("missing type metadata at {0}")]
    MissingTypeMetadata(String),
    /// A generic data block was converted to the wrong element type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The element type that was requested.
        expected: ElementType,
        /// The element type actually stored.
        actual: ElementType,
    },
    /// A registered type outlived the IO it was created with.
    #[error("dangling IO reference for object at {0}")]
    DanglingIo(String),
    /// `open` was called on an IO that is already open.
    #[error("file already open: {0}")]
    AlreadyOpen(String),
    /// An operation needed an open IO.
    #[error("file not open: {0}")]
    NotOpen(String),
    /// The IO was opened read-only.
    #[error("file opened read-only: {0}")]
    ReadOnly(String),
    /// No group, dataset or link at the given path.
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    /// No attribute at the given path.
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),
    /// An object already exists where a new one was to be created.
    #[error("object already exists: {0}")]
    ObjectExists(String),
    /// Data length does not agree with a shape.
    #[error("shape mismatch: shape {shape:?} holds {expected} elements, got {actual}")]
    ShapeMismatch {
        /// The declared shape.
        shape: Vec<usize>,
        /// Number of elements implied by the shape.
        expected: usize,
        /// Number of elements supplied.
        actual: usize,
    },
    /// A hyperslab selection does not fit the dataset.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    /// A caller supplied inconsistent arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// No write handle is available for a dataset (never initialized, or a link).
    #[error("dataset not writable: {0}")]
    DatasetNotWritable(String),
    /// Fault reported by the storage backend.
    #[error("backend error: {0}")]
    Backend(String),
}

impl Error {
    /// True for the failure kinds that only mean "not present".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ObjectNotFound(_) | Error::AttributeNotFound(_)
        )
    }
}
