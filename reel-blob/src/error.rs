use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {id}")]
    NotFound { id: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Blob size {size} exceeds maximum {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("Blob {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl BlobError {
    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a corrupt object error
    pub fn corrupt<I: Into<String>, R: Into<String>>(id: I, reason: R) -> Self {
        Self::Corrupt {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Convert into an I/O error for delivery inside a `ByteStream`.
    ///
    /// `NotFound` keeps `ErrorKind::NotFound` and `Corrupt` becomes
    /// `ErrorKind::InvalidData`, so a consumer can still tell them apart.
    pub fn into_io(self) -> std::io::Error {
        use std::io::{Error, ErrorKind};
        match self {
            Self::Io { source } => source,
            Self::NotFound { .. } => Error::new(ErrorKind::NotFound, self.to_string()),
            Self::Corrupt { .. } => Error::new(ErrorKind::InvalidData, self.to_string()),
            other => Error::new(ErrorKind::Other, other.to_string()),
        }
    }

    /// Map an I/O error from a backend, treating a missing file as a
    /// missing blob.
    pub fn from_io_for<S: Into<String>>(id: S, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(id)
        } else {
            Self::Io { source: err }
        }
    }
}
