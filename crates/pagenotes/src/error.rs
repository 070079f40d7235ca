//! Error types for pagenotes.
//!
//! Every fallible operation in the crate returns [`Result`]. The controllers
//! catch these at their operation boundary; the store traits and the binary
//! propagate them.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pagenotes operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// No page with the given id exists.
    #[error("page not found: {id}")]
    PageNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The backing service rejected or failed a request.
    #[error("backend error: {0}")]
    Backend(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Session Errors ===
    /// No user is signed in.
    #[error("not signed in")]
    NotSignedIn,

    // === Upload Errors ===
    /// The selected file is not an image.
    #[error("'{file_name}' is not an image ({media_type})")]
    UnsupportedMediaType {
        /// Name of the rejected file.
        file_name: String,
        /// The media type reported for the file.
        media_type: String,
    },

    /// The selected file exceeds the configured size limit.
    #[error("'{file_name}' is {size} bytes, the limit is {limit}")]
    FileTooLarge {
        /// Name of the rejected file.
        file_name: String,
        /// Size of the file in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Storing an object failed.
    #[error("failed to upload {path}: {message}")]
    Upload {
        /// Object path inside the store.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for pagenotes operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a page-not-found error.
    #[must_use]
    pub fn page_not_found(id: impl std::fmt::Display) -> Self {
        Self::PageNotFound { id: id.to_string() }
    }

    /// Create an upload error for the given object path.
    #[must_use]
    pub fn upload(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the requested page does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PageNotFound { .. })
    }

    /// Check if this error is a rejection of user input rather than a
    /// failed request.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMediaType { .. } | Self::FileTooLarge { .. }
        )
    }
}
