//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for bulwark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bulwark operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required setting was never supplied
    MissingConfiguration { setting: String },

    /// Configuration values that are present but invalid
    Configuration { message: String },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },
}
