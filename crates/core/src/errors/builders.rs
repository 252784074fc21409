//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

impl Error {
    /// Create a missing configuration error
    #[must_use]
    pub fn missing_configuration(setting: impl Into<String>) -> Self {
        Error::MissingConfiguration {
            setting: setting.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Whether this error came from a required setting being absent
    #[must_use]
    pub fn is_missing_configuration(&self) -> bool {
        matches!(self, Error::MissingConfiguration { .. })
    }
}
