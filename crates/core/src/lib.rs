//! Core errors and logging setup shared across the `bulwark` workspace.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias
//!   used for every fallible configuration path.
//! - **`logging`**: Installs a `tracing` subscriber for binaries and tests
//!   that want to see policy diagnostics.

pub mod errors;
pub mod logging;

pub use self::errors::{Error, Result};
