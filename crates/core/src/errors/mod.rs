//! Error types for bulwark configuration and loading

mod builders;
mod conversions;
mod display;
mod types;

pub use types::{Error, Result};
