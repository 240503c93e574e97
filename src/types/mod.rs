//! Shared types: configuration and errors.

pub mod config;
pub mod errors;

pub use config::Config;
pub use errors::{Error, Result};
