//! Per-project configuration.

pub mod settings;

pub use settings::{KeyBackend, Settings};
