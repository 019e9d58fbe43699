//! Configuration models and layered config loading.
//!
//! This crate owns the Mnemo config schema, validation, layer merging and
//! environment overrides used by the CLI and embedding applications.

mod env;
mod error;
mod loader;
mod model;

/// Environment variable names recognized by [`MnemoConfig::apply_env`].
pub use env::{ENV_DB_PATH, ENV_EMBEDDINGS};
/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
