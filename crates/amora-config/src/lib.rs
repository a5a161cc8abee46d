// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Amora matching backend.
//!
//! Layered TOML + environment loading via Figment, strict unknown-field
//! rejection, and post-parse semantic validation.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AmoraConfig, LockConfig, MatchingConfig, RateLimitConfig, ServiceConfig, StorageConfig,
};
pub use validation::validate;

use amora_core::AmoraError;

/// Load from the standard hierarchy and validate in one step.
pub fn load_and_validate() -> Result<AmoraConfig, AmoraError> {
    let config = load_config().map_err(|e| AmoraError::Config(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Load from a TOML string and validate in one step.
pub fn load_and_validate_str(toml_content: &str) -> Result<AmoraConfig, AmoraError> {
    let config = load_config_from_str(toml_content).map_err(|e| AmoraError::Config(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}
