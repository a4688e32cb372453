//! Backend error types

use thiserror::Error;

/// Errors raised while preparing a shader backend
///
/// None of these reach the per-frame path: tier selection turns them into a
/// downgrade to the reduced backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// WGSL source failed to parse
    #[error("Liquid shader failed to parse: {0}")]
    ShaderParse(String),

    /// Parsed module failed naga validation
    #[error("Liquid shader failed validation: {0}")]
    ShaderValidation(String),

    /// Configuration file could not be read
    #[error("Failed to read backend config: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for [`crate::BackendConfig`]
    #[error("Invalid backend config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;
