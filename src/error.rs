use std::path::PathBuf;

use thiserror::Error;

/// Errors that can escape a public `Validator` method as `Err`.
///
/// Most of the conditions in the design's error-kind list (schema failures,
/// rule skips, unresolved references, ...) are represented as
/// [`crate::model::ValidationIssue`] values inside a `Report`, not as
/// `Result::Err` — the engine's contract is "produce a report", so only
/// conditions that prevent a report from being produced at all live here.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not open ZIP archive {path}: {source}")]
    ZipOpen {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid options: {reason}")]
    InvalidOptions { reason: String },
}

/// Schema-validator-specific error types, kept separate so a `SchemaValidator`
/// implementation can be tested in isolation from the engine.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema parsing failed: null pointer returned")]
    SchemaParseFailed,

    #[error("validation context creation failed")]
    ValidationContextFailed,

    #[error("schema validation internal error: {details}")]
    InternalError { details: String },
}

/// Cache-specific error types. Per the design, cache errors never escape as
/// `Err` from the engine; they are logged and swallowed at the call site.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache initialization failed: {details}")]
    InitializationFailed { details: String },

    #[error("cache write error: {key} - {details}")]
    WriteError { key: String, details: String },

    #[error("cache read error: {key} - {details}")]
    ReadError { key: String, details: String },
}

impl From<SchemaError> for EngineError {
    fn from(err: SchemaError) -> Self {
        EngineError::InvalidOptions {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Schema-validator result type alias.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Cache result type alias.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
