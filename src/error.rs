//! Typed error taxonomy for configuration and (de)serialization failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("activation schema is empty for types ({n_types} declared)")]
    EmptySchema { n_types: usize },
    #[error("type index {index} out of range, only {n_types} types declared")]
    TypeIndexOutOfRange { index: usize, n_types: usize },
    #[error("no activation functions registered for (t_in={t_in}, t_out={t_out})")]
    EmptyActivationTable { t_in: usize, t_out: usize },
    #[error("config source error: {0}")]
    Source(#[from] config::ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("truncated stream: expected at least {expected} more bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("version mismatch: stream is version {found}, this build reads version {expected}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("codec error: {0}")]
    Codec(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SerializationResult<T> = Result<T, SerializationError>;
