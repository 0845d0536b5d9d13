//! Error types for the schema generator

use std::path::PathBuf;

use thiserror::Error;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors produced while building, validating, or emitting a schema
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("schema arena exhausted: capacity is {cap} nodes")]
    ArenaExhausted { cap: usize },

    #[error("registry exhausted: {registered} top-level schemas registered, capacity is {cap}")]
    RegistryExhausted { registered: usize, cap: usize },

    #[error("duplicate top-level schema name: {0:?}")]
    DuplicateTopLevelName(String),

    #[error("object field key is empty")]
    EmptyFieldKey,

    #[error("duplicate field key {key:?} in the same object")]
    DuplicateFieldKey { key: String },

    #[error("array capacity must be >= 1, got {0}")]
    InvalidArrayCapacity(u64),

    #[error(
        "hash collision between keys {a:?} and {b:?} in object {object:?} (sbox hash 0x{hash:016x})"
    )]
    HashCollision {
        object: String,
        a: String,
        b: String,
        hash: u64,
    },

    #[error("unable to open output file {path}: {source}")]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid identifier {0:?}: must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),

    #[error("configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
