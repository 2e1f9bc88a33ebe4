//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while parsing recorded samples
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read samples: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Invalid sample format: {0}")]
    InvalidFormat(String),

    #[error("Unknown thread state: {0}")]
    UnknownThreadState(String),
}

/// Errors that can occur while merging into or reading a merged stack tree
///
/// A failed merge leaves the tree exactly as it was before the call.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Merged stack tree lock poisoned by a panicking thread")]
    LockPoisoned,

    #[error("Failed to allocate {requested} tree nodes")]
    AllocationFailed { requested: usize },
}

/// Errors that can occur while running a background sampler
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("Failed to spawn sampler thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Invalid sampler configuration: {0}")]
    InvalidConfig(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Malformed folded stack line {line}: {reason}")]
    MalformedFolded { line: usize, reason: String },
}
