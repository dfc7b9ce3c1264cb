use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Shape and construction errors raised by `Network`.
///
/// These are caller bugs, not transient faults: they are reported before
/// any layer state is touched and are never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("a network needs at least 2 layers (input and output), got {0}")]
    TooFewLayers(usize),

    #[error("layer {index} has no neurons")]
    EmptyLayer { index: usize },

    #[error("input has {actual} values but the input layer has {expected} neurons")]
    InputSize { expected: usize, actual: usize },

    #[error("target has {actual} values but the output layer has {expected} neurons")]
    TargetSize { expected: usize, actual: usize },

    #[error("{inputs} inputs but {targets} expected outputs")]
    SampleCount { inputs: usize, targets: usize },
}

/// Failures local to the checkpoint store.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete {path} after {attempts} attempts: {source}")]
    DeleteFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("failed to write checkpoint {path}: {reason}")]
    Serialize { path: PathBuf, reason: String },

    #[error("failed to read checkpoint {path}: {reason}")]
    Deserialize { path: PathBuf, reason: String },

    #[error("checkpoint {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("signature {signature:?} cannot be used in a checkpoint name: {reason}")]
    InvalidSignature { signature: String, reason: &'static str },

    #[error("background checkpoint task panicked")]
    TaskPanicked,
}

impl CheckpointError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CheckpointError::Io { path: path.into(), source }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CheckpointError::Corrupt { path: path.into(), reason: reason.into() }
    }
}

/// IDX decoding failures.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IDX {kind} file: {reason}")]
    BadHeader { kind: &'static str, reason: String },

    #[error("IDX {kind} file too short: need {needed} bytes, got {actual}")]
    Truncated { kind: &'static str, needed: usize, actual: usize },

    #[error("IDX file mismatch: {images} images but {labels} labels")]
    CountMismatch { images: usize, labels: usize },

    #[error("label at index {index} is {label}, out of range for {n_classes} classes")]
    LabelOutOfRange { index: usize, label: usize, n_classes: usize },

    #[error("n_classes must be at least 2, got {0}")]
    TooFewClasses(usize),
}

/// Errors loading or validating a `TrainConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
