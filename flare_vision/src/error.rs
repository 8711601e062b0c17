//! Error types for flare_vision

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the per-frame analyzer and of its configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    /// The frame is absent (end of stream), empty, or its buffer does not
    /// describe a 3-channel 8-bit raster.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// A threshold, bound or dimension is outside its valid range.
    #[error("configuration error: {0}")]
    Configuration(String),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported source: {0}")]
    Unsupported(String),

    #[error("capture backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Frame(#[from] AnalyzerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{key} has an invalid value: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("frame source failed: {0}")]
    Source(#[from] SourceError),

    #[error("analysis failed: {0}")]
    Analyzer(#[from] AnalyzerError),

    #[error("frame sink failed: {0}")]
    Sink(String),
}

/// Failures of the worker pool behind `ParallelAnalyzer`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("worker pool is shut down")]
    Closed,

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}
