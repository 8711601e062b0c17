// THEORY:
// This file is the main entry point for the `flare_vision` library crate.
//
// The primary goal is to export `FrameAnalyzer` and its associated data
// structures (`AnalyzerConfig`, `Analysis`) as the high-level interface of the
// fire detection engine. Around it sit the pieces a front-end needs to run it
// continuously: frame sources, the monitor loop, the worker pool and the
// layered configuration. The pixel-level building blocks live in
// `core_modules` and are public for callers that want a single stage.

pub mod analyzer;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod monitor;
pub mod parallel_analyzer;
pub mod source;
pub mod status;

pub use analyzer::{Analysis, AnalyzerConfig, FrameAnalyzer, analyze};
pub use config::FlareConfig;
pub use core_modules::frame::{ChannelOrder, Frame};
pub use core_modules::hsv::{HsvPixel, HsvRange};
pub use core_modules::region::Region;
pub use error::{AnalyzerError, ConfigError, MonitorError, PoolError, SourceError};
pub use monitor::{FrameSink, Monitor, MonitorStats};
pub use parallel_analyzer::ParallelAnalyzer;
pub use source::{FrameSource, open_source};
pub use status::{Signal, SignalStatus, SurveillanceStatus};
