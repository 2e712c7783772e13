// src/error.rs

use thiserror::Error;

/// Failures surfaced by the engine lifecycle.
///
/// Nothing here escapes to the hosting application as a panic. Start
/// attempts return these, per-tick failures are logged and swallowed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("video source produced no decodable frame within {waited_ms} ms")]
    VideoNotReady { waited_ms: u64 },

    #[error("gesture engine is disabled by user setting")]
    Disabled,

    #[error("invalid configuration: {0}")]
    Config(String),
}
