//! Error types for the streaming resampler.

use aulos_engine::EngineError;
use thiserror::Error;

/// Errors surfaced by [`ResampleStream`](crate::ResampleStream) operations.
///
/// Guard failures are synchronous, non-fatal, and leave stream state
/// untouched. Task-time faults (`Engine`, `EngineStalled`) are delivered
/// through the task's [`Completion`](crate::Completion), never thrown across
/// the async boundary.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("not open")]
    NotOpen,

    #[error("already open")]
    AlreadyOpen,

    #[error("still resampling")]
    Resampling,

    #[error("still flushing")]
    Flushing,

    #[error("still closing")]
    Closing,

    #[error("invalid sample rate: {0}")]
    InvalidRate(u32),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("engine made no progress with {remaining} frames remaining")]
    EngineStalled { remaining: usize },

    #[error("completion channel closed")]
    ChannelClosed,
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
