//! # Aulos Stream
//!
//! Stateful streaming wrapper around a sample-rate conversion engine.
//!
//! ## Architecture
//!
//! - [`ResampleStream`] — the long-lived stream: open/resample/flush/close
//!   with single-flight background tasks and partial-frame carry between
//!   chunks
//! - [`Completion`] — pending result of an accepted task, delivered exactly
//!   once
//! - [`ResamplePipeline`] — channel-driven wrapper: lazy open, per-chunk
//!   conversion, flush-then-close when the input channel ends
//! - [`ResampleBackend`] / [`EngineSession`] — the engine seam, re-exported
//!   from `aulos-engine` along with its backends
//!
//! ## Target API
//!
//! ```ignore
//! use aulos_stream::{ResampleStream, RubatoBackend, StreamConfig};
//!
//! let config = StreamConfig::new(44100, 48000);
//! let stream = ResampleStream::new(RubatoBackend, config)?;
//!
//! stream.open()?;
//! let converted = stream.resample(&chunk)?.recv().await?;
//! let tail = stream.flush()?.recv().await?;
//! stream.close()?;
//! ```

#![forbid(unsafe_code)]

mod adapter;
mod error;
mod frame;
mod pipeline;
mod sizing;
mod state;
mod stream;
mod task;

// Re-export the engine seam and backends for convenience.
pub use aulos_engine::{
    Advance, EngineError, EngineSession, FRAME_BYTES, MockBackend, Quality, ResampleBackend,
    RubatoBackend,
};
pub use error::{StreamError, StreamResult};
pub use pipeline::ResamplePipeline;
pub use stream::{Completion, ResampleStream, StreamConfig};
