//! Owned per-task buffers crossing the blocking-pool boundary.
//!
//! Each accepted call gets its own task value: an owned copy of the aligned
//! input and a policy-sized output buffer, moved into the background task and
//! consumed when the result is delivered. No buffer ever has two owners.

use aulos_engine::FRAME_BYTES;
use bytes::Bytes;

use crate::{frame::Aligned, sizing};

/// Decode whole frames from native-endian bytes.
fn frames_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(FRAME_BYTES)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Encode frames back to native-endian bytes.
fn bytes_from_frames(frames: &[f32]) -> Bytes {
    let mut out = Vec::with_capacity(frames.len() * FRAME_BYTES);
    for frame in frames {
        out.extend_from_slice(&frame.to_ne_bytes());
    }
    Bytes::from(out)
}

/// One conversion task: aligned input split into the completed prefix and
/// the remaining body, plus a policy-sized output buffer and cursor.
pub(crate) struct ConvertTask {
    pub(crate) prefix: Vec<f32>,
    pub(crate) body: Vec<f32>,
    pub(crate) output: Vec<f32>,
    pub(crate) produced: usize,
}

impl ConvertTask {
    /// Build a task from aligned bytes.
    ///
    /// A carried prefix is completed to a whole frame by borrowing bytes
    /// from the body front; the aligner guarantees the body covers the
    /// borrow whenever a prefix exists.
    pub(crate) fn new(aligned: Aligned, factor: f64) -> Self {
        let capacity = sizing::convert_capacity(aligned.len(), factor);
        let Aligned { mut prefix, body } = aligned;

        let mut body_start = 0;
        if !prefix.is_empty() {
            let borrow = FRAME_BYTES - prefix.len() % FRAME_BYTES;
            prefix.extend_from_slice(&body[..borrow]);
            body_start = borrow;
        }

        Self {
            prefix: frames_from_bytes(&prefix),
            body: frames_from_bytes(&body[body_start..]),
            output: vec![0.0; capacity / FRAME_BYTES],
            produced: 0,
        }
    }

    /// The produced byte range, with unused capacity truncated away.
    pub(crate) fn into_output(self) -> Bytes {
        bytes_from_frames(&self.output[..self.produced])
    }
}

/// One flush task: a pad-sized output buffer and its cursor.
pub(crate) struct FlushTask {
    pub(crate) output: Vec<f32>,
    pub(crate) produced: usize,
}

impl FlushTask {
    pub(crate) fn new(factor: f64) -> Self {
        Self {
            output: vec![0.0; sizing::flush_capacity(factor) / FRAME_BYTES],
            produced: 0,
        }
    }

    pub(crate) fn into_output(self) -> Bytes {
        bytes_from_frames(&self.output[..self.produced])
    }
}
