//! The conversion seam: backends open sessions, sessions convert frames.

use crate::error::EngineResult;

/// Bytes per sample frame (one native-endian `f32`).
///
/// The unit of alignment for all buffer slicing in the stream layer.
pub const FRAME_BYTES: usize = size_of::<f32>();

/// Quality preset for a conversion session.
///
/// Fixed at open; sessions never change quality afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quality {
    /// Fast polynomial interpolation. Suitable for previews or low-power
    /// devices.
    Low,
    /// Windowed-sinc interpolation. Recommended for production conversion.
    #[default]
    High,
}

/// Progress reported by a single [`EngineSession::process`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Advance {
    /// Input frames consumed from the offered slice.
    pub frames_used: usize,
    /// Output frames written at the start of the output slice.
    pub frames_produced: usize,
}

/// A live conversion session, valid from open until drop.
///
/// Sessions may buffer internally: a single `process` call can consume fewer
/// frames than offered and produce output originating from earlier calls.
/// Callers keep offering the unconsumed tail until it is gone.
pub trait EngineSession: Send + 'static {
    /// Feed input frames and collect whatever output is ready.
    ///
    /// Writes at most `output.len()` frames, starting at the front of the
    /// slice. A healthy session consumes at least one frame per call
    /// whenever `input` is non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails irrecoverably; the session is
    /// unusable afterwards.
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> EngineResult<Advance>;

    /// Drain internally buffered frames at end of stream.
    ///
    /// Returns the number of frames written. The session closes on drop.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails irrecoverably.
    fn drain(&mut self, output: &mut [f32]) -> EngineResult<usize>;
}

/// Factory for conversion sessions.
pub trait ResampleBackend: Send + Sync + 'static {
    /// Session type produced by [`open`](Self::open).
    type Session: EngineSession;

    /// Open a session converting by `factor` (output rate / input rate).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidFactor`](crate::EngineError) for
    /// non-finite or non-positive factors, or a backend error when the
    /// session cannot be constructed.
    fn open(&self, quality: Quality, factor: f64) -> EngineResult<Self::Session>;
}
