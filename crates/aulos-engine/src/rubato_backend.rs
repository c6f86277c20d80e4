//! Rubato-backed conversion backend.
//!
//! Rubato resamplers want fixed-size input blocks; the session accumulates
//! offered frames until a block is full, converts it, and parks produced
//! frames until the caller's output slice can take them. This is what makes
//! partial consumption (and therefore the caller's drive-to-exhaustion loop)
//! real rather than theoretical.

use std::collections::VecDeque;

use rubato::{
    FastFixedIn, PolynomialDegree, Resampler as RubatoResampler, SincFixedIn,
    SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::{debug, trace};

use crate::{
    error::{EngineError, EngineResult},
    session::{Advance, EngineSession, Quality, ResampleBackend},
};

/// Input frames per rubato processing block.
///
/// Kept small so engine-internal buffering stays within the stream layer's
/// fixed flush pad.
const BLOCK_FRAMES: usize = 256;

/// Allowed relative ratio adjustment range required by rubato constructors.
const MAX_RATIO_RELATIVE: f64 = 2.0;

fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 64,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Enum wrapper for rubato resamplers (the trait is not object-safe).
enum Kind {
    Poly(FastFixedIn<f32>),
    Sinc(SincFixedIn<f32>),
}

impl Kind {
    fn process_into_buffer(
        &mut self,
        input: &[&[f32]],
        output: &mut [&mut [f32]],
    ) -> Result<(usize, usize), rubato::ResampleError> {
        match self {
            Self::Poly(r) => r.process_into_buffer(input, output, None),
            Self::Sinc(r) => r.process_into_buffer(input, output, None),
        }
    }

    fn input_frames_next(&self) -> usize {
        match self {
            Self::Poly(r) => r.input_frames_next(),
            Self::Sinc(r) => r.input_frames_next(),
        }
    }

    fn output_frames_next(&self) -> usize {
        match self {
            Self::Poly(r) => r.output_frames_next(),
            Self::Sinc(r) => r.output_frames_next(),
        }
    }
}

/// Production conversion backend over [rubato](https://crates.io/crates/rubato).
#[derive(Clone, Copy, Debug, Default)]
pub struct RubatoBackend;

impl ResampleBackend for RubatoBackend {
    type Session = RubatoSession;

    fn open(&self, quality: Quality, factor: f64) -> EngineResult<RubatoSession> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EngineError::InvalidFactor(factor));
        }

        let kind = match quality {
            Quality::Low => {
                FastFixedIn::new(factor, MAX_RATIO_RELATIVE, PolynomialDegree::Cubic, BLOCK_FRAMES, 1)
                    .map(Kind::Poly)
                    .map_err(|e| EngineError::Backend(Box::new(e)))?
            }
            Quality::High => {
                SincFixedIn::new(factor, MAX_RATIO_RELATIVE, sinc_params(), BLOCK_FRAMES, 1)
                    .map(Kind::Sinc)
                    .map_err(|e| EngineError::Backend(Box::new(e)))?
            }
        };

        debug!(?quality, factor, block = BLOCK_FRAMES, "rubato session opened");

        Ok(RubatoSession {
            kind,
            ratio: factor,
            pending_in: Vec::with_capacity(BLOCK_FRAMES),
            pending_out: VecDeque::new(),
            scratch_out: Vec::new(),
        })
    }
}

/// A mono conversion session driven in fixed-size input blocks.
pub struct RubatoSession {
    kind: Kind,
    ratio: f64,
    /// Offered frames not yet forming a whole block.
    pending_in: Vec<f32>,
    /// Produced frames not yet emitted into a caller's output slice.
    pending_out: VecDeque<f32>,
    scratch_out: Vec<f32>,
}

impl RubatoSession {
    /// Convert one full block from `pending_in` into `pending_out`.
    ///
    /// `trim_to` limits how many produced frames are kept (flush path: only
    /// the output corresponding to real, unpadded input).
    fn run_block(&mut self, trim_to: Option<usize>) -> EngineResult<()> {
        let needed = self.kind.input_frames_next();
        let out_frames = self.kind.output_frames_next();
        self.scratch_out.resize(out_frames, 0.0);

        let produced = {
            let input_refs: [&[f32]; 1] = [&self.pending_in[..needed]];
            let mut output_refs: [&mut [f32]; 1] = [self.scratch_out.as_mut_slice()];
            let (_, out_len) = self
                .kind
                .process_into_buffer(&input_refs, &mut output_refs)
                .map_err(|e| EngineError::Backend(Box::new(e)))?;
            out_len
        };

        let keep = trim_to.map_or(produced, |t| t.min(produced));
        self.pending_out.extend(&self.scratch_out[..keep]);
        self.pending_in.drain(..needed);
        Ok(())
    }

    /// Move parked frames into the caller's output slice.
    fn emit(&mut self, output: &mut [f32]) -> usize {
        let n = self.pending_out.len().min(output.len());
        for (slot, frame) in output.iter_mut().zip(self.pending_out.drain(..n)) {
            *slot = frame;
        }
        n
    }
}

impl EngineSession for RubatoSession {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> EngineResult<Advance> {
        let mut used = 0;
        if !input.is_empty() {
            let needed = self.kind.input_frames_next().saturating_sub(self.pending_in.len());
            used = input.len().min(needed);
            self.pending_in.extend_from_slice(&input[..used]);
            if self.pending_in.len() >= self.kind.input_frames_next() {
                self.run_block(None)?;
            }
        }

        let produced = self.emit(output);
        trace!(offered = input.len(), used, produced, "rubato process");
        Ok(Advance {
            frames_used: used,
            frames_produced: produced,
        })
    }

    fn drain(&mut self, output: &mut [f32]) -> EngineResult<usize> {
        if !self.pending_in.is_empty() {
            let buffered = self.pending_in.len();
            let block = self.kind.input_frames_next();
            self.pending_in.resize(block, 0.0);

            // Only the output corresponding to the unpadded input is real.
            let real = ((buffered as f64) * self.ratio).ceil() as usize;
            self.run_block(Some(real))?;
            debug!(buffered, padded = block - buffered, "rubato session drained");
        }
        Ok(self.emit(output))
    }
}
