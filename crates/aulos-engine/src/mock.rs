//! Deterministic mock backend for exercising the stream layer in tests.

use std::{thread, time::Duration};

use crate::{
    error::{EngineError, EngineResult},
    session::{Advance, EngineSession, Quality, ResampleBackend},
};

/// Mock conversion backend with behavior knobs.
///
/// Conversion is nearest-neighbor frame scaling with a fractional carry, so
/// a factor of `1.0` reproduces input frames exactly — which is what lets
/// byte-preservation tests compare streams verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockBackend {
    chunk_limit: Option<usize>,
    flush_tail: usize,
    fail_open: bool,
    stall: bool,
    delay: Duration,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap input frames consumed per `process` call, forcing callers to loop.
    #[must_use]
    pub fn with_chunk_limit(mut self, frames: usize) -> Self {
        self.chunk_limit = Some(frames);
        self
    }

    /// Emit this many zero frames on `drain` (simulated filter latency).
    #[must_use]
    pub fn with_flush_tail(mut self, frames: usize) -> Self {
        self.flush_tail = frames;
        self
    }

    /// Make `open` fail.
    #[must_use]
    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Consume and produce nothing, exercising the caller's progress guard.
    #[must_use]
    pub fn with_stall(mut self) -> Self {
        self.stall = true;
        self
    }

    /// Sleep this long inside every `process`/`drain` call, widening the
    /// window in which a task is observably in flight.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl ResampleBackend for MockBackend {
    type Session = MockSession;

    fn open(&self, _quality: Quality, factor: f64) -> EngineResult<MockSession> {
        if self.fail_open {
            return Err(EngineError::Backend("mock open failure".into()));
        }
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EngineError::InvalidFactor(factor));
        }
        Ok(MockSession {
            factor,
            cfg: *self,
            carry: 0.0,
        })
    }
}

/// Session state for [`MockBackend`].
#[derive(Debug)]
pub struct MockSession {
    factor: f64,
    cfg: MockBackend,
    carry: f64,
}

impl EngineSession for MockSession {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> EngineResult<Advance> {
        if !self.cfg.delay.is_zero() {
            thread::sleep(self.cfg.delay);
        }
        if self.cfg.stall {
            return Ok(Advance::default());
        }

        let used = self
            .cfg
            .chunk_limit
            .map_or(input.len(), |cap| input.len().min(cap));

        let ideal = (used as f64) * self.factor + self.carry;
        let mut produced = ideal.floor() as usize;
        self.carry = ideal - produced as f64;
        produced = produced.min(output.len());

        for (i, slot) in output[..produced].iter_mut().enumerate() {
            let src = ((i as f64) / self.factor) as usize;
            *slot = input[src.min(used.saturating_sub(1))];
        }

        Ok(Advance {
            frames_used: used,
            frames_produced: produced,
        })
    }

    fn drain(&mut self, output: &mut [f32]) -> EngineResult<usize> {
        if !self.cfg.delay.is_zero() {
            thread::sleep(self.cfg.delay);
        }
        if self.cfg.stall {
            return Ok(0);
        }
        let n = self.cfg.flush_tail.min(output.len());
        for slot in &mut output[..n] {
            *slot = 0.0;
        }
        Ok(n)
    }
}
