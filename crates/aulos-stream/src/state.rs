//! Lifecycle state machine with a single atomic transition point.
//!
//! One enumerated phase replaces a scatter of independent booleans: every
//! entry into an exclusive phase goes through [`PhaseCell::transition`],
//! which checks and sets atomically, so at most one of converting, flushing,
//! and closing can ever be active.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{StreamError, StreamResult};

/// Lifecycle phase of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Phase {
    Closed = 0,
    Opening = 1,
    Opened = 2,
    Converting = 3,
    Flushing = 4,
    Closing = 5,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Opening,
            2 => Self::Opened,
            3 => Self::Converting,
            4 => Self::Flushing,
            _ => Self::Closing,
        }
    }

    /// Map an observed phase to the guard error a rejected caller receives.
    fn guard_error(self) -> StreamError {
        match self {
            Self::Closed => StreamError::NotOpen,
            Self::Opening | Self::Opened => StreamError::AlreadyOpen,
            Self::Converting => StreamError::Resampling,
            Self::Flushing => StreamError::Flushing,
            Self::Closing => StreamError::Closing,
        }
    }
}

pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(Phase::Closed as u8))
    }

    pub(crate) fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Atomically move `from` → `to`.
    ///
    /// On failure the observed phase is mapped to its guard error and
    /// nothing changes.
    pub(crate) fn transition(&self, from: Phase, to: Phase) -> StreamResult<()> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|actual| Phase::from_u8(actual).guard_error())
    }

    /// Unconditionally store a phase.
    ///
    /// Only for completion and rollback paths that already own the in-flight
    /// phase.
    pub(crate) fn store(&self, phase: Phase) {
        self.0.store(phase as u8, Ordering::Release);
    }

    /// Whether the stream counts as open (including while a task runs).
    pub(crate) fn is_opened(&self) -> bool {
        matches!(
            self.get(),
            Phase::Opened | Phase::Converting | Phase::Flushing
        )
    }
}
