//! The stateful streaming resampler.

use std::sync::Arc;

use aulos_engine::{Quality, ResampleBackend};
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::{
    adapter,
    error::{StreamError, StreamResult},
    frame,
    state::{Phase, PhaseCell},
    task::{ConvertTask, FlushTask},
};

/// Configuration for a [`ResampleStream`].
#[derive(Clone, Copy, Debug)]
pub struct StreamConfig {
    pub input_rate: u32,
    pub output_rate: u32,
    pub quality: Quality,
}

impl StreamConfig {
    /// Create a config converting `input_rate` → `output_rate` at the
    /// default quality.
    #[must_use]
    pub fn new(input_rate: u32, output_rate: u32) -> Self {
        Self {
            input_rate,
            output_rate,
            quality: Quality::default(),
        }
    }

    /// Set the engine quality preset.
    #[must_use]
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}

/// State shared between the facade and in-flight tasks.
struct Shared<S> {
    phase: PhaseCell,
    /// Engine session, live between open and close. A running task takes it
    /// out and puts it back; single-flight makes that exclusive.
    session: Mutex<Option<S>>,
    /// Bytes carried between calls because they do not complete a frame.
    /// Mutated only inside accepted submissions, never by a running task.
    leftover: Mutex<Vec<u8>>,
}

/// Stateful streaming wrapper around a conversion engine.
///
/// Accepts audio in arbitrarily sized byte chunks, realigns them on whole
/// sample-frame boundaries (carrying partial frames to the next call), and
/// runs each conversion on the blocking pool while the submitting task keeps
/// going. At most one conversion or flush is in flight per stream; a second
/// submission fails fast instead of queuing.
///
/// Submissions must happen inside a Tokio runtime context (they spawn onto
/// the runtime's blocking pool).
///
/// # Example
///
/// ```ignore
/// use aulos_stream::{ResampleStream, RubatoBackend, StreamConfig};
///
/// let stream = ResampleStream::new(RubatoBackend, StreamConfig::new(44100, 48000))?;
/// stream.open()?;
/// let converted = stream.resample(&chunk)?.recv().await?;
/// let tail = stream.flush()?.recv().await?;
/// stream.close()?;
/// ```
pub struct ResampleStream<B: ResampleBackend> {
    backend: B,
    quality: Quality,
    factor: f64,
    shared: Arc<Shared<B::Session>>,
}

/// Pending result of an accepted `resample` or `flush` task.
///
/// Delivered exactly once. Dropping the completion abandons the result; the
/// task itself still runs to completion.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<StreamResult<Bytes>>,
}

impl Completion {
    /// Await the task result.
    ///
    /// # Errors
    ///
    /// Task-time faults (engine errors, stalls), or [`StreamError::ChannelClosed`]
    /// when the task died without reporting.
    pub async fn recv(self) -> StreamResult<Bytes> {
        self.rx.await.map_err(|_| StreamError::ChannelClosed)?
    }

    /// Block the current thread on the task result.
    ///
    /// Do **not** call this from async context; use [`recv`](Self::recv)
    /// there.
    ///
    /// # Errors
    ///
    /// Same as [`recv`](Self::recv).
    pub fn blocking_recv(self) -> StreamResult<Bytes> {
        self.rx.blocking_recv().map_err(|_| StreamError::ChannelClosed)?
    }
}

impl<B: ResampleBackend> ResampleStream<B> {
    /// Construct an unopened stream.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidRate`] when either rate is zero.
    pub fn new(backend: B, config: StreamConfig) -> StreamResult<Self> {
        if config.input_rate == 0 {
            return Err(StreamError::InvalidRate(config.input_rate));
        }
        if config.output_rate == 0 {
            return Err(StreamError::InvalidRate(config.output_rate));
        }

        let factor = f64::from(config.output_rate) / f64::from(config.input_rate);
        debug!(
            input_rate = config.input_rate,
            output_rate = config.output_rate,
            factor,
            quality = ?config.quality,
            "stream created"
        );

        Ok(Self {
            backend,
            quality: config.quality,
            factor,
            shared: Arc::new(Shared {
                phase: PhaseCell::new(),
                session: Mutex::new(None),
                leftover: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Conversion factor (output rate / input rate).
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Whether the stream is open, including while a task is in flight.
    #[must_use]
    pub fn opened(&self) -> bool {
        self.shared.phase.is_opened()
    }

    /// Open an engine session.
    ///
    /// Synchronous; on failure the stream stays closed.
    ///
    /// # Errors
    ///
    /// [`StreamError::AlreadyOpen`], [`StreamError::Closing`], or the engine
    /// error when the backend cannot open.
    pub fn open(&self) -> StreamResult<()> {
        self.shared.phase.transition(Phase::Closed, Phase::Opening)?;

        match self.backend.open(self.quality, self.factor) {
            Ok(session) => {
                *self.shared.session.lock() = Some(session);
                self.shared.phase.store(Phase::Opened);
                debug!(factor = self.factor, quality = ?self.quality, "stream opened");
                Ok(())
            }
            Err(e) => {
                self.shared.phase.store(Phase::Closed);
                Err(e.into())
            }
        }
    }

    /// Submit a chunk for conversion.
    ///
    /// The chunk is combined with carried leftover bytes, the frame-aligned
    /// run is copied into a task scheduled on the blocking pool, and the new
    /// remainder is carried for the next call. Returns immediately; the
    /// converted bytes (possibly empty) arrive through the [`Completion`].
    ///
    /// A chunk too short to complete a frame is absorbed entirely into the
    /// leftover buffer and the completion delivers an empty result without
    /// invoking the engine.
    ///
    /// # Errors
    ///
    /// [`StreamError::NotOpen`], [`StreamError::Resampling`],
    /// [`StreamError::Flushing`], or [`StreamError::Closing`].
    pub fn resample(&self, chunk: &[u8]) -> StreamResult<Completion> {
        self.shared
            .phase
            .transition(Phase::Opened, Phase::Converting)?;

        let aligned = {
            let mut leftover = self.shared.leftover.lock();
            frame::split_frames(&mut leftover, chunk)
        };
        trace!(
            chunk_len = chunk.len(),
            aligned_len = aligned.len(),
            "resample accepted"
        );
        let mut task = ConvertTask::new(aligned, self.factor);

        let (tx, rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || {
            let result = Self::run_task(&shared, |session| {
                adapter::run_convert(session, &mut task)
            })
            .map(|()| task.into_output());
            shared.phase.store(Phase::Opened);
            let _ = tx.send(result);
        });

        Ok(Completion { rx })
    }

    /// Drain frames buffered inside the engine.
    ///
    /// Returns immediately; the drained bytes (possibly empty) arrive
    /// through the [`Completion`].
    ///
    /// # Errors
    ///
    /// [`StreamError::NotOpen`], [`StreamError::Resampling`],
    /// [`StreamError::Flushing`], or [`StreamError::Closing`].
    pub fn flush(&self) -> StreamResult<Completion> {
        self.shared
            .phase
            .transition(Phase::Opened, Phase::Flushing)?;
        trace!("flush accepted");

        let mut task = FlushTask::new(self.factor);
        let (tx, rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || {
            let result = Self::run_task(&shared, |session| {
                adapter::run_flush(session, &mut task)
            })
            .map(|()| task.into_output());
            shared.phase.store(Phase::Opened);
            let _ = tx.send(result);
        });

        Ok(Completion { rx })
    }

    /// Close the engine session and reset the leftover carry.
    ///
    /// Synchronous: closing has no variable-length work, so it is not
    /// offloaded. Rejected while a task is in flight rather than cancelling
    /// it.
    ///
    /// # Errors
    ///
    /// [`StreamError::NotOpen`], [`StreamError::Resampling`],
    /// [`StreamError::Flushing`], or [`StreamError::Closing`].
    pub fn close(&self) -> StreamResult<()> {
        self.shared.phase.transition(Phase::Opened, Phase::Closing)?;

        self.shared.session.lock().take();
        self.shared.leftover.lock().clear();
        self.shared.phase.store(Phase::Closed);
        debug!("stream closed");
        Ok(())
    }

    /// Take the session, run a task body against it, and put it back.
    fn run_task(
        shared: &Shared<B::Session>,
        run: impl FnOnce(&mut B::Session) -> StreamResult<()>,
    ) -> StreamResult<()> {
        let Some(mut session) = shared.session.lock().take() else {
            return Err(StreamError::NotOpen);
        };
        let result = run(&mut session);
        *shared.session.lock() = Some(session);
        result
    }
}
