//! Channel-driven pipeline: lazy open, convert each chunk, flush at end.

use aulos_engine::ResampleBackend;
use bytes::Bytes;
use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::{
    error::{StreamError, StreamResult},
    stream::{ResampleStream, StreamConfig},
};

/// Converted-output channel depth.
const OUTPUT_CHANNEL_CAPACITY: usize = 32;

/// Channel-driven convenience wrapper around [`ResampleStream`].
///
/// The driver task opens the stream on the first received chunk, converts
/// every chunk in order, and forwards non-empty output. When the input
/// channel closes it flushes the engine, forwards the tail, and closes the
/// stream.
pub struct ResamplePipeline {
    handle: JoinHandle<StreamResult<()>>,
    output_rx: Option<AsyncReceiver<Bytes>>,
}

impl ResamplePipeline {
    /// Spawn the driver task on the current runtime.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidRate`] when the config is unusable.
    pub fn spawn<B: ResampleBackend>(
        backend: B,
        config: StreamConfig,
        input_rx: AsyncReceiver<Bytes>,
    ) -> StreamResult<Self> {
        let stream = ResampleStream::new(backend, config)?;
        let (output_tx, output_rx) = kanal::bounded_async(OUTPUT_CHANNEL_CAPACITY);
        let handle = tokio::spawn(run_pipeline(stream, input_rx, output_tx));

        Ok(Self {
            handle,
            output_rx: Some(output_rx),
        })
    }

    /// Take ownership of the converted-output receiver.
    pub fn take_output_receiver(&mut self) -> Option<AsyncReceiver<Bytes>> {
        self.output_rx.take()
    }

    /// Wait for the driver to finish (input closed, tail flushed, stream
    /// closed).
    ///
    /// # Errors
    ///
    /// The first stream or engine error the driver hit, or
    /// [`StreamError::ChannelClosed`] when the driver task died.
    pub async fn wait(self) -> StreamResult<()> {
        match self.handle.await {
            Ok(result) => result,
            Err(_) => Err(StreamError::ChannelClosed),
        }
    }
}

async fn run_pipeline<B: ResampleBackend>(
    stream: ResampleStream<B>,
    input_rx: AsyncReceiver<Bytes>,
    output_tx: AsyncSender<Bytes>,
) -> StreamResult<()> {
    let mut chunks: u64 = 0;

    while let Ok(chunk) = input_rx.recv().await {
        if !stream.opened() {
            stream.open()?;
        }

        let converted = stream.resample(&chunk)?.recv().await?;
        trace!(
            chunk = chunks,
            in_len = chunk.len(),
            out_len = converted.len(),
            "pipeline chunk converted"
        );
        chunks += 1;

        if !converted.is_empty() && output_tx.send(converted).await.is_err() {
            debug!(chunks, "pipeline output receiver dropped");
            return Ok(());
        }
    }

    if stream.opened() {
        let tail = stream.flush()?.recv().await?;
        if !tail.is_empty() {
            let _ = output_tx.send(tail).await;
        }
        stream.close()?;
    }

    debug!(chunks, "pipeline finished");
    Ok(())
}
