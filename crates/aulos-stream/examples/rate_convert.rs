//! Example: convert a generated tone between sample rates.
//!
//! Feeds a 440 Hz sine through the channel pipeline in deliberately awkward
//! chunk sizes to show the frame-carry behavior.
//!
//! Run with:
//! ```
//! cargo run -p aulos-stream --example rate_convert
//! ```

use std::error::Error;

use bytes::Bytes;
use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::EnvFilter;

use aulos_stream::{Quality, ResamplePipeline, RubatoBackend, StreamConfig};

const INPUT_RATE: u32 = 44100;
const OUTPUT_RATE: u32 = 48000;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("aulos_stream=debug".parse()?)
                .add_directive("aulos_engine=debug".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .init();

    // One second of a 440 Hz tone.
    let samples: Vec<f32> = (0..INPUT_RATE)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / INPUT_RATE as f32).sin() * 0.25)
        .collect();
    let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();

    let config = StreamConfig::new(INPUT_RATE, OUTPUT_RATE).with_quality(Quality::High);
    let (input_tx, input_rx) = kanal::bounded_async::<Bytes>(8);
    let mut pipeline = ResamplePipeline::spawn(RubatoBackend, config, input_rx)?;
    let output_rx = pipeline
        .take_output_receiver()
        .expect("receiver taken once");

    tokio::spawn(async move {
        // Chunk sizes that never line up with the 4-byte frame.
        for chunk in pcm.chunks(4001) {
            if input_tx.send(Bytes::copy_from_slice(chunk)).await.is_err() {
                break;
            }
        }
    });

    let mut converted = 0_usize;
    let mut chunks = 0_usize;
    while let Ok(out) = output_rx.recv().await {
        converted += out.len();
        chunks += 1;
    }
    pipeline.wait().await?;

    info!(
        input_bytes = samples.len() * 4,
        output_bytes = converted,
        output_chunks = chunks,
        ratio = converted as f64 / (samples.len() * 4) as f64,
        "conversion finished"
    );
    Ok(())
}
