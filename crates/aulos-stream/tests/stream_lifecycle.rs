//! Lifecycle and single-flight behavior of `ResampleStream`.

use std::time::Duration;

use aulos_stream::{
    MockBackend, Quality, ResampleStream, RubatoBackend, StreamConfig, StreamError,
};

const OUTPUT_PAD_BYTES: f64 = 1024.0;

fn frames_to_bytes(frames: &[f32]) -> Vec<u8> {
    frames.iter().flat_map(|f| f.to_ne_bytes()).collect()
}

/// 4002 bytes: 1000 whole frames plus a 2-byte partial.
fn spec_chunk() -> Vec<u8> {
    let frames: Vec<f32> = (0..1000).map(|i| (i as f32) * 0.001 - 0.5).collect();
    let mut bytes = frames_to_bytes(&frames);
    bytes.extend_from_slice(&[7, 7]);
    bytes
}

#[tokio::test]
async fn test_full_lifecycle_scenario() {
    let config = StreamConfig::new(44100, 48000).with_quality(Quality::High);
    let stream = ResampleStream::new(MockBackend::new().with_flush_tail(2), config).unwrap();
    let factor = stream.factor();

    stream.open().unwrap();
    assert!(stream.opened());

    let chunk = spec_chunk();
    let out = stream.resample(&chunk).unwrap().recv().await.unwrap();

    // 4000 aligned bytes in; output within pad tolerance of the factor bound.
    let expected = 4000.0 * factor;
    assert!(
        (out.len() as f64 - expected).abs() < OUTPUT_PAD_BYTES,
        "got {} bytes, expected about {expected}",
        out.len()
    );
    assert!(out.len() as f64 <= expected + OUTPUT_PAD_BYTES);
    assert_eq!(out.len() % 4, 0);

    let tail = stream.flush().unwrap().recv().await.unwrap();
    assert_eq!(tail.len(), 8);
    assert!(stream.opened());

    stream.close().unwrap();
    assert!(!stream.opened());
}

#[tokio::test]
async fn test_second_resample_fails_fast_without_disturbing_first() {
    let backend = MockBackend::new().with_delay(Duration::from_millis(50));
    let stream = ResampleStream::new(backend, StreamConfig::new(44100, 44100)).unwrap();
    stream.open().unwrap();

    let frames: Vec<f32> = vec![0.5; 16];
    let completion = stream.resample(&frames_to_bytes(&frames)).unwrap();

    // Guard failure is synchronous and leaves the in-flight task alone.
    let err = stream.resample(&[0_u8; 8]).unwrap_err();
    assert!(matches!(err, StreamError::Resampling));
    assert!(stream.opened());

    let out = completion.recv().await.unwrap();
    assert_eq!(out.len(), 64);
}

#[tokio::test]
async fn test_resample_during_flush_fails_fast() {
    let backend = MockBackend::new().with_delay(Duration::from_millis(50));
    let stream = ResampleStream::new(backend, StreamConfig::new(44100, 44100)).unwrap();
    stream.open().unwrap();

    let completion = stream.flush().unwrap();
    assert!(matches!(
        stream.resample(&[0_u8; 8]),
        Err(StreamError::Flushing)
    ));
    assert!(matches!(stream.flush(), Err(StreamError::Flushing)));

    completion.recv().await.unwrap();
    stream.close().unwrap();
}

#[tokio::test]
async fn test_restart_replays_identically() {
    let stream = ResampleStream::new(MockBackend::new(), StreamConfig::new(44100, 48000)).unwrap();
    let chunk = spec_chunk();

    stream.open().unwrap();
    let first = stream.resample(&chunk).unwrap().recv().await.unwrap();
    stream.close().unwrap();

    // A fresh open starts from a clean carry: same input, same output.
    stream.open().unwrap();
    let second = stream.resample(&chunk).unwrap().recv().await.unwrap();
    stream.close().unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_output_never_exceeds_policy_capacity() {
    let stream = ResampleStream::new(MockBackend::new(), StreamConfig::new(8000, 96000)).unwrap();
    let factor = stream.factor();
    stream.open().unwrap();

    for chunk_frames in [1_usize, 7, 64, 500] {
        let chunk = frames_to_bytes(&vec![0.25_f32; chunk_frames]);
        let out = stream.resample(&chunk).unwrap().recv().await.unwrap();
        let capacity = (chunk.len() as f64 * factor + OUTPUT_PAD_BYTES) as usize;
        assert!(
            out.len() <= capacity,
            "{} frames produced {} bytes, capacity {capacity}",
            chunk_frames,
            out.len()
        );
    }
}

#[tokio::test]
async fn test_rubato_backend_smoke() {
    let config = StreamConfig::new(44100, 48000).with_quality(Quality::High);
    let stream = ResampleStream::new(RubatoBackend, config).unwrap();
    let factor = stream.factor();
    stream.open().unwrap();

    // 2048 frames of a ramp; several engine blocks worth.
    let frames: Vec<f32> = (0..2048).map(|i| (i as f32 / 2048.0) - 0.5).collect();
    let chunk = frames_to_bytes(&frames);

    let out = stream.resample(&chunk).unwrap().recv().await.unwrap();
    let tail = stream.flush().unwrap().recv().await.unwrap();
    stream.close().unwrap();

    let total = out.len() + tail.len();
    let expected = chunk.len() as f64 * factor;
    assert_eq!(out.len() % 4, 0);
    assert!(!out.is_empty());
    // Sinc latency holds some frames back; stay within a generous tolerance.
    assert!(
        total as f64 + 8192.0 >= expected,
        "total {total} bytes, expected about {expected}"
    );
    assert!(total as f64 <= expected + OUTPUT_PAD_BYTES);
}

#[tokio::test]
async fn test_rubato_low_quality_smoke() {
    let config = StreamConfig::new(48000, 44100).with_quality(Quality::Low);
    let stream = ResampleStream::new(RubatoBackend, config).unwrap();
    stream.open().unwrap();

    let frames = vec![0.1_f32; 1024];
    let out = stream
        .resample(&frames_to_bytes(&frames))
        .unwrap()
        .recv()
        .await
        .unwrap();
    assert!(!out.is_empty());
    stream.close().unwrap();
}
