//! Output buffer sizing for conversion and flush tasks.

/// Fixed safety margin in bytes added to every conversion output buffer.
///
/// Covers engine-internal latency that can emit more than the strict
/// input×factor bound on a single call, and degenerate zero-input calls.
pub(crate) const OUTPUT_PAD_BYTES: usize = 1024;

/// Output capacity in bytes for a conversion over `aligned_len` input bytes.
pub(crate) fn convert_capacity(aligned_len: usize, factor: f64) -> usize {
    (aligned_len as f64 * factor + OUTPUT_PAD_BYTES as f64) as usize
}

/// Output capacity in bytes for a flush (no new input).
pub(crate) fn flush_capacity(factor: f64) -> usize {
    (factor * OUTPUT_PAD_BYTES as f64) as usize
}
