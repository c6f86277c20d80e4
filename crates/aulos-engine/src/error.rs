//! Error types for conversion backends.

use thiserror::Error;

/// Errors surfaced by conversion backends.
///
/// Backend-agnostic: third-party failures are wrapped in the `Backend`
/// variant.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid resample factor: {0}")]
    InvalidFactor(f64),

    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
