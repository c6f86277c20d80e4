//! # Aulos Engine
//!
//! Conversion engine seam for the aulos resampling pipeline.
//!
//! The seam is two traits: [`ResampleBackend`] opens sessions, and
//! [`EngineSession`] converts frames until the session is dropped. The
//! stream layer in `aulos-stream` owns a session between open and close and
//! drives it through these traits; everything about the conversion math stays
//! behind the seam.
//!
//! Two backends ship with the crate:
//!
//! - [`RubatoBackend`] — production backend over
//!   [rubato](https://crates.io/crates/rubato)
//! - [`MockBackend`] — deterministic backend with behavior knobs for tests

#![forbid(unsafe_code)]

mod error;
mod mock;
mod rubato_backend;
mod session;

pub use error::{EngineError, EngineResult};
pub use mock::{MockBackend, MockSession};
pub use rubato_backend::{RubatoBackend, RubatoSession};
pub use session::{Advance, EngineSession, FRAME_BYTES, Quality, ResampleBackend};
