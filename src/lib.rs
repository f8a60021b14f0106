//! isotone: a real-time isochronic tone generator.
//!
//! Synthesizes a continuous mono PCM stream (a sine carrier gated on and
//! off at a low entrainment rate, with optional fixed overtones) and
//! feeds it to a low-latency output device from a background render loop.
//!
//! ```no_run
//! use std::sync::Arc;
//! use isotone::audio::engine::GeneratorEngine;
//! use isotone::audio::output::CpalBackend;
//! use isotone::audio::signals::ToneParameters;
//!
//! let engine = GeneratorEngine::new(Arc::new(CpalBackend::new()));
//! engine.start(ToneParameters::default())?;
//! engine.update(ToneParameters {
//!     base_frequency: 10.0,
//!     ..ToneParameters::default()
//! })?;
//! engine.stop();
//! # Ok::<(), isotone::error::AudioError>(())
//! ```

pub mod audio;
pub mod error;

pub use audio::engine::{EngineState, GeneratorEngine};
pub use audio::signals::ToneParameters;
pub use error::AudioError;
