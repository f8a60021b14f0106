//! Output sink abstraction consumed by the generator engine
//!
//! The engine renders mono 16-bit PCM and pushes it through these traits;
//! `crate::audio::output` provides the cpal-backed implementation, tests
//! substitute their own.

use crate::audio::device::AudioConfig;
use crate::error::AudioError;

/// An open, playing audio output.
///
/// `write` is the engine's only blocking point: it returns once the sink
/// has accepted the whole block, waiting on playback backpressure when the
/// queue is full. Implementations live on the render thread for their whole
/// lifetime.
pub trait AudioSink {
    /// Queue a block of mono 16-bit samples, blocking until accepted.
    fn write(&mut self, samples: &[i16]) -> Result<(), AudioError>;

    /// Set the device-level master gain, 0-1.
    fn set_volume(&mut self, level: f32);

    /// Release the output device. Further writes fail.
    fn close(&mut self);
}

/// Opens sinks for the engine. The engine holds one backend for its whole
/// life and opens a fresh sink on every `start`.
pub trait AudioBackend: Send + Sync {
    fn open(&self, config: &AudioConfig) -> Result<Box<dyn AudioSink>, AudioError>;
}
