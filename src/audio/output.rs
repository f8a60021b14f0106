//! cpal-backed audio output sink
//!
//! Bridges the engine's blocking block writes to cpal's pull-model callback
//! with a lock-free ring buffer: the render thread pushes 16-bit PCM, the
//! device callback pops it, converts to f32 and applies the master gain.

use cpal::traits::{DeviceTrait, StreamTrait};
use ringbuf::{traits::*, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::device::{get_output_device, get_supported_config, AudioConfig};
use super::sink::{AudioBackend, AudioSink};
use crate::error::AudioError;

/// Helper to store f32 in AtomicU32
#[inline]
fn f32_to_u32(f: f32) -> u32 {
    f.to_bits()
}

/// Helper to load f32 from AtomicU32
#[inline]
fn u32_to_f32(u: u32) -> f32 {
    f32::from_bits(u)
}

/// How long a full-queue `write` sleeps before retrying
const WRITE_POLL: Duration = Duration::from_millis(1);

/// State shared between the writer side and the device callback
struct SinkShared {
    /// Master gain, f32 bits for lock-free access
    master_gain: AtomicU32,
    /// Set by the stream error callback; turns the next write into an error
    failed: AtomicBool,
}

/// Backend that opens cpal sinks, optionally pinned to a named device.
pub struct CpalBackend {
    device_name: Option<String>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self { device_name: None }
    }

    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn open(&self, config: &AudioConfig) -> Result<Box<dyn AudioSink>, AudioError> {
        Ok(Box::new(CpalSink::open(self.device_name.as_deref(), config)?))
    }
}

/// An open cpal output stream accepting mono 16-bit PCM.
pub struct CpalSink {
    stream: Option<cpal::Stream>,
    producer: HeapProd<i16>,
    shared: Arc<SinkShared>,
    device_name: String,
}

impl CpalSink {
    /// Open the named (or default) output device and start playback.
    pub fn open(device_name: Option<&str>, config: &AudioConfig) -> Result<Self, AudioError> {
        let device = get_output_device(device_name)?;
        let device_name_str = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let stream_config = get_supported_config(&device, config)?;
        let channels = stream_config.channels as usize;

        log::info!(
            "Opening output sink: {} @ {} Hz, {} channels",
            device_name_str,
            stream_config.sample_rate.0,
            channels
        );
        if stream_config.sample_rate.0 != config.sample_rate {
            log::warn!(
                "Device does not support {} Hz, playing at {} Hz",
                config.sample_rate,
                stream_config.sample_rate.0
            );
        }

        // Double buffer for smoothness: one block playing, one queued
        let rb = HeapRb::<i16>::new(config.buffer_size as usize * 2);
        let (producer, mut consumer) = rb.split();

        let shared = Arc::new(SinkShared {
            master_gain: AtomicU32::new(f32_to_u32(1.0)),
            failed: AtomicBool::new(false),
        });
        let shared_cb = Arc::clone(&shared);
        let shared_err = Arc::clone(&shared);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let gain = u32_to_f32(shared_cb.master_gain.load(Ordering::Relaxed));
                    for frame in data.chunks_mut(channels) {
                        // Underruns play silence until the writer catches up
                        let sample = consumer
                            .try_pop()
                            .map(|s| s as f32 / i16::MAX as f32)
                            .unwrap_or(0.0)
                            * gain;
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                },
                move |err| {
                    log::error!("Output stream error: {}", err);
                    shared_err.failed.store(true, Ordering::SeqCst);
                },
                None, // No timeout
            )
            .map_err(|e| {
                AudioError::SinkUnavailable(format!("failed to build output stream: {}", e))
            })?;

        stream
            .play()
            .map_err(|e| AudioError::SinkUnavailable(format!("failed to start stream: {}", e)))?;

        Ok(Self {
            stream: Some(stream),
            producer,
            shared,
            device_name: device_name_str,
        })
    }
}

impl AudioSink for CpalSink {
    fn write(&mut self, samples: &[i16]) -> Result<(), AudioError> {
        let mut written = 0;
        while written < samples.len() {
            if self.shared.failed.load(Ordering::SeqCst) {
                return Err(AudioError::SinkWriteFailure(
                    "output stream reported a device error".to_string(),
                ));
            }
            if self.stream.is_none() {
                return Err(AudioError::SinkWriteFailure("sink is closed".to_string()));
            }

            let pushed = self.producer.push_slice(&samples[written..]);
            written += pushed;
            if pushed == 0 {
                // Queue full: wait for the device to drain. This is the
                // backpressure that paces the render loop to real time.
                thread::sleep(WRITE_POLL);
            }
        }
        Ok(())
    }

    fn set_volume(&mut self, level: f32) {
        self.shared
            .master_gain
            .store(f32_to_u32(level.clamp(0.0, 1.0)), Ordering::Relaxed);
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            log::info!("Output sink closed: {}", self.device_name);
        }
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.close();
    }
}
