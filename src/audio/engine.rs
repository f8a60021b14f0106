//! Isochronic tone generator engine
//!
//! Owns the current parameter snapshot, the running/stopped state and the
//! background render loop. The caller's thread issues start/update/stop;
//! exactly one render thread per running engine reads the latest snapshot
//! once per block, renders one pulse cycle and pushes it to the sink, paced
//! by playback backpressure.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use super::device::AudioConfig;
use super::signals::{self, ToneParameters};
use super::sink::{AudioBackend, AudioSink};
use crate::error::AudioError;

/// Current state of the generator engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Stopped,
    Running,
}

/// State shared between the caller's thread and the render thread.
///
/// The caller is the sole writer of the snapshot and the stop flag; the
/// render thread is the sole writer of the running flag and the error slot.
/// The snapshot is read once per block, so there are no locks inside the
/// per-sample loop.
struct EngineShared {
    /// Latest published parameter snapshot
    params: RwLock<ToneParameters>,
    /// True while a render loop is producing blocks
    is_running: AtomicBool,
    /// Cooperative stop signal, polled once per block
    should_stop: AtomicBool,
    /// Filled by the render loop on a mid-stream sink failure
    last_error: RwLock<Option<AudioError>>,
}

/// Real-time isochronic tone generator.
///
/// Constructed around an [`AudioBackend`]; each `start` opens a fresh sink
/// through it and spawns one render thread, each `stop` joins that thread
/// and releases the sink. Dropping the engine stops it.
pub struct GeneratorEngine {
    backend: Arc<dyn AudioBackend>,
    config: AudioConfig,
    shared: Arc<EngineShared>,
    /// Also serializes start/stop against each other
    render_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl GeneratorEngine {
    /// Create a stopped engine with the reference output shape (mono,
    /// 48 kHz, 16-bit).
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self::with_config(backend, AudioConfig::default())
    }

    pub fn with_config(backend: Arc<dyn AudioBackend>, config: AudioConfig) -> Self {
        Self {
            backend,
            config,
            shared: Arc::new(EngineShared {
                params: RwLock::new(ToneParameters::default()),
                is_running: AtomicBool::new(false),
                should_stop: AtomicBool::new(false),
                last_error: RwLock::new(None),
            }),
            render_thread: Mutex::new(None),
        }
    }

    /// Start playback with the given snapshot.
    ///
    /// No-op if already running: a second `start` neither reopens the sink
    /// nor spawns a second loop. The sink is opened on the render thread
    /// (it lives there for its whole life), but open failures are reported
    /// synchronously and leave the engine stopped.
    pub fn start(&self, params: ToneParameters) -> Result<(), AudioError> {
        params.validate(self.config.sample_rate)?;

        let mut thread_slot = self.render_thread.lock();
        if self.shared.is_running.load(Ordering::SeqCst) {
            log::debug!("Engine already running, start is a no-op");
            return Ok(());
        }
        // Reap a loop that exited on its own after a write failure
        if let Some(handle) = thread_slot.take() {
            let _ = handle.join();
        }

        *self.shared.params.write() = params;
        self.shared.should_stop.store(false, Ordering::SeqCst);
        *self.shared.last_error.write() = None;

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut sink = match backend.open(&config) {
                Ok(sink) => sink,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };
            // Device gain pinned to unity; level comes from the rendered
            // samples themselves
            sink.set_volume(1.0);

            shared.is_running.store(true, Ordering::SeqCst);
            let _ = ready_tx.send(Ok(()));

            render_loop(&shared, sink.as_mut(), config.sample_rate);

            sink.close();
            shared.is_running.store(false, Ordering::SeqCst);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!(
                    "Engine started: {} Hz pulse, {} Hz carrier",
                    params.base_frequency,
                    params.carrier_frequency
                );
                *thread_slot = Some(handle);
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::SinkUnavailable(
                    "render thread exited before opening the sink".to_string(),
                ))
            }
        }
    }

    /// Publish a new snapshot.
    ///
    /// While running it reaches the render loop no later than the start of
    /// the next block. While stopped it only replaces the stored snapshot
    /// reported by [`current_parameters`](Self::current_parameters).
    pub fn update(&self, params: ToneParameters) -> Result<(), AudioError> {
        params.validate(self.config.sample_rate)?;
        *self.shared.params.write() = params;
        Ok(())
    }

    /// Stop playback: signal the loop, wait for it to exit and release the
    /// sink. Safe to call when already stopped.
    pub fn stop(&self) {
        let mut thread_slot = self.render_thread.lock();
        self.shared.should_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = thread_slot.take() {
            let _ = handle.join();
            log::info!("Engine stopped");
        }
        self.shared.should_stop.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> EngineState {
        if self.is_running() {
            EngineState::Running
        } else {
            EngineState::Stopped
        }
    }

    /// Entrainment rate of the current snapshot (Hz)
    pub fn current_frequency(&self) -> f32 {
        self.shared.params.read().base_frequency
    }

    pub fn current_parameters(&self) -> ToneParameters {
        *self.shared.params.read()
    }

    /// Take the error that terminated the render loop, if any.
    pub fn take_error(&self) -> Option<AudioError> {
        self.shared.last_error.write().take()
    }
}

impl Drop for GeneratorEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Render loop body. Runs on the dedicated render thread until stopped or
/// the sink fails.
///
/// The time cursor is monotonic and continuous across snapshot swaps:
/// changing frequencies mid-stream never resets phase.
fn render_loop(shared: &EngineShared, sink: &mut dyn AudioSink, sample_rate: u32) {
    let mut clock = 0.0f64;

    loop {
        if shared.should_stop.load(Ordering::SeqCst) {
            break;
        }

        // One snapshot read per block; block length tracks the current
        // entrainment frequency (one pulse cycle per write)
        let params = *shared.params.read();
        let count = signals::samples_per_cycle(&params, sample_rate);
        let block = signals::render_block(&params, clock, sample_rate, count);

        if let Err(err) = sink.write(&block) {
            log::error!("Render loop terminated: {}", err);
            *shared.last_error.write() = Some(err);
            break;
        }

        clock += count as f64 / sample_rate as f64;
    }
}
