//! Tone Demo
//!
//! Plays an isochronic tone on the default output device.
//!
//! Usage: isotone-demo [pulse-hz] [carrier-hz] [seconds] [device-name]
//!
//! Defaults to the Schumann fundamental (7.83 Hz) over a 200 Hz carrier
//! on the default device for 10 seconds, doubling the pulse rate halfway
//! through to show a mid-stream parameter update.

use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use isotone::audio::device::list_output_devices;
use isotone::audio::engine::GeneratorEngine;
use isotone::audio::output::CpalBackend;
use isotone::audio::signals::{ToneParameters, SCHUMANN_FUNDAMENTAL};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();

    let base_frequency = match args.get(1).map(|a| a.parse::<f32>()) {
        Some(Ok(hz)) => hz,
        Some(Err(_)) => {
            eprintln!("Usage: isotone-demo [pulse-hz] [carrier-hz] [seconds]");
            std::process::exit(1);
        }
        None => SCHUMANN_FUNDAMENTAL,
    };
    let carrier_frequency = args
        .get(2)
        .and_then(|a| a.parse::<f32>().ok())
        .unwrap_or(200.0);
    let seconds = args
        .get(3)
        .and_then(|a| a.parse::<u64>().ok())
        .unwrap_or(10);
    let device_name = args.get(4).cloned();

    match list_output_devices() {
        Ok(devices) => {
            for device in devices {
                log::debug!(
                    "Output device: {}{}",
                    device.name,
                    if device.is_default { " (default)" } else { "" }
                );
            }
        }
        Err(err) => log::warn!("Could not enumerate output devices: {}", err),
    }

    let params = ToneParameters {
        base_frequency,
        carrier_frequency,
        ..ToneParameters::default()
    };

    let backend = match device_name {
        Some(name) => CpalBackend::with_device(name),
        None => CpalBackend::new(),
    };
    let engine = GeneratorEngine::new(Arc::new(backend));
    if let Err(err) = engine.start(params) {
        log::error!("Failed to start playback: {}", err);
        std::process::exit(1);
    }
    log::info!(
        "Playing {} Hz pulse over a {} Hz carrier for {}s",
        base_frequency,
        carrier_frequency,
        seconds
    );

    thread::sleep(Duration::from_secs(seconds / 2));

    let doubled = ToneParameters {
        base_frequency: base_frequency * 2.0,
        ..params
    };
    match engine.update(doubled) {
        Ok(()) => log::info!("Pulse rate doubled to {} Hz", doubled.base_frequency),
        Err(err) => log::warn!("Skipping mid-stream update: {}", err),
    }

    thread::sleep(Duration::from_secs(seconds - seconds / 2));

    engine.stop();
    if let Some(err) = engine.take_error() {
        log::error!("Playback ended early: {}", err);
        std::process::exit(1);
    }
}
