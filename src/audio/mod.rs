//! Real-time isochronic tone engine
//!
//! Provides low-latency tone playback with:
//! - Pure block rendering (pulse envelope, carrier, Schumann overtones)
//! - A background render loop with per-block parameter handoff
//! - An abstract output sink, cpal-backed in production

pub mod device;
pub mod engine;
pub mod output;
pub mod signals;
pub mod sink;
