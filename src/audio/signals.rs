//! Isochronic tone synthesis
//!
//! Pure sample math: a rectangular gate pulsing at the entrainment rate,
//! a sine carrier, and optional fixed Schumann overtones. Everything here
//! is a function of a parameter snapshot and a time offset; rendering the
//! same inputs twice yields bit-identical output.

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Schumann resonance fundamental (Hz), the default pulse rate
pub const SCHUMANN_FUNDAMENTAL: f32 = 7.83;
/// First fixed overtone frequency (Hz), not derived from the pulse rate
pub const SCHUMANN_HARMONIC_1: f32 = 14.3;
/// Second fixed overtone frequency (Hz)
pub const SCHUMANN_HARMONIC_2: f32 = 20.8;

/// Reference output sample rate (Hz)
pub const SAMPLE_RATE: u32 = 48_000;

/// Headroom applied during quantization (0.25 of full scale)
pub const AMPLITUDE_SCALE: f32 = 0.25;

/// Immutable snapshot of the frequencies, volumes and mix needed to render
/// one block of samples. Copied on every handoff, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneParameters {
    /// Entrainment/pulse rate in Hz
    pub base_frequency: f32,
    /// Audible tone frequency in Hz
    pub carrier_frequency: f32,
    /// Enable fixed overtone mixing
    pub use_harmonics: bool,
    /// Overtone intensity, 0-1
    pub harmonic_mix: f32,
    /// Output level, 0-1, applied during quantization
    pub volume: f32,
    /// Fraction of each pulse cycle during which the carrier is audible, 0-1
    pub modulation_depth: f32,
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self {
            base_frequency: SCHUMANN_FUNDAMENTAL,
            carrier_frequency: 200.0,
            use_harmonics: false,
            harmonic_mix: 0.2,
            volume: 0.5,
            modulation_depth: 0.8,
        }
    }
}

impl ToneParameters {
    /// Check that every field is inside its domain for the given sample
    /// rate. Rejections carry the offending value so callers can log them.
    pub fn validate(&self, sample_rate: u32) -> Result<(), AudioError> {
        let nyquist = sample_rate as f32 / 2.0;
        if !(self.base_frequency > 0.0 && self.base_frequency < nyquist) {
            return Err(AudioError::InvalidParameters(format!(
                "base_frequency must be in (0, {}), got {}",
                nyquist, self.base_frequency
            )));
        }
        if !(self.carrier_frequency > 0.0 && self.carrier_frequency < nyquist) {
            return Err(AudioError::InvalidParameters(format!(
                "carrier_frequency must be in (0, {}), got {}",
                nyquist, self.carrier_frequency
            )));
        }
        for (name, value) in [
            ("harmonic_mix", self.harmonic_mix),
            ("volume", self.volume),
            ("modulation_depth", self.modulation_depth),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AudioError::InvalidParameters(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Number of samples in one full pulse cycle at the given sample rate.
/// The render loop uses this as its block length so the write granularity
/// tracks the current entrainment frequency.
pub fn samples_per_cycle(params: &ToneParameters, sample_rate: u32) -> usize {
    (sample_rate as f64 / params.base_frequency as f64)
        .round()
        .max(1.0) as usize
}

/// Rectangular gate at `base_frequency` Hz with `modulation_depth` duty.
pub fn envelope(params: &ToneParameters, t: f64) -> f32 {
    let phase = (t * params.base_frequency as f64).fract();
    if phase < params.modulation_depth as f64 {
        1.0
    } else {
        0.0
    }
}

/// One sample's amplitude at elapsed time `t` seconds, before quantization.
///
/// The harmonic bed is added unconditionally scaled by `harmonic_mix`; it
/// is not gated by the pulse envelope.
pub fn sample_value(params: &ToneParameters, t: f64) -> f32 {
    use std::f64::consts::PI;

    let carrier = (2.0 * PI * params.carrier_frequency as f64 * t).sin() as f32;

    let mut harmonic = 0.0f32;
    if params.use_harmonics {
        harmonic = (2.0 * PI * SCHUMANN_HARMONIC_1 as f64 * t).sin() as f32 * 0.5
            + (2.0 * PI * SCHUMANN_HARMONIC_2 as f64 * t).sin() as f32 * 0.3;
    }

    carrier * envelope(params, t) + harmonic * params.harmonic_mix
}

/// Render `count` 16-bit samples starting at `start_time` seconds.
///
/// Pure: no side effects, safe from any thread. Quantization scales by the
/// fixed headroom constant and the snapshot's volume, clamping to the
/// representable range.
pub fn render_block(
    params: &ToneParameters,
    start_time: f64,
    sample_rate: u32,
    count: usize,
) -> Vec<i16> {
    let max_amplitude = i16::MAX as f32 * AMPLITUDE_SCALE * params.volume;
    let mut block = Vec::with_capacity(count);

    for i in 0..count {
        let t = start_time + i as f64 / sample_rate as f64;
        let value = sample_value(params, t) * max_amplitude;
        block.push(value.clamp(i16::MIN as f32, i16::MAX as f32) as i16);
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_params() -> ToneParameters {
        ToneParameters {
            base_frequency: SCHUMANN_FUNDAMENTAL,
            carrier_frequency: 200.0,
            use_harmonics: false,
            harmonic_mix: 0.0,
            volume: 1.0,
            modulation_depth: 0.8,
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let params = ToneParameters {
            use_harmonics: true,
            ..reference_params()
        };
        let a = render_block(&params, 1.25, SAMPLE_RATE, 4096);
        let b = render_block(&params, 1.25, SAMPLE_RATE, 4096);
        assert_eq!(a, b);
    }

    #[test]
    fn test_envelope_duty_fraction_over_one_cycle() {
        let params = reference_params();
        let cycle = samples_per_cycle(&params, SAMPLE_RATE);
        assert_eq!(cycle, 6130); // round(48000 / 7.83)

        let gated_on = (0..cycle)
            .filter(|&i| envelope(&params, i as f64 / SAMPLE_RATE as f64) == 1.0)
            .count() as i64;

        // 0.8 of the cycle, within one sample's rounding error
        let expected = (params.modulation_depth as f64 * cycle as f64).round() as i64;
        assert!(
            (gated_on - expected).abs() <= 1,
            "expected ~{} gated samples, got {}",
            expected,
            gated_on
        );
    }

    #[test]
    fn test_zero_depth_renders_silence() {
        let params = ToneParameters {
            modulation_depth: 0.0,
            ..reference_params()
        };
        let block = render_block(&params, 0.0, SAMPLE_RATE, 2048);
        assert!(block.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_full_depth_never_gates() {
        let params = ToneParameters {
            modulation_depth: 1.0,
            ..reference_params()
        };
        let cycle = samples_per_cycle(&params, SAMPLE_RATE);
        for i in 0..cycle {
            assert_eq!(envelope(&params, i as f64 / SAMPLE_RATE as f64), 1.0);
        }
    }

    #[test]
    fn test_harmonic_bed_sounds_while_gate_closed() {
        // The overtone mix bypasses the pulse gate: with the carrier fully
        // gated off, enabling harmonics must still produce output.
        let params = ToneParameters {
            modulation_depth: 0.0,
            use_harmonics: true,
            harmonic_mix: 1.0,
            volume: 1.0,
            ..reference_params()
        };
        let block = render_block(&params, 0.0, SAMPLE_RATE, 4800);
        assert!(block.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_volume_scales_quantized_output() {
        let loud = render_block(&reference_params(), 0.0, SAMPLE_RATE, 512);
        let quiet = render_block(
            &ToneParameters {
                volume: 0.25,
                ..reference_params()
            },
            0.0,
            SAMPLE_RATE,
            512,
        );
        let peak_loud = loud.iter().map(|s| s.unsigned_abs()).max().unwrap();
        let peak_quiet = quiet.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak_loud > 0);
        assert!(peak_quiet < peak_loud);
        // Headroom keeps even full volume well under full scale
        assert!(peak_loud <= (i16::MAX as f32 * AMPLITUDE_SCALE) as u16 + 1);
    }

    #[test]
    fn test_validation_rejects_out_of_domain_values() {
        let zero_base = ToneParameters {
            base_frequency: 0.0,
            ..reference_params()
        };
        assert!(matches!(
            zero_base.validate(SAMPLE_RATE),
            Err(AudioError::InvalidParameters(_))
        ));

        let above_nyquist = ToneParameters {
            carrier_frequency: 24_000.0,
            ..reference_params()
        };
        assert!(above_nyquist.validate(SAMPLE_RATE).is_err());

        let hot_volume = ToneParameters {
            volume: 1.5,
            ..reference_params()
        };
        assert!(hot_volume.validate(SAMPLE_RATE).is_err());

        let negative_depth = ToneParameters {
            modulation_depth: -0.1,
            ..reference_params()
        };
        assert!(negative_depth.validate(SAMPLE_RATE).is_err());

        assert!(reference_params().validate(SAMPLE_RATE).is_ok());
    }

    #[test]
    fn test_block_length_tracks_base_frequency() {
        let mut params = reference_params();
        params.base_frequency = 480.0;
        assert_eq!(samples_per_cycle(&params, SAMPLE_RATE), 100);
        params.base_frequency = 240.0;
        assert_eq!(samples_per_cycle(&params, SAMPLE_RATE), 200);
    }

    #[test]
    fn test_preset_deserializes_and_validates() {
        let json = r#"{
            "base_frequency": 7.83,
            "carrier_frequency": 200.0,
            "use_harmonics": true,
            "harmonic_mix": 0.3,
            "volume": 0.5,
            "modulation_depth": 0.8
        }"#;
        let params: ToneParameters = serde_json::from_str(json).unwrap();
        assert!(params.validate(SAMPLE_RATE).is_ok());
        assert_eq!(params.base_frequency, SCHUMANN_FUNDAMENTAL);
        assert!(params.use_harmonics);
    }
}
