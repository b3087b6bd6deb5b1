use std::f32::consts::PI;

use crate::config::Calibration;
use crate::signal_processing::math::db_to_linear;

/// Spectral shape of a synthetic source.
///
/// Two sinusoid components, one in the estimator's low band and one in its
/// high band, with the high component losing level per meter of travel.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct SourceSpec {
    /// Low-band component frequency in Hz
    pub low_hz: f32,
    /// High-band component frequency in Hz
    pub high_hz: f32,
    /// High-band loss in dB per meter of travel, a crude air-absorption model
    pub high_rolloff_db_per_m: f32,
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self {
            low_hz: 300.0,
            high_hz: 3000.0,
            high_rolloff_db_per_m: 0.6,
        }
    }
}

/// Generate a pure sine tone.
pub fn generate_tone(freq_hz: f32, amplitude: f32, sample_rate: u32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * freq_hz * t).sin()
        })
        .collect()
}

/// Generate a harmonic complex: `amplitudes[k]` scales harmonic k+1 of the
/// fundamental.
pub fn generate_harmonic_tone(
    fundamental_hz: f32,
    amplitudes: &[f32],
    sample_rate: u32,
    num_samples: usize,
) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitudes
                .iter()
                .enumerate()
                .map(|(k, &a)| a * (2.0 * PI * fundamental_hz * (k + 1) as f32 * t).sin())
                .sum()
        })
        .collect()
}

/// Synthesize what a calibrated source sounds like from `distance_m` away.
///
/// The overall level follows the inverse square law against the
/// calibration reference (`L = L_ref - 20·log10(d/d_ref)`, taking
/// `20·log10(rms)` as the level), and the high component rolls off with
/// distance per the spec. Distant loud references can exceed full scale;
/// these are analysis signals, not playback material.
pub fn generate_source_at_distance(
    distance_m: f32,
    calibration: &Calibration,
    spec: &SourceSpec,
    sample_rate: u32,
    num_samples: usize,
) -> Vec<f32> {
    let level_db = calibration.reference_level_db()
        - 20.0 * (distance_m / calibration.reference_distance_m()).log10();
    let target_rms = db_to_linear(level_db);

    let high_gain = db_to_linear(-spec.high_rolloff_db_per_m * distance_m);

    let mut samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * PI * spec.low_hz * t).sin() + high_gain * (2.0 * PI * spec.high_hz * t).sin()
        })
        .collect();

    let current_rms =
        (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len().max(1) as f32).sqrt();
    if current_rms > 0.0 {
        let scale = target_rms / current_rms;
        for sample in samples.iter_mut() {
            *sample *= scale;
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_tone_amplitude() {
        let tone = generate_tone(440.0, 0.5, 48000, 48000);
        assert_relative_eq!(rms(&tone), 0.5 / 2.0_f32.sqrt(), max_relative = 0.01);
    }

    #[test]
    fn test_source_level_follows_inverse_square() {
        let cal = Calibration::new(40.0, 1.0).unwrap();
        let spec = SourceSpec::default();

        let at_1m = generate_source_at_distance(1.0, &cal, &spec, 48000, 48000);
        let at_10m = generate_source_at_distance(10.0, &cal, &spec, 48000, 48000);

        let level_1m = 20.0 * rms(&at_1m).log10();
        let level_10m = 20.0 * rms(&at_10m).log10();

        // Ten times the distance drops the level by 20 dB
        assert_relative_eq!(level_1m - level_10m, 20.0, epsilon = 0.1);
        assert_relative_eq!(level_1m, 40.0, epsilon = 0.1);
    }

    #[test]
    fn test_high_component_rolls_off_with_distance() {
        let spec = SourceSpec::default();
        let near = db_to_linear(-spec.high_rolloff_db_per_m * 1.0);
        let far = db_to_linear(-spec.high_rolloff_db_per_m * 30.0);
        assert!(far < near * 0.1);
    }

    #[test]
    fn test_harmonic_tone_sums_components() {
        let complex = generate_harmonic_tone(200.0, &[0.5, 0.25], 48000, 4800);
        let single = generate_tone(200.0, 0.5, 48000, 4800);
        assert!(rms(&complex) > rms(&single));
    }
}
