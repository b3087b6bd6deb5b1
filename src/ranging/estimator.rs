//! Distance estimation from one audio frame and its dB spectrum.
//!
//! Two physical effects drive the estimate. Sound intensity falls off with
//! the square of distance, so the gap between the calibrated reference
//! level and the frame's measured level maps to a distance. Air also
//! absorbs high frequencies faster than low ones, so a spectrum skewed
//! toward the low band suggests a longer path; that skew nudges the
//! intensity estimate outward.

use crate::config::Calibration;
use crate::constants::{
    ATTENUATION_WEIGHT, ENERGY_EPSILON, MAX_DISTANCE_M, MIN_DISTANCE_M, MIN_RMS_THRESHOLD,
};
use crate::error::{RangerError, Result};
use crate::signal_processing::math::{db_to_power, linear_to_db};

/// Search band for the dominant frequency in Hz. Skips DC and the
/// sub/ultra-sonic bins that carry no distance information.
const DOMINANT_BAND_HZ: (f32, f32) = (100.0, 8000.0);

/// Low band compared against the high band for the attenuation factor, Hz.
const LOW_BAND_HZ: (f32, f32) = (100.0, 1000.0);

/// High band; air absorption thins this out over distance, Hz.
const HIGH_BAND_HZ: (f32, f32) = (2000.0, 8000.0);

/// The attenuation factor saturates once the low band carries 11x the
/// high band's mean energy: `clamp((ratio - 1) / SCALE, 0, 1)`.
const ATTENUATION_RATIO_SCALE: f32 = 10.0;

/// Outcome of one estimation tick.
///
/// A frame too quiet to trust is a valid no-signal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceEstimate {
    /// Estimated distance in meters, clamped to [0.1, 50]
    Range(f32),
    /// Frame RMS below the signal floor
    NoSignal,
}

impl DistanceEstimate {
    pub fn meters(&self) -> Option<f32> {
        match self {
            Self::Range(d) => Some(*d),
            Self::NoSignal => None,
        }
    }

    pub fn is_no_signal(&self) -> bool {
        matches!(self, Self::NoSignal)
    }
}

/// Everything computed from one frame, around the estimate itself.
#[derive(Debug, Clone, Copy)]
pub struct FrameAnalysis {
    pub rms: f32,
    pub level_db: f32,
    pub dominant_freq_hz: f32,
    pub attenuation: f32,
    pub estimate: DistanceEstimate,
}

/// Per-frame distance estimator.
///
/// Pure: every method is a function of its arguments and the construction
/// parameters; no state is carried between ticks.
pub struct DistanceEstimator {
    sample_rate: f32,
    fft_size: usize,
}

impl DistanceEstimator {
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            fft_size,
        }
    }

    fn bin_width_hz(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }

    fn bin_at(&self, freq_hz: f32) -> usize {
        (freq_hz / self.bin_width_hz()) as usize
    }

    /// Root-mean-square amplitude of a frame.
    ///
    /// The caller guarantees a fixed non-zero frame length; an empty slice
    /// is outside the contract.
    pub fn compute_rms(&self, frame: &[f32]) -> f32 {
        let sum: f32 = frame.iter().map(|&x| x * x).sum();
        (sum / frame.len() as f32).sqrt()
    }

    /// Frequency of the strongest bin within the 100-8000 Hz search band.
    ///
    /// Ties go to the lowest bin. Returns 0 when the band holds no bins.
    pub fn dominant_frequency(&self, spectrum_db: &[f32]) -> f32 {
        let min_bin = self.bin_at(DOMINANT_BAND_HZ.0);
        let max_bin = self.bin_at(DOMINANT_BAND_HZ.1);

        let mut max_db = f32::NEG_INFINITY;
        let mut max_index = 0;

        for i in min_bin..max_bin.min(spectrum_db.len()) {
            if spectrum_db[i] > max_db {
                max_db = spectrum_db[i];
                max_index = i;
            }
        }

        max_index as f32 * self.bin_width_hz()
    }

    /// High-frequency attenuation factor in [0, 1].
    ///
    /// Compares mean linear energy in the low band (100-1000 Hz) against
    /// the high band (2000-8000 Hz). Each dB bin is converted to linear
    /// power before averaging. The more the low band dominates, the more
    /// the highs have been absorbed in transit, and the larger the factor.
    pub fn high_frequency_attenuation(&self, spectrum_db: &[f32]) -> f32 {
        let low = self.band_mean_power(spectrum_db, LOW_BAND_HZ);
        let high = self.band_mean_power(spectrum_db, HIGH_BAND_HZ);

        let ratio = low / (high + ENERGY_EPSILON);
        ((ratio - 1.0) / ATTENUATION_RATIO_SCALE).clamp(0.0, 1.0)
    }

    fn band_mean_power(&self, spectrum_db: &[f32], band_hz: (f32, f32)) -> f32 {
        let start = self.bin_at(band_hz.0);
        let end = self.bin_at(band_hz.1);

        let mut energy = 0.0;
        for i in start..end.min(spectrum_db.len()) {
            energy += db_to_power(spectrum_db[i]);
        }

        energy / (end - start) as f32
    }

    /// Map frame RMS and spectrum shape to a distance.
    ///
    /// Inverse square law: `L2 = L1 - 20·log10(d2/d1)`, solved for d2
    /// against the calibration reference, then widened by the attenuation
    /// factor. `_dominant_freq_hz` is accepted for symmetry with the other
    /// analysis products; the current formula does not consult it.
    pub fn estimate_distance(
        &self,
        rms: f32,
        _dominant_freq_hz: f32,
        spectrum_db: &[f32],
        calibration: &Calibration,
    ) -> DistanceEstimate {
        let current_db = linear_to_db(rms);
        let db_difference = calibration.reference_level_db() - current_db;
        let intensity_distance =
            calibration.reference_distance_m() * 10.0_f32.powf(db_difference / 20.0);

        let attenuation = self.high_frequency_attenuation(spectrum_db);
        let distance = intensity_distance * (1.0 + attenuation * ATTENUATION_WEIGHT);

        if rms < MIN_RMS_THRESHOLD {
            return DistanceEstimate::NoSignal;
        }

        DistanceEstimate::Range(distance.clamp(MIN_DISTANCE_M, MAX_DISTANCE_M))
    }

    /// Run all four computations on one frame, with the length contract
    /// checked up front.
    pub fn analyze_frame(
        &self,
        frame: &[f32],
        spectrum_db: &[f32],
        calibration: &Calibration,
    ) -> Result<FrameAnalysis> {
        if frame.len() != self.fft_size {
            return Err(RangerError::FrameLength {
                expected: self.fft_size,
                actual: frame.len(),
            });
        }
        if spectrum_db.len() != self.fft_size / 2 {
            return Err(RangerError::SpectrumLength {
                expected: self.fft_size / 2,
                actual: spectrum_db.len(),
            });
        }

        let rms = self.compute_rms(frame);
        let dominant_freq_hz = self.dominant_frequency(spectrum_db);
        let attenuation = self.high_frequency_attenuation(spectrum_db);
        let estimate = self.estimate_distance(rms, dominant_freq_hz, spectrum_db, calibration);

        Ok(FrameAnalysis {
            rms,
            level_db: linear_to_db(rms),
            dominant_freq_hz,
            attenuation,
            estimate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE_RATE: u32 = 48000;
    const FFT_SIZE: usize = 2048;

    fn estimator() -> DistanceEstimator {
        DistanceEstimator::new(SAMPLE_RATE, FFT_SIZE)
    }

    fn flat_spectrum(db: f32) -> Vec<f32> {
        vec![db; FFT_SIZE / 2]
    }

    fn bin_of(freq_hz: f32) -> usize {
        (freq_hz / (SAMPLE_RATE as f32 / FFT_SIZE as f32)) as usize
    }

    /// Spectrum with the given dB in the low band and high band, deep
    /// silence elsewhere.
    fn two_band_spectrum(low_db: f32, high_db: f32) -> Vec<f32> {
        let mut spectrum = flat_spectrum(-100.0);
        for bin in spectrum[bin_of(100.0)..bin_of(1000.0)].iter_mut() {
            *bin = low_db;
        }
        for bin in spectrum[bin_of(2000.0)..bin_of(8000.0)].iter_mut() {
            *bin = high_db;
        }
        spectrum
    }

    #[test]
    fn test_silent_frame_has_zero_rms_and_no_signal() {
        let est = estimator();
        let frame = vec![0.0; FFT_SIZE];

        assert_eq!(est.compute_rms(&frame), 0.0);

        let result = est.estimate_distance(0.0, 0.0, &flat_spectrum(-100.0), &Calibration::default());
        assert!(result.is_no_signal());
    }

    #[test]
    fn test_rms_of_constant_frame() {
        let est = estimator();
        let frame = vec![0.5; FFT_SIZE];
        assert_relative_eq!(est.compute_rms(&frame), 0.5, max_relative = 1e-6);
    }

    #[test]
    fn test_rms_threshold_boundary() {
        let est = estimator();
        let spectrum = flat_spectrum(-60.0);
        let cal = Calibration::default();

        // Exactly at the floor still counts as signal
        let at_floor = est.estimate_distance(0.001, 0.0, &spectrum, &cal);
        assert!(!at_floor.is_no_signal());

        let below_floor = est.estimate_distance(0.000_999, 0.0, &spectrum, &cal);
        assert!(below_floor.is_no_signal());
    }

    #[test]
    fn test_distance_clamped_to_bounds() {
        let est = estimator();
        let spectrum = flat_spectrum(-60.0);

        // Quiet frame against a loud reference: estimate blows past 50 m
        let far = est.estimate_distance(0.01, 0.0, &spectrum, &Calibration::default());
        assert_eq!(far.meters(), Some(50.0));

        // Very hot frame against a soft reference: clamps to 0.1 m
        let cal = Calibration::new(1.0, 1.0).unwrap();
        let near = est.estimate_distance(20.0, 0.0, &spectrum, &cal);
        assert_eq!(near.meters(), Some(0.1));
    }

    #[test]
    fn test_dominant_frequency_single_spike() {
        let est = estimator();
        let bin_width = SAMPLE_RATE as f32 / FFT_SIZE as f32;

        let mut spectrum = flat_spectrum(-90.0);
        let spike_bin = bin_of(440.0);
        spectrum[spike_bin] = -10.0;

        let freq = est.dominant_frequency(&spectrum);
        assert!(
            (freq - 440.0).abs() <= bin_width,
            "Expected ~440 Hz, got {freq}"
        );
    }

    #[test]
    fn test_dominant_frequency_ignores_out_of_band_spikes() {
        let est = estimator();

        let mut spectrum = flat_spectrum(-90.0);
        spectrum[bin_of(50.0)] = 0.0; // below the band
        spectrum[bin_of(12000.0)] = 0.0; // above the band
        spectrum[bin_of(500.0)] = -30.0;

        let freq = est.dominant_frequency(&spectrum);
        let bin_width = SAMPLE_RATE as f32 / FFT_SIZE as f32;
        assert!(
            (freq - 500.0).abs() <= bin_width,
            "Expected ~500 Hz, got {freq}"
        );
    }

    #[test]
    fn test_dominant_frequency_tie_takes_lowest_bin() {
        let est = estimator();

        let mut spectrum = flat_spectrum(-90.0);
        spectrum[bin_of(300.0)] = -10.0;
        spectrum[bin_of(600.0)] = -10.0;

        let freq = est.dominant_frequency(&spectrum);
        let bin_width = SAMPLE_RATE as f32 / FFT_SIZE as f32;
        assert!(
            (freq - 300.0).abs() <= bin_width,
            "Tie should resolve to the lower bin, got {freq}"
        );
    }

    #[test]
    fn test_attenuation_zero_for_balanced_bands() {
        let est = estimator();
        // Equal mean energy in both bands: ratio 1, factor 0
        let spectrum = two_band_spectrum(-40.0, -40.0);
        assert_relative_eq!(
            est.high_frequency_attenuation(&spectrum),
            0.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_attenuation_saturates_at_ratio_eleven() {
        let est = estimator();
        // 10·log10(11) ≈ 10.414 dB gap puts the power ratio at exactly 11
        let spectrum = two_band_spectrum(-40.0 + 10.414, -40.0);
        assert_relative_eq!(
            est.high_frequency_attenuation(&spectrum),
            1.0,
            epsilon = 1e-2
        );

        // Well past saturation stays pinned at 1
        let spectrum = two_band_spectrum(-20.0, -40.0);
        assert_eq!(est.high_frequency_attenuation(&spectrum), 1.0);
    }

    #[test]
    fn test_attenuation_midpoint() {
        let est = estimator();
        // Power ratio 6: (6 - 1) / 10 = 0.5
        let gap_db = 10.0 * 6.0_f32.log10();
        let spectrum = two_band_spectrum(-40.0 + gap_db, -40.0);
        assert_relative_eq!(
            est.high_frequency_attenuation(&spectrum),
            0.5,
            epsilon = 1e-2
        );
    }

    #[test]
    fn test_inverse_square_reference_case() {
        let est = estimator();
        // Level 20 dB under the 90 dB reference at 1 m: expect 10 m.
        // Balanced bands keep the attenuation blend at exactly 1.0.
        let rms = 10.0_f32.powf(3.5);
        let spectrum = two_band_spectrum(-40.0, -40.0);
        let cal = Calibration::new(90.0, 1.0).unwrap();

        let result = est.estimate_distance(rms, 0.0, &spectrum, &cal);
        assert_relative_eq!(result.meters().unwrap(), 10.0, max_relative = 1e-3);
    }

    #[test]
    fn test_estimator_is_pure() {
        let est = estimator();
        let frame: Vec<f32> = (0..FFT_SIZE)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        let spectrum = two_band_spectrum(-30.0, -50.0);
        let cal = Calibration::default();

        let first = est.analyze_frame(&frame, &spectrum, &cal).unwrap();
        let second = est.analyze_frame(&frame, &spectrum, &cal).unwrap();

        assert_eq!(first.estimate, second.estimate);
        assert_eq!(first.rms, second.rms);
        assert_eq!(first.dominant_freq_hz, second.dominant_freq_hz);
        assert_eq!(first.attenuation, second.attenuation);
    }

    #[test]
    fn test_analyze_frame_rejects_length_mismatch() {
        let est = estimator();
        let cal = Calibration::default();

        let short_frame = vec![0.0; FFT_SIZE - 1];
        let spectrum = flat_spectrum(-60.0);
        assert!(matches!(
            est.analyze_frame(&short_frame, &spectrum, &cal),
            Err(RangerError::FrameLength { .. })
        ));

        let frame = vec![0.0; FFT_SIZE];
        let short_spectrum = vec![-60.0; FFT_SIZE / 2 - 1];
        assert!(matches!(
            est.analyze_frame(&frame, &short_spectrum, &cal),
            Err(RangerError::SpectrumLength { .. })
        ));
    }

    #[test]
    fn test_attenuation_widens_distance() {
        let est = estimator();
        let cal = Calibration::default();
        let rms = 10.0_f32.powf(3.5);

        let balanced = est
            .estimate_distance(rms, 0.0, &two_band_spectrum(-40.0, -40.0), &cal)
            .meters()
            .unwrap();
        let muffled = est
            .estimate_distance(rms, 0.0, &two_band_spectrum(-20.0, -40.0), &cal)
            .meters()
            .unwrap();

        // Saturated attenuation scales the estimate by 1.3
        assert_relative_eq!(muffled, balanced * 1.3, max_relative = 1e-3);
    }
}
