//! Magnitude-in-dB spectra from time-domain frames.
//!
//! Stands in for the analyser stage of the capture platform: Hann window,
//! forward FFT, magnitude normalization, exponential smoothing across
//! frames, then conversion to decibels. The estimator consumes the dB
//! spectrum directly; the visualizers draw it as-is.

use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

use crate::signal_processing::math::linear_to_db;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    frame_size: usize,
    /// Hann window, pre-computed
    window: Vec<f32>,
    /// Exponential smoothing factor in [0, 1); 0 disables smoothing
    smoothing: f32,
    /// Smoothed linear magnitudes carried across frames
    smoothed: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create an analyzer for frames of `frame_size` samples.
    ///
    /// `smoothing` damps frame-to-frame magnitude flicker the way the
    /// original analyser's time constant does; each output bin is
    /// `smoothing * previous + (1 - smoothing) * current` before the dB
    /// conversion.
    pub fn new(frame_size: usize, smoothing: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);

        // Hann window to reduce spectral leakage
        let window = (0..frame_size)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (frame_size as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            fft,
            frame_size,
            window,
            smoothing: smoothing.clamp(0.0, 0.999),
            smoothed: vec![0.0; frame_size / 2],
        }
    }

    /// Number of bins in the output spectrum.
    pub fn bins(&self) -> usize {
        self.frame_size / 2
    }

    /// Compute the dB magnitude spectrum of one frame.
    ///
    /// The frame is windowed and transformed; magnitudes are normalized by
    /// the frame size, smoothed against the previous frame, and converted
    /// to dB. Output length is `frame_size / 2` (positive frequencies).
    /// Frames shorter than the FFT size are zero-padded.
    pub fn analyze(&mut self, frame: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = Vec::with_capacity(self.frame_size);

        for (i, &sample) in frame.iter().enumerate() {
            if i < self.frame_size {
                buffer.push(Complex::new(sample * self.window[i], 0.0));
            }
        }
        while buffer.len() < self.frame_size {
            buffer.push(Complex::new(0.0, 0.0));
        }

        self.fft.process(&mut buffer);

        let scale = 1.0 / self.frame_size as f32;
        let tau = self.smoothing;
        let mut spectrum_db = Vec::with_capacity(self.frame_size / 2);

        for (i, c) in buffer[..self.frame_size / 2].iter().enumerate() {
            let magnitude = c.norm() * scale;
            let smoothed = tau * self.smoothed[i] + (1.0 - tau) * magnitude;
            self.smoothed[i] = smoothed;
            spectrum_db.push(linear_to_db(smoothed));
        }

        spectrum_db
    }

    /// Forget smoothing state, e.g. when capture restarts.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;
    const FRAME_SIZE: usize = 1024;

    fn tone_frame(freq_hz: f32, amplitude: f32) -> Vec<f32> {
        (0..FRAME_SIZE)
            .map(|i| {
                amplitude * (2.0 * std::f32::consts::PI * freq_hz * i as f32 / SAMPLE_RATE).sin()
            })
            .collect()
    }

    fn peak_bin(spectrum_db: &[f32]) -> usize {
        let mut max_db = f32::NEG_INFINITY;
        let mut max_index = 0;
        for (i, &db) in spectrum_db.iter().enumerate() {
            if db > max_db {
                max_db = db;
                max_index = i;
            }
        }
        max_index
    }

    #[test]
    fn test_pure_tone_lands_in_its_bin() {
        let bin_width = SAMPLE_RATE / FRAME_SIZE as f32;
        let target_bin = 100;
        let frame = tone_frame(target_bin as f32 * bin_width, 0.8);

        let mut analyzer = SpectrumAnalyzer::new(FRAME_SIZE, 0.0);
        let spectrum = analyzer.analyze(&frame);

        assert_eq!(spectrum.len(), FRAME_SIZE / 2);
        let found = peak_bin(&spectrum);
        assert!(
            (found as i64 - target_bin as i64).abs() <= 1,
            "Peak at bin {found}, expected {target_bin}"
        );
    }

    #[test]
    fn test_silence_is_deep_negative() {
        let mut analyzer = SpectrumAnalyzer::new(FRAME_SIZE, 0.0);
        let spectrum = analyzer.analyze(&vec![0.0; FRAME_SIZE]);
        assert!(spectrum.iter().all(|&db| db < -100.0));
    }

    #[test]
    fn test_smoothing_carries_energy_across_frames() {
        let frame = tone_frame(1000.0, 0.8);
        let silence = vec![0.0; FRAME_SIZE];

        let mut smoothed = SpectrumAnalyzer::new(FRAME_SIZE, 0.8);
        smoothed.analyze(&frame);
        let after_silence = smoothed.analyze(&silence);

        let mut unsmoothed = SpectrumAnalyzer::new(FRAME_SIZE, 0.0);
        unsmoothed.analyze(&frame);
        let after_silence_unsmoothed = unsmoothed.analyze(&silence);

        let bin = (1000.0 / (SAMPLE_RATE / FRAME_SIZE as f32)) as usize;
        assert!(
            after_silence[bin] > after_silence_unsmoothed[bin] + 3.0,
            "Smoothing should hold residual energy: {} vs {}",
            after_silence[bin],
            after_silence_unsmoothed[bin]
        );
    }

    #[test]
    fn test_reset_clears_smoothing_state() {
        let frame = tone_frame(1000.0, 0.8);
        let silence = vec![0.0; FRAME_SIZE];

        let mut analyzer = SpectrumAnalyzer::new(FRAME_SIZE, 0.8);
        analyzer.analyze(&frame);
        analyzer.reset();
        let spectrum = analyzer.analyze(&silence);

        let bin = (1000.0 / (SAMPLE_RATE / FRAME_SIZE as f32)) as usize;
        assert!(
            spectrum[bin] < -80.0,
            "Reset should drop held energy, got {} dB",
            spectrum[bin]
        );
    }

    #[test]
    fn test_short_frame_zero_padded() {
        let mut analyzer = SpectrumAnalyzer::new(FRAME_SIZE, 0.0);
        let spectrum = analyzer.analyze(&tone_frame(1000.0, 0.5)[..FRAME_SIZE / 2]);
        assert_eq!(spectrum.len(), FRAME_SIZE / 2);
    }
}
