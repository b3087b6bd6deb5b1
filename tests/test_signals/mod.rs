//! Shared signal builders for integration tests.
#![allow(dead_code)]

use earshot::config::RangerConfig;

pub fn tone(freq_hz: f32, amplitude: f32, sample_rate: u32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * freq_hz * t).sin()
        })
        .collect()
}

/// Deterministic pipeline config: spectrum smoothing off so estimates
/// depend only on the current frame.
pub fn ranging_config(frame_size: usize) -> RangerConfig {
    let mut config = RangerConfig::default();
    config.audio.frame_size = frame_size;
    config.spectrum.smoothing_time_constant = 0.0;
    config
}
