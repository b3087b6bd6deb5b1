/// Distance measurement result
///
/// One per processed frame, combining the distance estimate with the
/// analysis products that produced it.
#[derive(Debug, Clone, Copy)]
pub struct RangeMeasurement {
    /// Smoothed distance estimate in meters
    pub distance_m: f32,
    /// Raw (unsmoothed) distance estimate in meters
    pub raw_distance_m: f32,
    /// Frame level in dBFS (20·log10 of RMS)
    pub level_db: f32,
    /// Dominant frequency within the 100-8000 Hz search band, in Hz
    pub dominant_freq_hz: f32,
    /// High-frequency attenuation factor (0-1 range)
    pub attenuation: f32,
    /// Sample timestamp
    #[allow(dead_code)]
    pub timestamp_samples: usize,
}
