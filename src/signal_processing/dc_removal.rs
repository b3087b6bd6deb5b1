/// Stateful DC offset remover using a single-pole IIR high-pass filter.
///
/// Cheap capture hardware often rides the whole signal on a small constant
/// bias, which inflates RMS readings and with them the loudness-based
/// distance estimate. This tracks the bias and subtracts it.
pub struct DcRemover {
    dc_estimate: f32,
    alpha: f32,
}

impl DcRemover {
    /// Create a new DC remover with the given smoothing factor.
    /// Alpha should be small (e.g., 0.0001) for slow adaptation.
    pub fn new(alpha: f32) -> Self {
        Self {
            dc_estimate: 0.0,
            alpha,
        }
    }

    /// Create a DC remover with a specified cutoff frequency.
    /// Frequencies below cutoff_hz will be attenuated.
    pub fn with_cutoff(sample_rate: f32, cutoff_hz: f32) -> Self {
        let alpha = (2.0 * std::f32::consts::PI * cutoff_hz / sample_rate).min(1.0);
        Self::new(alpha)
    }

    /// Process samples in-place, removing DC offset.
    pub fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            self.dc_estimate += self.alpha * (*sample - self.dc_estimate);
            *sample -= self.dc_estimate;
        }
    }
}
