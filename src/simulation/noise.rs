use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Noise applied to synthetic test signals.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f32) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub snr_db: f32,
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

pub fn signal_power(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|&x| x * x).sum::<f32>() / signal.len() as f32
}

fn apply_additive_noise(signal: &mut [f32], config: &AdditiveNoiseConfig, rng: &mut ChaCha8Rng) {
    let sig_power = signal_power(signal);
    if sig_power == 0.0 {
        return;
    }

    let snr_linear = 10.0_f32.powf(config.snr_db / 10.0);
    let noise_power = sig_power / snr_linear;
    let noise_std = noise_power.sqrt();

    let normal = Normal::new(0.0, noise_std as f64).unwrap();

    for sample in signal.iter_mut() {
        *sample += normal.sample(rng) as f32;
    }
}

/// Apply the configured noise to a copy of `signal`.
pub fn apply_noise(signal: &[f32], config: &NoiseConfig) -> Vec<f32> {
    let mut rng = create_rng(config.seed);
    let mut noisy = signal.to_vec();

    if let Some(ref additive) = config.additive {
        apply_additive_noise(&mut noisy, additive, &mut rng);
    }

    noisy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::generate_tone;

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let signal = generate_tone(440.0, 0.5, 48000, 4800);
        let config = NoiseConfig::default().with_seed(42).with_awgn(10.0);

        let a = apply_noise(&signal, &config);
        let b = apply_noise(&signal, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_awgn_hits_requested_snr() {
        let signal = generate_tone(440.0, 0.5, 48000, 48000);
        let config = NoiseConfig::default().with_seed(7).with_awgn(10.0);

        let noisy = apply_noise(&signal, &config);
        let noise: Vec<f32> = noisy
            .iter()
            .zip(signal.iter())
            .map(|(n, s)| n - s)
            .collect();

        let snr = signal_power(&signal) / signal_power(&noise);
        let snr_db = 10.0 * snr.log10();
        assert!(
            (snr_db - 10.0).abs() < 1.0,
            "Measured SNR {snr_db:.1} dB, requested 10 dB"
        );
    }

    #[test]
    fn test_empty_config_is_identity() {
        let signal = generate_tone(440.0, 0.5, 48000, 480);
        let noisy = apply_noise(&signal, &NoiseConfig::default());
        assert_eq!(noisy, signal);
    }
}
