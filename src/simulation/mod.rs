mod noise;
mod signal;

pub use noise::{AdditiveNoiseConfig, NoiseConfig, apply_noise, signal_power};
pub use signal::{SourceSpec, generate_harmonic_tone, generate_source_at_distance, generate_tone};
