//! Numeric constants for the ranging pipeline
//!
//! These values are fixed policy rather than configuration: the distance
//! formulas were tuned against them and existing calibration workflows
//! depend on them staying put.

/// Epsilon added before taking log10 of an RMS amplitude, so a silent
/// frame yields a large negative dB value instead of -inf.
pub const DB_EPSILON: f32 = 1e-10;

/// Epsilon for the low/high band energy ratio denominator.
pub const ENERGY_EPSILON: f32 = 1e-10;

/// Minimum RMS amplitude for a frame to count as signal.
/// Anything quieter is reported as no-signal rather than a distance.
pub const MIN_RMS_THRESHOLD: f32 = 0.001;

/// Lower clamp for distance estimates in meters.
pub const MIN_DISTANCE_M: f32 = 0.1;

/// Upper clamp for distance estimates in meters.
pub const MAX_DISTANCE_M: f32 = 50.0;

/// Weight of the high-frequency-attenuation factor in the blended
/// distance estimate: `distance *= 1 + attenuation * ATTENUATION_WEIGHT`.
pub const ATTENUATION_WEIGHT: f32 = 0.3;
