//! Configuration for the earshot acoustic ranging system.
//!
//! All processing parameters live in [`RangerConfig`]; use
//! `RangerConfig::default()` for the stock setup (48 kHz mono capture,
//! 2048-sample frames). The calibration pair is a small value object,
//! constructed validated and passed into each estimator call.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{RangerError, Result};

/// Calibration reference: the sound level expected at a known distance.
///
/// Both values must be positive; construction rejects anything else so the
/// inverse-square formula never sees a zero or negative reference distance.
///
/// # Parsing formats
/// - `90@1` - level in dB SPL, distance in meters
/// - `90db@1m` or `90dB@1m` - explicit suffixes
///
/// # Example
/// ```
/// use earshot::config::Calibration;
///
/// let cal: Calibration = "85db@2m".parse().unwrap();
/// assert!((cal.reference_level_db() - 85.0).abs() < 0.001);
/// assert!((cal.reference_distance_m() - 2.0).abs() < 0.001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    reference_level_db: f32,
    reference_distance_m: f32,
}

impl Calibration {
    /// Create a calibration pair, rejecting non-positive or non-finite values.
    pub fn new(reference_level_db: f32, reference_distance_m: f32) -> Result<Self> {
        if !reference_level_db.is_finite() || reference_level_db <= 0.0 {
            return Err(RangerError::Calibration(format!(
                "reference level must be positive, got {reference_level_db}"
            )));
        }
        if !reference_distance_m.is_finite() || reference_distance_m <= 0.0 {
            return Err(RangerError::Calibration(format!(
                "reference distance must be positive, got {reference_distance_m}"
            )));
        }
        Ok(Self {
            reference_level_db,
            reference_distance_m,
        })
    }

    /// Sound level in dB SPL expected at the reference distance.
    pub fn reference_level_db(&self) -> f32 {
        self.reference_level_db
    }

    /// Reference distance in meters.
    pub fn reference_distance_m(&self) -> f32 {
        self.reference_distance_m
    }
}

impl Default for Calibration {
    fn default() -> Self {
        // 90 dB SPL at 1 m: a loud speaking voice at arm's length.
        Self {
            reference_level_db: 90.0,
            reference_distance_m: 1.0,
        }
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}db@{:.2}m",
            self.reference_level_db, self.reference_distance_m
        )
    }
}

impl FromStr for Calibration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (level_part, distance_part) = s
            .split_once('@')
            .ok_or_else(|| format!("expected <level>@<distance>, got: {s}"))?;

        let level_num = level_part
            .trim()
            .strip_suffix("db")
            .or_else(|| level_part.trim().strip_suffix("dB"))
            .or_else(|| level_part.trim().strip_suffix("DB"))
            .unwrap_or(level_part.trim());
        let level: f32 = level_num
            .trim()
            .parse()
            .map_err(|_| format!("invalid level: {level_part}"))?;

        let distance_num = distance_part
            .trim()
            .strip_suffix('m')
            .unwrap_or(distance_part.trim());
        let distance: f32 = distance_num
            .trim()
            .parse()
            .map_err(|_| format!("invalid distance: {distance_part}"))?;

        Calibration::new(level, distance).map_err(|e| e.to_string())
    }
}

/// Calibration pair shared between a UI thread and the processing thread.
///
/// One logical writer (the calibration control) and one reader (the
/// estimator tick); each scalar is stored as an f32 bit pattern in an
/// atomic, so updates take effect on the next tick without locking.
pub struct SharedCalibration {
    level_bits: AtomicU32,
    distance_bits: AtomicU32,
}

impl SharedCalibration {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            level_bits: AtomicU32::new(calibration.reference_level_db.to_bits()),
            distance_bits: AtomicU32::new(calibration.reference_distance_m.to_bits()),
        }
    }

    pub fn store(&self, calibration: Calibration) {
        self.level_bits
            .store(calibration.reference_level_db.to_bits(), Ordering::Relaxed);
        self.distance_bits.store(
            calibration.reference_distance_m.to_bits(),
            Ordering::Relaxed,
        );
    }

    pub fn load(&self) -> Calibration {
        // Values only enter through a validated Calibration, so the bits
        // round-trip without re-checking.
        Calibration {
            reference_level_db: f32::from_bits(self.level_bits.load(Ordering::Relaxed)),
            reference_distance_m: f32::from_bits(self.distance_bits.load(Ordering::Relaxed)),
        }
    }
}

/// System-wide ranging configuration
///
/// # Example
/// ```
/// use earshot::config::RangerConfig;
///
/// let mut config = RangerConfig::default();
/// config.ranging.output_rate_hz = 20.0;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RangerConfig {
    /// Audio input configuration
    pub audio: AudioConfig,
    /// Spectrum analysis configuration
    pub spectrum: SpectrumConfig,
    /// Distance estimation and output configuration
    pub ranging: RangingConfig,
    /// Initial calibration reference
    pub calibration: Calibration,
}

/// Audio input configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Audio sample rate in Hz (typically 48000)
    pub sample_rate: u32,
    /// Analysis frame size in samples; also the FFT size. Must be a
    /// power of two for the FFT to line up with the bin math.
    pub frame_size: usize,
    /// Number of input channels requested from the device (mono capture)
    pub channels: u16,
}

impl AudioConfig {
    /// Number of spectrum bins produced per frame.
    pub fn spectrum_bins(&self) -> usize {
        self.frame_size / 2
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate as f32 / self.frame_size as f32
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            frame_size: 2048,
            channels: 1,
        }
    }
}

/// Spectrum analysis configuration
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    /// Exponential smoothing factor for spectrum magnitudes across frames,
    /// in [0, 1). 0 disables smoothing; 0.8 matches the usual analyser
    /// behavior of damping frame-to-frame flicker.
    pub smoothing_time_constant: f32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            smoothing_time_constant: 0.8,
        }
    }
}

/// Distance estimation and output configuration
#[derive(Debug, Clone)]
pub struct RangingConfig {
    /// Moving average window for the displayed distance (raw value is
    /// always reported alongside)
    pub smoothing_window: usize,
    /// Measurement output rate in Hz
    pub output_rate_hz: f32,
    /// Remove DC offset from captured audio before estimation
    pub remove_dc: bool,
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 5,
            output_rate_hz: 10.0,
            remove_dc: false,
        }
    }
}
