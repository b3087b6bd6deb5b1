use thiserror::Error;

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum RangerError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Invalid calibration: {0}")]
    Calibration(String),

    #[error("Frame length mismatch: expected {expected} samples, got {actual}")]
    FrameLength { expected: usize, actual: usize },

    #[error("Spectrum length mismatch: expected {expected} bins, got {actual}")]
    SpectrumLength { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RangerError>;
