use crate::audio::FrameAssembler;
use crate::config::{Calibration, RangerConfig};
use crate::ranging::{DistanceEstimator, RangeMeasurement};
use crate::signal_processing::{DcRemover, MovingAverage, SpectrumAnalyzer};

/// Output of one analysis frame.
pub struct TickResult {
    /// Distance measurement; None when the frame was below the signal floor
    pub measurement: Option<RangeMeasurement>,
    /// Frame level in dBFS, reported even for no-signal frames
    pub level_db: f32,
}

/// Full ranging pipeline: chunked capture samples in, one distance
/// measurement per complete analysis frame out.
///
/// The last processed frame and spectrum are kept for visualization;
/// they pass through unmodified.
pub struct RangingProcessor {
    assembler: FrameAssembler,
    analyzer: SpectrumAnalyzer,
    estimator: DistanceEstimator,
    dc_remover: DcRemover,
    smoother: MovingAverage,
    calibration: Calibration,
    remove_dc: bool,
    sample_counter: usize,
    last_frame: Vec<f32>,
    last_spectrum_db: Vec<f32>,
}

impl RangingProcessor {
    pub fn new(config: &RangerConfig) -> Self {
        let frame_size = config.audio.frame_size;
        let sample_rate = config.audio.sample_rate;

        Self {
            assembler: FrameAssembler::new(frame_size),
            analyzer: SpectrumAnalyzer::new(frame_size, config.spectrum.smoothing_time_constant),
            estimator: DistanceEstimator::new(sample_rate, frame_size),
            dc_remover: DcRemover::with_cutoff(sample_rate as f32, 1.0),
            smoother: MovingAverage::new(config.ranging.smoothing_window),
            calibration: config.calibration,
            remove_dc: config.ranging.remove_dc,
            sample_counter: 0,
            last_frame: Vec::new(),
            last_spectrum_db: Vec::new(),
        }
    }

    /// Feed captured samples; returns one result per analysis frame that
    /// completed within them.
    pub fn process_audio(&mut self, samples: &[f32]) -> Vec<TickResult> {
        self.assembler.push(samples);

        let mut results = Vec::new();
        while let Some(mut frame) = self.assembler.next_frame() {
            if self.remove_dc {
                self.dc_remover.process(&mut frame);
            }

            let spectrum_db = self.analyzer.analyze(&frame);
            self.sample_counter += frame.len();

            let analysis =
                match self
                    .estimator
                    .analyze_frame(&frame, &spectrum_db, &self.calibration)
                {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        log::error!("Frame analysis failed: {}", e);
                        continue;
                    }
                };

            let measurement = analysis.estimate.meters().map(|raw| RangeMeasurement {
                distance_m: self.smoother.add(raw),
                raw_distance_m: raw,
                level_db: analysis.level_db,
                dominant_freq_hz: analysis.dominant_freq_hz,
                attenuation: analysis.attenuation,
                timestamp_samples: self.sample_counter,
            });

            results.push(TickResult {
                measurement,
                level_db: analysis.level_db,
            });

            self.last_frame = frame;
            self.last_spectrum_db = spectrum_db;
        }

        results
    }

    /// Replace the calibration reference; takes effect on the next frame.
    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Most recent analysis frame, unmodified, for waveform display.
    pub fn last_frame(&self) -> &[f32] {
        &self.last_frame
    }

    /// Most recent dB spectrum, unmodified, for spectrum display.
    pub fn last_spectrum_db(&self) -> &[f32] {
        &self.last_spectrum_db
    }

    /// Drop buffered samples and smoothing state, e.g. on capture restart.
    pub fn reset(&mut self) {
        self.assembler.clear();
        self.analyzer.reset();
        self.smoother.reset();
        self.sample_counter = 0;
    }
}
