mod test_signals;

use earshot::config::{Calibration, RangerConfig};
use earshot::processing::RangingProcessor;
use earshot::simulation::{NoiseConfig, SourceSpec, apply_noise, generate_source_at_distance};

const SAMPLE_RATE: u32 = 48000;

/// Run a signal through the pipeline and average the raw estimates.
fn estimate_distance_of(signal: &[f32], config: &RangerConfig) -> Option<f32> {
    let mut processor = RangingProcessor::new(config);

    let mut estimates = Vec::new();
    for chunk in signal.chunks(1000) {
        for tick in processor.process_audio(chunk) {
            if let Some(m) = tick.measurement {
                estimates.push(m.raw_distance_m);
            }
        }
    }

    if estimates.is_empty() {
        None
    } else {
        Some(estimates.iter().sum::<f32>() / estimates.len() as f32)
    }
}

fn test_calibration() -> Calibration {
    Calibration::new(80.0, 1.0).unwrap()
}

#[test]
fn test_recovers_source_distance_within_attenuation_margin() {
    let config = test_signals::ranging_config(2048);
    let cal = test_calibration();
    let spec = SourceSpec::default();

    for distance in [2.0, 5.0, 10.0, 20.0] {
        let mut config = config.clone();
        config.calibration = cal;

        let signal =
            generate_source_at_distance(distance, &cal, &spec, SAMPLE_RATE, SAMPLE_RATE as usize / 2);
        let estimate = estimate_distance_of(&signal, &config)
            .unwrap_or_else(|| panic!("No estimate for {distance} m source"));

        // The intensity term inverts the inverse-square law exactly; the
        // attenuation blend can widen it by up to 30%.
        assert!(
            estimate >= distance * 0.9 && estimate <= distance * 1.3 * 1.1,
            "Source at {distance} m estimated at {estimate:.2} m"
        );
    }
}

#[test]
fn test_estimates_grow_with_distance() {
    let config = test_signals::ranging_config(2048);
    let cal = test_calibration();
    let spec = SourceSpec::default();

    let mut previous = 0.0;
    for distance in [1.0, 3.0, 9.0, 27.0] {
        let mut config = config.clone();
        config.calibration = cal;

        let signal =
            generate_source_at_distance(distance, &cal, &spec, SAMPLE_RATE, SAMPLE_RATE as usize / 2);
        let estimate = estimate_distance_of(&signal, &config).expect("expected an estimate");

        assert!(
            estimate > previous,
            "Estimate {estimate:.2} m at {distance} m not beyond previous {previous:.2} m"
        );
        previous = estimate;
    }
}

#[test]
fn test_noise_does_not_break_ranging() {
    let config = test_signals::ranging_config(2048);
    let cal = test_calibration();
    let spec = SourceSpec::default();
    let distance = 5.0;

    let clean =
        generate_source_at_distance(distance, &cal, &spec, SAMPLE_RATE, SAMPLE_RATE as usize / 2);
    let noisy = apply_noise(&clean, &NoiseConfig::default().with_seed(42).with_awgn(20.0));

    let mut config = config.clone();
    config.calibration = cal;
    let estimate = estimate_distance_of(&noisy, &config).expect("expected an estimate");

    assert!(
        estimate >= distance * 0.8 && estimate <= distance * 1.3 * 1.2,
        "Noisy source at {distance} m estimated at {estimate:.2} m"
    );
}

#[test]
fn test_silence_yields_no_estimate() {
    let config = test_signals::ranging_config(2048);
    let silence = vec![0.0; SAMPLE_RATE as usize / 4];
    assert_eq!(estimate_distance_of(&silence, &config), None);
}

#[test]
fn test_estimates_stay_clamped() {
    // A whisper against a thunderous reference pins at the far clamp
    let mut config = test_signals::ranging_config(2048);
    config.calibration = Calibration::new(120.0, 1.0).unwrap();

    let signal = test_signals::tone(440.0, 0.01, SAMPLE_RATE, SAMPLE_RATE as usize / 4);
    let estimate = estimate_distance_of(&signal, &config).expect("expected an estimate");
    assert!((estimate - 50.0).abs() < 1e-3);
}
