use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use earshot::config::Calibration;
use earshot::save_wav;
use earshot::simulation::{NoiseConfig, SourceSpec, apply_noise, generate_source_at_distance};

#[derive(Parser, Debug)]
#[command(name = "generate_wav")]
#[command(about = "Synthesize a calibrated sound source at a known distance", long_about = None)]
struct Args {
    /// Output WAV path
    #[arg(short = 'o', long, default_value = "source.wav")]
    output: PathBuf,

    /// Simulated source distance in meters
    #[arg(short = 'd', long, default_value = "5.0")]
    distance: f32,

    /// Calibration reference, e.g. "90db@1m"
    #[arg(short = 'c', long, default_value = "90db@1m")]
    calibration: Calibration,

    /// Duration in seconds
    #[arg(short = 't', long, default_value = "5.0")]
    duration: f32,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Add white noise at this SNR in dB
    #[arg(long)]
    snr: Option<f32>,

    /// RNG seed for reproducible noise
    #[arg(long)]
    seed: Option<u64>,

    /// TOML scenario file overriding source shape and noise
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct TomlConfig {
    source: Option<SourceSpec>,
    noise: Option<NoiseConfig>,
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn build_noise_config(toml: &TomlConfig, args: &Args) -> NoiseConfig {
    let mut noise = toml.noise.clone().unwrap_or_default();
    if let Some(snr_db) = args.snr {
        noise = noise.with_awgn(snr_db);
    }
    if let Some(seed) = args.seed {
        noise = noise.with_seed(seed);
    }
    noise
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    anyhow::ensure!(args.distance > 0.0, "distance must be positive");
    anyhow::ensure!(args.duration > 0.0, "duration must be positive");

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let source_spec = toml_config.source.clone().unwrap_or_default();
    let noise_config = build_noise_config(&toml_config, &args);

    let num_samples = (args.duration * args.sample_rate as f32) as usize;
    let clean = generate_source_at_distance(
        args.distance,
        &args.calibration,
        &source_spec,
        args.sample_rate,
        num_samples,
    );
    let samples = apply_noise(&clean, &noise_config);

    let path = args
        .output
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid output path"))?;
    save_wav(path, &samples, args.sample_rate)?;

    println!(
        "Wrote {}: {:.1}s of a source at {:.1} m ({} @ {} Hz, components {:.0}/{:.0} Hz)",
        path,
        args.duration,
        args.distance,
        args.calibration,
        args.sample_rate,
        source_spec.low_hz,
        source_spec.high_hz
    );
    if let Some(ref additive) = noise_config.additive {
        println!("Noise: AWGN at {:.1} dB SNR", additive.snr_db);
    }

    Ok(())
}
