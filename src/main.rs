use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;

use earshot::audio::{AudioSource, DeviceSource, WavFileSource, list_input_devices};
use earshot::config::{Calibration, RangerConfig};
use earshot::output::{Formatter, OutputFormat, RangeOutput, create_formatter};
use earshot::processing::RangingProcessor;

#[derive(Parser, Debug)]
#[command(name = "earshot")]
#[command(about = "Passive acoustic ranging from a microphone", long_about = None)]
struct Args {
    /// Calibration reference, e.g. "90db@1m"
    #[arg(short = 'c', long, default_value = "90db@1m")]
    calibration: Calibration,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Analysis frame size in samples (power of two)
    #[arg(long, default_value = "2048")]
    frame_size: usize,

    /// Sample rate in Hz for live capture
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Spectrum smoothing time constant, 0 disables
    #[arg(long, default_value = "0.8")]
    smoothing: f32,

    /// Moving-average window for the displayed distance
    #[arg(long, default_value = "5")]
    smoothing_window: usize,

    /// Measurement output rate in Hz
    #[arg(short = 'r', long, default_value = "10")]
    output_rate: f32,

    /// Remove DC offset from captured audio
    #[arg(long)]
    remove_dc: bool,

    /// Analyze a WAV file instead of the live microphone
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Input device name substring (default: system default device)
    #[arg(long)]
    device: Option<String>,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if args.list_devices {
        for device in list_input_devices()? {
            println!("{}", device);
        }
        return Ok(());
    }

    anyhow::ensure!(
        args.frame_size.is_power_of_two(),
        "frame size must be a power of two, got {}",
        args.frame_size
    );

    let mut config = RangerConfig::default();
    config.audio.sample_rate = args.sample_rate;
    config.audio.frame_size = args.frame_size;
    config.spectrum.smoothing_time_constant = args.smoothing;
    config.ranging.smoothing_window = args.smoothing_window;
    config.ranging.output_rate_hz = args.output_rate;
    config.ranging.remove_dc = args.remove_dc;
    config.calibration = args.calibration;

    let source: Box<dyn AudioSource> = match &args.input {
        Some(path) => {
            let source = WavFileSource::new(path, config.audio.frame_size)?;
            config.audio.sample_rate = source.sample_rate();
            Box::new(source)
        }
        None => Box::new(DeviceSource::new(&config.audio, args.device.as_deref())?),
    };

    println!("=== Earshot - Passive Acoustic Ranging ===");
    println!("Sample rate: {} Hz", config.audio.sample_rate);
    println!(
        "Frame size: {} samples ({:.1} ms)",
        config.audio.frame_size,
        1000.0 * config.audio.frame_size as f32 / config.audio.sample_rate as f32
    );
    println!("Calibration: {}", config.calibration);
    println!("Output rate: {} Hz", config.ranging.output_rate_hz);
    println!();

    let formatter = create_formatter(args.format, args.verbose > 0);

    run_processing_loop(source, config, formatter)
}

fn run_processing_loop(
    mut source: Box<dyn AudioSource>,
    config: RangerConfig,
    formatter: Box<dyn Formatter>,
) -> anyhow::Result<()> {
    let mut processor = RangingProcessor::new(&config);
    let output_interval = Duration::from_secs_f32(1.0 / config.ranging.output_rate_hz);
    let mut last_output = Instant::now();

    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    loop {
        let chunk = match source.next_buffer()? {
            Some(chunk) => chunk,
            None => {
                log::info!("Audio stream ended");
                break;
            }
        };

        for tick in processor.process_audio(&chunk) {
            // Throttle output
            if last_output.elapsed() < output_interval {
                continue;
            }
            last_output = Instant::now();

            let output = match tick.measurement {
                Some(m) => RangeOutput {
                    distance_m: Some(m.distance_m),
                    raw_distance_m: Some(m.raw_distance_m),
                    level_db: m.level_db,
                    dominant_freq_hz: m.dominant_freq_hz,
                    attenuation: m.attenuation,
                },
                None => RangeOutput {
                    distance_m: None,
                    raw_distance_m: None,
                    level_db: tick.level_db,
                    dominant_freq_hz: 0.0,
                    attenuation: 0.0,
                },
            };
            println!("{}", formatter.format(&output));
        }
    }

    Ok(())
}
