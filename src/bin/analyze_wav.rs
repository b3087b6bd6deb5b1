use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::PathBuf;

use earshot::audio::{AudioSource, WavFileSource};
use earshot::config::{Calibration, RangerConfig};
use earshot::processing::RangingProcessor;

#[derive(Parser, Debug)]
#[command(name = "analyze_wav")]
#[command(about = "Analyze WAV files for acoustic ranging statistics", long_about = None)]
struct Args {
    /// WAV files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Calibration reference, e.g. "90db@1m"
    #[arg(short = 'c', long, default_value = "90db@1m")]
    calibration: Calibration,

    /// Analysis frame size in samples (power of two)
    #[arg(long, default_value = "2048")]
    frame_size: usize,

    /// Spectrum smoothing time constant (offline default: none)
    #[arg(long, default_value = "0")]
    smoothing: f32,

    /// Remove DC offset from audio
    #[arg(long)]
    remove_dc: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f32,
    std_dev: f32,
    min: f32,
    max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct FileAnalysis {
    filename: String,
    sample_rate: u32,
    frames: usize,
    no_signal_frames: usize,
    distance_m: Option<StatsSummary>,
    level_db: Option<StatsSummary>,
    dominant_freq_hz: Option<StatsSummary>,
    attenuation: Option<StatsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileAnalysis {
    fn failed(filename: String, error: String) -> Self {
        Self {
            filename,
            sample_rate: 0,
            frames: 0,
            no_signal_frames: 0,
            distance_m: None,
            level_db: None,
            dominant_freq_hz: None,
            attenuation: None,
            error: Some(error),
        }
    }
}

fn analyze_file(path: &PathBuf, args: &Args) -> FileAnalysis {
    let filename = path.display().to_string();

    let mut source = match WavFileSource::new(path, args.frame_size) {
        Ok(source) => source,
        Err(e) => return FileAnalysis::failed(filename, e.to_string()),
    };

    let mut config = RangerConfig::default();
    config.audio.sample_rate = source.sample_rate();
    config.audio.frame_size = args.frame_size;
    config.spectrum.smoothing_time_constant = args.smoothing;
    config.ranging.remove_dc = args.remove_dc;
    config.calibration = args.calibration;

    let mut processor = RangingProcessor::new(&config);

    let mut distance_stats: Stats<f32> = Stats::new();
    let mut level_stats: Stats<f32> = Stats::new();
    let mut freq_stats: Stats<f32> = Stats::new();
    let mut attenuation_stats: Stats<f32> = Stats::new();
    let mut frames = 0;
    let mut no_signal_frames = 0;

    loop {
        let chunk = match source.next_buffer() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => return FileAnalysis::failed(filename, e.to_string()),
        };

        for tick in processor.process_audio(&chunk) {
            frames += 1;
            level_stats.update(tick.level_db);
            match tick.measurement {
                Some(m) => {
                    distance_stats.update(m.raw_distance_m);
                    freq_stats.update(m.dominant_freq_hz);
                    attenuation_stats.update(m.attenuation);
                }
                None => no_signal_frames += 1,
            }
        }
    }

    FileAnalysis {
        filename,
        sample_rate: config.audio.sample_rate,
        frames,
        no_signal_frames,
        distance_m: StatsSummary::from_stats(&distance_stats),
        level_db: StatsSummary::from_stats(&level_stats),
        dominant_freq_hz: StatsSummary::from_stats(&freq_stats),
        attenuation: StatsSummary::from_stats(&attenuation_stats),
        error: None,
    }
}

fn print_text(analysis: &FileAnalysis) {
    println!("{}", analysis.filename);
    if let Some(ref error) = analysis.error {
        println!("  error: {}", error);
        return;
    }
    println!(
        "  {} frames at {} Hz ({} below signal floor)",
        analysis.frames, analysis.sample_rate, analysis.no_signal_frames
    );
    if let Some(ref d) = analysis.distance_m {
        println!(
            "  distance: {:.2} m (sd {:.2}, range {:.2}-{:.2})",
            d.mean, d.std_dev, d.min, d.max
        );
    } else {
        println!("  distance: no signal");
    }
    if let Some(ref l) = analysis.level_db {
        println!("  level: {:.1} dBFS (sd {:.1})", l.mean, l.std_dev);
    }
    if let Some(ref f) = analysis.dominant_freq_hz {
        println!("  dominant: {:.0} Hz (sd {:.0})", f.mean, f.std_dev);
    }
    if let Some(ref a) = analysis.attenuation {
        println!("  attenuation: {:.2} (sd {:.2})", a.mean, a.std_dev);
    }
}

fn print_csv(analyses: &[FileAnalysis]) {
    println!("filename,frames,no_signal_frames,distance_mean_m,distance_sd_m,level_mean_db,dominant_mean_hz,attenuation_mean");
    for a in analyses {
        let distance = a
            .distance_m
            .as_ref()
            .map_or((String::new(), String::new()), |d| {
                (format!("{:.2}", d.mean), format!("{:.2}", d.std_dev))
            });
        println!(
            "{},{},{},{},{},{},{},{}",
            a.filename,
            a.frames,
            a.no_signal_frames,
            distance.0,
            distance.1,
            a.level_db
                .as_ref()
                .map_or(String::new(), |l| format!("{:.1}", l.mean)),
            a.dominant_freq_hz
                .as_ref()
                .map_or(String::new(), |f| format!("{:.0}", f.mean)),
            a.attenuation
                .as_ref()
                .map_or(String::new(), |x| format!("{:.2}", x.mean)),
        );
    }
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

    anyhow::ensure!(
        args.frame_size.is_power_of_two(),
        "frame size must be a power of two, got {}",
        args.frame_size
    );

    let analyses: Vec<FileAnalysis> = args.files.iter().map(|f| analyze_file(f, &args)).collect();

    match args.format {
        OutputFormat::Text => {
            for analysis in &analyses {
                print_text(analysis);
                println!();
            }
        }
        OutputFormat::Csv => print_csv(&analyses),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analyses)?),
    }

    let failed = analyses.iter().filter(|a| a.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed to analyze");
    }

    Ok(())
}
