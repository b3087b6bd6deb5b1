use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};

use earshot::audio::{AudioSource, DeviceSource, WavFileSource};
use earshot::config::{Calibration, RangerConfig, SharedCalibration};
use earshot::processing::RangingProcessor;

#[derive(Parser, Debug)]
#[command(name = "earshot_gui")]
#[command(about = "Passive acoustic ranging - GUI", long_about = None)]
struct Args {
    /// Calibration reference, e.g. "90db@1m"
    #[arg(short = 'c', long, default_value = "90db@1m")]
    calibration: Calibration,

    /// Analysis frame size in samples (power of two)
    #[arg(long, default_value = "2048")]
    frame_size: usize,

    /// Sample rate in Hz for live capture
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Spectrum smoothing time constant
    #[arg(long, default_value = "0.8")]
    smoothing: f32,

    /// Analyze a WAV file instead of the live microphone
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Input device name substring
    #[arg(long)]
    device: Option<String>,

    /// Remove DC offset from captured audio
    #[arg(long)]
    remove_dc: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct RangeData {
    distance_m: f32,
    raw_distance_m: f32,
    level_db: f32,
    dominant_freq_hz: f32,
    attenuation: f32,
}

enum GuiUpdate {
    Data {
        time_secs: f64,
        range: Option<RangeData>,
        level_db: f32,
        frame: Vec<f32>,
        spectrum_db: Vec<f32>,
    },
    Log(String),
    Stopped,
}

struct GuiLogger {
    tx: Sender<GuiUpdate>,
    max_level: log::LevelFilter,
}

impl log::Log for GuiLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let msg = format!("[{}] {}", record.level(), record.args());
            let _ = self.tx.send(GuiUpdate::Log(msg));
        }
    }

    fn flush(&self) {}
}

fn spawn_processing(
    args: &Args,
    mut config: RangerConfig,
    tx: Sender<GuiUpdate>,
    calibration: Arc<SharedCalibration>,
    stop_requested: Arc<AtomicBool>,
) -> anyhow::Result<(thread::JoinHandle<()>, u32)> {
    let source: Box<dyn AudioSource> = match &args.input {
        Some(path) => {
            let source = WavFileSource::new(path, config.audio.frame_size)?;
            config.audio.sample_rate = source.sample_rate();
            Box::new(source)
        }
        None => Box::new(DeviceSource::new(&config.audio, args.device.as_deref())?),
    };

    let sample_rate = config.audio.sample_rate;
    let handle = thread::spawn(move || {
        if let Err(e) = run_processing(source, config, tx.clone(), calibration, stop_requested) {
            let _ = tx.send(GuiUpdate::Log(format!("Processing error: {}", e)));
        }
        let _ = tx.send(GuiUpdate::Stopped);
    });

    Ok((handle, sample_rate))
}

fn run_processing(
    mut source: Box<dyn AudioSource>,
    config: RangerConfig,
    tx: Sender<GuiUpdate>,
    calibration: Arc<SharedCalibration>,
    stop_requested: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let mut processor = RangingProcessor::new(&config);
    let sample_rate = config.audio.sample_rate;
    let mut sample_count: u64 = 0;

    loop {
        if stop_requested.load(Ordering::Relaxed) {
            break;
        }

        let Some(chunk) = source.next_buffer()? else {
            break;
        };

        // Pick up calibration edits before the next tick
        processor.set_calibration(calibration.load());

        sample_count += chunk.len() as u64;
        let time_secs = sample_count as f64 / sample_rate as f64;

        for tick in processor.process_audio(&chunk) {
            let range = tick.measurement.map(|m| RangeData {
                distance_m: m.distance_m,
                raw_distance_m: m.raw_distance_m,
                level_db: m.level_db,
                dominant_freq_hz: m.dominant_freq_hz,
                attenuation: m.attenuation,
            });

            let update = GuiUpdate::Data {
                time_secs,
                range,
                level_db: tick.level_db,
                frame: processor.last_frame().to_vec(),
                spectrum_db: processor.last_spectrum_db().to_vec(),
            };

            if tx.send(update).is_err() {
                break;
            }
        }
    }

    Ok(())
}

const MAX_HISTORY_SECS: f64 = 60.0;
const MAX_LOG_LINES: usize = 500;

fn quality_label(distance_m: Option<f32>) -> &'static str {
    match distance_m {
        None => "No Signal",
        Some(d) if d < 1.0 => "Very Close",
        Some(d) if d < 3.0 => "Close",
        Some(d) if d < 10.0 => "Medium Range",
        Some(_) => "Far",
    }
}

struct RangerGuiApp {
    rx: Receiver<GuiUpdate>,
    calibration: Arc<SharedCalibration>,
    stop_requested: Arc<AtomicBool>,
    processing_handle: Option<thread::JoinHandle<()>>,

    // Calibration panel state (applied on button press)
    ref_level_db: f32,
    ref_distance_m: f32,

    latest: Option<RangeData>,
    latest_level_db: f32,
    latest_time: f64,
    processing_stopped: bool,

    frame: Vec<f32>,
    spectrum_db: Vec<f32>,
    distance_history: VecDeque<[f64; 2]>,
    raw_history: VecDeque<[f64; 2]>,
    log_lines: VecDeque<String>,

    sample_rate: u32,
    frame_size: usize,
}

impl RangerGuiApp {
    fn new(
        rx: Receiver<GuiUpdate>,
        calibration: Arc<SharedCalibration>,
        stop_requested: Arc<AtomicBool>,
        handle: thread::JoinHandle<()>,
        config: &RangerConfig,
    ) -> Self {
        let initial = calibration.load();
        Self {
            rx,
            calibration,
            stop_requested,
            processing_handle: Some(handle),
            ref_level_db: initial.reference_level_db(),
            ref_distance_m: initial.reference_distance_m(),
            latest: None,
            latest_level_db: -100.0,
            latest_time: 0.0,
            processing_stopped: false,
            frame: Vec::new(),
            spectrum_db: Vec::new(),
            distance_history: VecDeque::new(),
            raw_history: VecDeque::new(),
            log_lines: VecDeque::new(),
            sample_rate: config.audio.sample_rate,
            frame_size: config.audio.frame_size,
        }
    }

    fn drain_updates(&mut self) {
        while let Ok(update) = self.rx.try_recv() {
            match update {
                GuiUpdate::Data {
                    time_secs,
                    range,
                    level_db,
                    frame,
                    spectrum_db,
                } => {
                    self.latest_time = time_secs;
                    self.latest_level_db = level_db;
                    if let Some(ref r) = range {
                        self.distance_history
                            .push_back([time_secs, r.distance_m as f64]);
                        self.raw_history
                            .push_back([time_secs, r.raw_distance_m as f64]);
                    }
                    self.latest = range;
                    self.frame = frame;
                    self.spectrum_db = spectrum_db;

                    let cutoff = time_secs - MAX_HISTORY_SECS;
                    while self
                        .distance_history
                        .front()
                        .is_some_and(|p| p[0] < cutoff)
                    {
                        self.distance_history.pop_front();
                    }
                    while self.raw_history.front().is_some_and(|p| p[0] < cutoff) {
                        self.raw_history.pop_front();
                    }
                }
                GuiUpdate::Log(line) => {
                    self.log_lines.push_back(line);
                    while self.log_lines.len() > MAX_LOG_LINES {
                        self.log_lines.pop_front();
                    }
                }
                GuiUpdate::Stopped => self.processing_stopped = true,
            }
        }
    }

    fn show_distance_readout(&self, ui: &mut egui::Ui) {
        let distance = self.latest.as_ref().map(|r| r.distance_m);
        let text = distance.map_or("--".to_string(), |d| format!("{:.2} m", d));

        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new(text)
                    .size(56.0)
                    .color(egui::Color32::from_rgb(100, 200, 255)),
            );
            ui.label(
                egui::RichText::new(quality_label(distance))
                    .size(18.0)
                    .color(egui::Color32::LIGHT_GRAY),
            );
            if let Some(ref r) = self.latest {
                ui.label(format!(
                    "level {:.1} dBFS · dominant {:.0} Hz · attenuation {:.2}",
                    r.level_db, r.dominant_freq_hz, r.attenuation
                ));
            } else {
                ui.label(format!("level {:.1} dBFS", self.latest_level_db));
            }
        });
    }

    fn show_calibration_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Calibration");
        ui.add_space(4.0);

        ui.label("Reference level (dB SPL)");
        ui.add(egui::Slider::new(&mut self.ref_level_db, 1.0..=120.0).suffix(" dB"));
        ui.label("Reference distance (m)");
        ui.add(egui::Slider::new(&mut self.ref_distance_m, 0.1..=10.0).suffix(" m"));

        ui.add_space(4.0);
        if ui.button("Apply Calibration").clicked() {
            match Calibration::new(self.ref_level_db, self.ref_distance_m) {
                Ok(cal) => {
                    self.calibration.store(cal);
                    log::info!("Calibration updated: {}", cal);
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        ui.add_space(8.0);
        ui.separator();
        ui.label(
            egui::RichText::new(
                "Place a steady source at a known distance, then set the \
                 level it produces there. Works best in quiet rooms.",
            )
            .small()
            .color(egui::Color32::GRAY),
        );
    }

    fn show_waveform(&self, ui: &mut egui::Ui) {
        let points: PlotPoints = self
            .frame
            .iter()
            .enumerate()
            .map(|(i, &s)| [i as f64 / self.sample_rate as f64 * 1000.0, s as f64])
            .collect();

        Plot::new("waveform_plot")
            .height(140.0)
            .include_y(-1.0)
            .include_y(1.0)
            .x_axis_label("ms")
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new("Waveform", points).color(egui::Color32::from_rgb(100, 255, 150)),
                );
            });
    }

    fn show_spectrum(&self, ui: &mut egui::Ui) {
        let bin_width = self.sample_rate as f64 / self.frame_size as f64;
        let points: PlotPoints = self
            .spectrum_db
            .iter()
            .enumerate()
            .map(|(i, &db)| [i as f64 * bin_width, db.max(-120.0) as f64])
            .collect();

        Plot::new("spectrum_plot")
            .height(140.0)
            .include_y(-120.0)
            .include_y(0.0)
            .x_axis_label("Hz")
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new("Spectrum", points).color(egui::Color32::from_rgb(255, 180, 80)),
                );
            });
    }

    fn show_distance_history(&self, ui: &mut egui::Ui) {
        let x_max = self.latest_time.max(10.0);
        let x_min = (x_max - MAX_HISTORY_SECS).max(0.0);

        let smoothed: PlotPoints = self.distance_history.iter().copied().collect();
        let raw: PlotPoints = self.raw_history.iter().copied().collect();

        Plot::new("distance_plot")
            .height(160.0)
            .include_x(x_min)
            .include_x(x_max)
            .include_y(0.0)
            .include_y(10.0)
            .x_axis_label("s")
            .y_axis_label("m")
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new("Distance", smoothed).color(egui::Color32::from_rgb(100, 200, 255)),
                );
                plot_ui.line(
                    Line::new("Raw", raw)
                        .color(egui::Color32::from_rgb(100, 200, 255).gamma_multiply(0.4))
                        .style(egui_plot::LineStyle::Dashed { length: 4.0 }),
                );
            });
    }
}

impl eframe::App for RangerGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();
        self.drain_updates();

        egui::TopBottomPanel::top("readout").show(ctx, |ui| {
            ui.add_space(8.0);
            self.show_distance_readout(ui);
            if self.processing_stopped {
                ui.vertical_centered(|ui| {
                    ui.colored_label(egui::Color32::YELLOW, "Audio stream ended");
                });
            }
            ui.add_space(8.0);
        });

        egui::SidePanel::right("calibration_panel")
            .min_width(220.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                self.show_calibration_panel(ui);
            });

        egui::TopBottomPanel::bottom("log_panel")
            .resizable(true)
            .default_height(80.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.log_lines {
                            ui.label(egui::RichText::new(line).small().monospace());
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(egui::RichText::new("Waveform").small());
            self.show_waveform(ui);
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Spectrum").small());
            self.show_spectrum(ui);
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Distance history").small());
            self.show_distance_history(ui);
        });
    }
}

impl Drop for RangerGuiApp {
    fn drop(&mut self) {
        self.stop_requested.store(true, Ordering::Relaxed);
        if let Some(handle) = self.processing_handle.take() {
            let _ = handle.join();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    anyhow::ensure!(
        args.frame_size.is_power_of_two(),
        "frame size must be a power of two, got {}",
        args.frame_size
    );

    let (tx, rx) = crossbeam_channel::unbounded();

    let log_level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let logger = GuiLogger {
        tx: tx.clone(),
        max_level: log_level,
    };
    log::set_boxed_logger(Box::new(logger)).ok();
    log::set_max_level(log_level);

    let mut config = RangerConfig::default();
    config.audio.sample_rate = args.sample_rate;
    config.audio.frame_size = args.frame_size;
    config.spectrum.smoothing_time_constant = args.smoothing;
    config.ranging.remove_dc = args.remove_dc;
    config.calibration = args.calibration;

    let calibration = Arc::new(SharedCalibration::new(config.calibration));
    let stop_requested = Arc::new(AtomicBool::new(false));

    let (handle, sample_rate) = spawn_processing(
        &args,
        config.clone(),
        tx,
        Arc::clone(&calibration),
        Arc::clone(&stop_requested),
    )?;
    config.audio.sample_rate = sample_rate;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([720.0, 480.0])
            .with_title("Earshot - Passive Acoustic Ranging"),
        ..Default::default()
    };

    eframe::run_native(
        "Earshot",
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(RangerGuiApp::new(
                rx,
                calibration,
                stop_requested,
                handle,
                &config,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}
