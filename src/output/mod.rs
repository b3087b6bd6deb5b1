mod csv;
mod json;
mod text;

use chrono::Utc;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// One line of ranging output. `distance` and `raw` are None for
/// no-signal frames; the level still gets reported.
pub struct RangeOutput {
    pub distance_m: Option<f32>,
    pub raw_distance_m: Option<f32>,
    pub level_db: f32,
    pub dominant_freq_hz: f32,
    pub attenuation: f32,
}

impl RangeOutput {
    /// Proximity band label matching the display UI's buckets.
    pub fn quality(&self) -> &'static str {
        match self.distance_m {
            None => "No Signal",
            Some(d) if d < 1.0 => "Very Close",
            Some(d) if d < 3.0 => "Close",
            Some(d) if d < 10.0 => "Medium Range",
            Some(_) => "Far",
        }
    }
}

pub trait Formatter: Send {
    fn format(&self, output: &RangeOutput) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
