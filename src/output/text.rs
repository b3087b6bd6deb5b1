use super::{Formatter, RangeOutput};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &RangeOutput) -> String {
        let distance = output
            .distance_m
            .map_or("  --  ".to_string(), |d| format!("{:>5.2}m", d));

        if self.verbose {
            let raw = output
                .raw_distance_m
                .map_or("-".to_string(), |d| format!("{:.2}", d));
            format!(
                "Distance: {} (raw: {}) {} [level: {:>6.1} dBFS, dominant: {:>6.0} Hz, atten: {:.2}]",
                distance,
                raw,
                output.quality(),
                output.level_db,
                output.dominant_freq_hz,
                output.attenuation
            )
        } else {
            format!("Distance: {} ({})", distance, output.quality())
        }
    }
}
