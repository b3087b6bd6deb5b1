use super::{Formatter, RangeOutput, iso8601_timestamp};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &RangeOutput) -> String {
        let distance = output
            .distance_m
            .map_or(String::new(), |d| format!("{:.2}", d));
        let raw = output
            .raw_distance_m
            .map_or(String::new(), |d| format!("{:.2}", d));
        format!(
            "{},{},{},{:.1},{:.0},{:.2}",
            iso8601_timestamp(),
            distance,
            raw,
            output.level_db,
            output.dominant_freq_hz,
            output.attenuation
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,distance_m,raw_m,level_db,dominant_hz,attenuation")
    }
}
