use super::{Formatter, RangeOutput, iso8601_timestamp};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, output: &RangeOutput) -> String {
        let distance = output
            .distance_m
            .map_or("null".to_string(), |d| format!("{:.2}", d));
        let raw = output
            .raw_distance_m
            .map_or("null".to_string(), |d| format!("{:.2}", d));
        format!(
            r#"{{"ts":"{}","distance_m":{},"raw_m":{},"level_db":{:.1},"dominant_hz":{:.0},"attenuation":{:.2},"quality":"{}"}}"#,
            iso8601_timestamp(),
            distance,
            raw,
            output.level_db,
            output.dominant_freq_hz,
            output.attenuation,
            output.quality()
        )
    }
}
