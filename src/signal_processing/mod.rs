pub mod dc_removal;
pub mod math;
pub mod spectrum;

pub use dc_removal::DcRemover;
pub use math::{MovingAverage, db_to_power, linear_to_db};
pub use spectrum::SpectrumAnalyzer;
