pub mod estimator;
pub mod measurement;

pub use estimator::{DistanceEstimate, DistanceEstimator, FrameAnalysis};
pub use measurement::RangeMeasurement;
