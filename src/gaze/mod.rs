mod attention;
mod estimator;
mod processor;
mod pupil;
mod types;

pub use attention::attention_score;
#[cfg(test)]
pub use estimator::MockGazeEstimator;
pub use estimator::GazeEstimator;
pub use processor::GazeProcessor;
pub use pupil::PupilTracker;
pub use types::{FrameFailure, GazeData, GazeReading, GazeResult, PixelCoords};
