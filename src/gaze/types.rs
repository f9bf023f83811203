use super::estimator::GazeEstimator;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Pupil position in frame pixels. Serializes as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelCoords(pub u32, pub u32);

impl PixelCoords {
    pub fn x(&self) -> u32 {
        self.0
    }

    pub fn y(&self) -> u32 {
        self.1
    }
}

/// Everything read from an estimator after a single refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GazeReading {
    pub pupil_left: Option<PixelCoords>,
    pub pupil_right: Option<PixelCoords>,
    pub horizontal_ratio: Option<f64>,
    pub vertical_ratio: Option<f64>,
    pub is_left: bool,
    pub is_right: bool,
    pub is_center: bool,
    pub is_blinking: bool,
}

impl GazeReading {
    /// Reads every accessor once. Must run in the same critical section as
    /// the refresh it reports on.
    pub fn capture<E: GazeEstimator + ?Sized>(estimator: &E) -> Self {
        Self {
            pupil_left: estimator.pupil_left(),
            pupil_right: estimator.pupil_right(),
            horizontal_ratio: estimator.horizontal_ratio(),
            vertical_ratio: estimator.vertical_ratio(),
            is_left: estimator.is_left(),
            is_right: estimator.is_right(),
            is_center: estimator.is_center(),
            is_blinking: estimator.is_blinking(),
        }
    }
}

/// Per-frame result sent back to the client.
///
/// A failed frame carries only `error`, `frame_processed` and `timestamp`,
/// so a result can never have both gaze fields and an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GazeResult {
    Processed(GazeData),
    Failed(FrameFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeData {
    pub timestamp: f64,
    pub pupil_left: Option<PixelCoords>,
    pub pupil_right: Option<PixelCoords>,
    pub horizontal_ratio: Option<f64>,
    pub vertical_ratio: Option<f64>,
    pub is_left: bool,
    pub is_right: bool,
    pub is_center: bool,
    pub is_blinking: bool,
    pub frame_processed: bool,
    pub attention_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameFailure {
    pub error: String,
    pub frame_processed: bool,
    pub timestamp: f64,
}

impl GazeResult {
    pub fn processed(reading: GazeReading, attention_score: f64) -> Self {
        Self::Processed(GazeData {
            timestamp: timestamp(),
            pupil_left: reading.pupil_left,
            pupil_right: reading.pupil_right,
            horizontal_ratio: reading.horizontal_ratio,
            vertical_ratio: reading.vertical_ratio,
            is_left: reading.is_left,
            is_right: reading.is_right,
            is_center: reading.is_center,
            is_blinking: reading.is_blinking,
            frame_processed: true,
            attention_score,
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed(FrameFailure {
            error: error.into(),
            frame_processed: false,
            timestamp: timestamp(),
        })
    }

    pub fn frame_processed(&self) -> bool {
        matches!(self, Self::Processed(_))
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            Self::Processed(data) => data.timestamp,
            Self::Failed(failure) => failure.timestamp,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Processed(_) => None,
            Self::Failed(failure) => Some(&failure.error),
        }
    }

    pub fn attention_score(&self) -> Option<f64> {
        match self {
            Self::Processed(data) => Some(data.attention_score),
            Self::Failed(_) => None,
        }
    }
}

/// Wall-clock seconds since the Unix epoch, microsecond resolution.
fn timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
