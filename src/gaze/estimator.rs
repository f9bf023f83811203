use super::types::PixelCoords;
use crate::{Result, frame::BgrFrame};

/// A stateful gaze estimation capability.
///
/// `refresh` analyses one frame and replaces the estimator's state; the
/// accessors then describe that frame until the next refresh. Callers that
/// share an estimator must hold exclusive access from `refresh` until the
/// last accessor returns.
///
/// Accessors return `None` when no face or pupil was found. The boolean
/// accessors return `false` in that case.
#[cfg_attr(test, mockall::automock)]
pub trait GazeEstimator: Send {
    fn name(&self) -> &'static str;

    fn refresh(&mut self, frame: &BgrFrame) -> Result<()>;

    fn pupil_left(&self) -> Option<PixelCoords>;
    fn pupil_right(&self) -> Option<PixelCoords>;
    fn horizontal_ratio(&self) -> Option<f64>;
    fn vertical_ratio(&self) -> Option<f64>;

    fn is_left(&self) -> bool;
    fn is_right(&self) -> bool;
    fn is_center(&self) -> bool;
    fn is_blinking(&self) -> bool;
}
