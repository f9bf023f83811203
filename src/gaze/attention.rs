use super::types::GazeReading;

const BLINKING_SCORE: f64 = 0.3;
const CENTERED_SCORE: f64 = 1.0;
const UNKNOWN_SCORE: f64 = 0.5;

/// Maps a gaze reading to an attention score in `[0, 1]`.
///
/// Rules are checked in order: blinking, centered gaze, missing ratios, and
/// finally the distance of the ratio pair from the center `(0.5, 0.5)`.
pub fn attention_score(reading: &GazeReading) -> f64 {
    if reading.is_blinking {
        return BLINKING_SCORE;
    }

    if reading.is_center {
        return CENTERED_SCORE;
    }

    let (Some(horizontal), Some(vertical)) = (reading.horizontal_ratio, reading.vertical_ratio)
    else {
        return UNKNOWN_SCORE;
    };

    let distance = (horizontal - 0.5).hypot(vertical - 0.5);
    let score = (1.0 - distance * 2.0).max(0.0);

    (score * 100.0).round_ties_even() / 100.0
}
