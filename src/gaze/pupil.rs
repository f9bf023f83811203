//! Region-based pupil tracker.
//!
//! Assumes a roughly head-on webcam framing: each eye is searched for inside
//! a fixed, configurable rectangle of the frame. Within a region the darkest
//! blob is taken as the pupil. The binarization threshold is calibrated over
//! the first frames the tracker sees and then frozen.

use super::{estimator::GazeEstimator, types::PixelCoords};
use crate::{
    Error, Result,
    config::{EstimatorConfig, EyeRegion},
    frame::BgrFrame,
};
use tracing::{debug, info};

const THRESHOLD_CANDIDATES: [u8; 20] = [
    5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70, 75, 80, 85, 90, 95, 100,
];

pub struct PupilTracker {
    config: EstimatorConfig,
    left_calibration: Calibration,
    right_calibration: Calibration,
    located: Option<(EyeObservation, EyeObservation)>,
}

#[derive(Debug, Default)]
struct Calibration {
    thresholds: Vec<u8>,
}

impl Calibration {
    fn is_complete(&self, frames: usize) -> bool {
        self.thresholds.len() >= frames
    }

    fn record(&mut self, threshold: u8) {
        self.thresholds.push(threshold);
    }

    fn threshold(&self) -> Option<u8> {
        if self.thresholds.is_empty() {
            return None;
        }
        let sum: u32 = self.thresholds.iter().map(|&t| u32::from(t)).sum();
        let avg = f64::from(sum) / self.thresholds.len() as f64;
        Some(avg.round() as u8)
    }
}

/// Pixel rectangle of an eye region inside a particular frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Rect {
    fn from_region(region: &EyeRegion, frame: &BgrFrame) -> Self {
        let fw = f64::from(frame.width());
        let fh = f64::from(frame.height());

        let x = ((region.x * fw).round() as u32).min(frame.width() - 1);
        let y = ((region.y * fh).round() as u32).min(frame.height() - 1);
        let width = ((region.width * fw).round() as u32)
            .max(1)
            .min(frame.width() - x);
        let height = ((region.height * fh).round() as u32)
            .max(1)
            .min(frame.height() - y);

        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct EyeObservation {
    region: Rect,
    // Centroid relative to the region origin
    pupil_x: f64,
    pupil_y: f64,
    // Width over height of the dark blob's bounding box
    blink_ratio: f64,
}

impl EyeObservation {
    fn coords(&self) -> PixelCoords {
        PixelCoords(
            (f64::from(self.region.x) + self.pupil_x).round() as u32,
            (f64::from(self.region.y) + self.pupil_y).round() as u32,
        )
    }

    fn horizontal_ratio(&self) -> f64 {
        relative(self.pupil_x, self.region.width)
    }

    fn vertical_ratio(&self) -> f64 {
        relative(self.pupil_y, self.region.height)
    }
}

fn relative(position: f64, extent: u32) -> f64 {
    if extent < 2 {
        return 0.5;
    }
    (position / f64::from(extent - 1)).clamp(0.0, 1.0)
}

impl PupilTracker {
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Pupil tracker initialized (calibration over {} frames)",
            config.calibration_frames
        );
        Ok(Self {
            config,
            left_calibration: Calibration::default(),
            right_calibration: Calibration::default(),
            located: None,
        })
    }

    pub fn is_calibrated(&self) -> bool {
        let frames = self.config.calibration_frames;
        self.left_calibration.is_complete(frames) && self.right_calibration.is_complete(frames)
    }

    fn observe(
        frame: &BgrFrame,
        region: &EyeRegion,
        calibration: &mut Calibration,
        config: &EstimatorConfig,
    ) -> Option<EyeObservation> {
        let rect = Rect::from_region(region, frame);
        if rect.width < 2 || rect.height < 2 {
            return None;
        }

        let mut lumas = Vec::with_capacity((rect.width * rect.height) as usize);
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                lumas.push(frame.luma(x, y)?);
            }
        }

        let min = lumas.iter().copied().min()?;
        let max = lumas.iter().copied().max()?;
        if max - min < config.min_contrast {
            return None;
        }

        if !calibration.is_complete(config.calibration_frames) {
            calibration.record(best_threshold(&lumas, config.iris_fraction));
        }
        let threshold = calibration.threshold()?;

        let mut count = 0usize;
        let (mut sum_x, mut sum_y) = (0u64, 0u64);
        let (mut min_x, mut max_x) = (u32::MAX, 0u32);
        let (mut min_y, mut max_y) = (u32::MAX, 0u32);

        for (i, &luma) in lumas.iter().enumerate() {
            if luma > threshold {
                continue;
            }
            let x = (i as u32) % rect.width;
            let y = (i as u32) / rect.width;
            count += 1;
            sum_x += u64::from(x);
            sum_y += u64::from(y);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        if count < config.min_pupil_pixels {
            return None;
        }

        let blob_width = f64::from(max_x - min_x + 1);
        let blob_height = f64::from(max_y - min_y + 1);

        Some(EyeObservation {
            region: rect,
            pupil_x: sum_x as f64 / count as f64,
            pupil_y: sum_y as f64 / count as f64,
            blink_ratio: blob_width / blob_height,
        })
    }
}

/// Picks the candidate threshold whose dark share is closest to `iris_fraction`.
fn best_threshold(lumas: &[u8], iris_fraction: f64) -> u8 {
    let total = lumas.len().max(1) as f64;
    let mut best = THRESHOLD_CANDIDATES[0];
    let mut best_diff = f64::INFINITY;

    for threshold in THRESHOLD_CANDIDATES {
        let dark = lumas.iter().filter(|&&l| l <= threshold).count() as f64;
        let diff = (dark / total - iris_fraction).abs();
        if diff < best_diff {
            best = threshold;
            best_diff = diff;
        }
    }

    best
}

impl GazeEstimator for PupilTracker {
    fn name(&self) -> &'static str {
        "pupil-tracker"
    }

    fn refresh(&mut self, frame: &BgrFrame) -> Result<()> {
        if frame.width() < 2 || frame.height() < 2 {
            self.located = None;
            return Err(Error::estimation(format!(
                "frame of {}x{} pixels is too small to analyse",
                frame.width(),
                frame.height()
            )));
        }

        let left = Self::observe(
            frame,
            &self.config.left_eye,
            &mut self.left_calibration,
            &self.config,
        );
        let right = Self::observe(
            frame,
            &self.config.right_eye,
            &mut self.right_calibration,
            &self.config,
        );

        self.located = left.zip(right);
        debug!(
            "Pupil tracker refreshed on {}x{} frame, pupils located: {}",
            frame.width(),
            frame.height(),
            self.located.is_some()
        );
        Ok(())
    }

    fn pupil_left(&self) -> Option<PixelCoords> {
        self.located.map(|(left, _)| left.coords())
    }

    fn pupil_right(&self) -> Option<PixelCoords> {
        self.located.map(|(_, right)| right.coords())
    }

    fn horizontal_ratio(&self) -> Option<f64> {
        self.located
            .map(|(left, right)| (left.horizontal_ratio() + right.horizontal_ratio()) / 2.0)
    }

    fn vertical_ratio(&self) -> Option<f64> {
        self.located
            .map(|(left, right)| (left.vertical_ratio() + right.vertical_ratio()) / 2.0)
    }

    fn is_left(&self) -> bool {
        self.horizontal_ratio()
            .is_some_and(|ratio| ratio >= self.config.left_threshold)
    }

    fn is_right(&self) -> bool {
        self.horizontal_ratio()
            .is_some_and(|ratio| ratio <= self.config.right_threshold)
    }

    fn is_center(&self) -> bool {
        self.located.is_some() && !self.is_left() && !self.is_right()
    }

    fn is_blinking(&self) -> bool {
        self.located.is_some_and(|(left, right)| {
            (left.blink_ratio + right.blink_ratio) / 2.0 > self.config.blink_ratio
        })
    }
}
