use gaze_tracking_service::{
    Error, Result,
    frame::BgrFrame,
    gaze::{GazeEstimator, GazeReading, PixelCoords},
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;

/// Mock estimator that reports the same reading for every frame
#[derive(Debug, Clone)]
pub struct ScriptedEstimator {
    pub reading: GazeReading,
    pub refreshes: Arc<AtomicUsize>,
    pub error: Option<String>,
}

impl ScriptedEstimator {
    pub fn new(reading: GazeReading) -> Self {
        Self {
            reading,
            refreshes: Arc::new(AtomicUsize::new(0)),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl GazeEstimator for ScriptedEstimator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn refresh(&mut self, _frame: &BgrFrame) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(error) => Err(Error::estimation(error.clone())),
            None => Ok(()),
        }
    }

    fn pupil_left(&self) -> Option<PixelCoords> {
        self.reading.pupil_left
    }

    fn pupil_right(&self) -> Option<PixelCoords> {
        self.reading.pupil_right
    }

    fn horizontal_ratio(&self) -> Option<f64> {
        self.reading.horizontal_ratio
    }

    fn vertical_ratio(&self) -> Option<f64> {
        self.reading.vertical_ratio
    }

    fn is_left(&self) -> bool {
        self.reading.is_left
    }

    fn is_right(&self) -> bool {
        self.reading.is_right
    }

    fn is_center(&self) -> bool {
        self.reading.is_center
    }

    fn is_blinking(&self) -> bool {
        self.reading.is_blinking
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Refresh,
    Read,
}

/// Instrumented estimator: records every call together with the width of
/// the frame it currently holds, and panics if a refresh starts while
/// another frame's reads are still pending.
#[derive(Debug, Clone, Default)]
pub struct RecordingEstimator {
    pub log: Arc<Mutex<Vec<(Access, u32)>>>,
    owned: Arc<AtomicBool>,
    current_width: u32,
}

impl RecordingEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Access, u32)> {
        self.log.lock().unwrap().clone()
    }

    fn read(&self) {
        assert!(
            self.owned.load(Ordering::SeqCst),
            "read without a preceding refresh"
        );
        self.log
            .lock()
            .unwrap()
            .push((Access::Read, self.current_width));
    }
}

impl GazeEstimator for RecordingEstimator {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn refresh(&mut self, frame: &BgrFrame) -> Result<()> {
        let already_owned = self.owned.swap(true, Ordering::SeqCst);
        assert!(!already_owned, "refresh while another frame is being read");

        self.current_width = frame.width();
        self.log
            .lock()
            .unwrap()
            .push((Access::Refresh, frame.width()));
        // Widen the window in which an unserialized caller could sneak in
        std::thread::sleep(Duration::from_millis(1));
        Ok(())
    }

    fn pupil_left(&self) -> Option<PixelCoords> {
        self.read();
        None
    }

    fn pupil_right(&self) -> Option<PixelCoords> {
        self.read();
        None
    }

    fn horizontal_ratio(&self) -> Option<f64> {
        self.read();
        None
    }

    fn vertical_ratio(&self) -> Option<f64> {
        self.read();
        None
    }

    fn is_left(&self) -> bool {
        self.read();
        false
    }

    fn is_right(&self) -> bool {
        self.read();
        false
    }

    fn is_center(&self) -> bool {
        self.read();
        false
    }

    // Last accessor read per frame
    fn is_blinking(&self) -> bool {
        self.read();
        self.owned.store(false, Ordering::SeqCst);
        false
    }
}

/// Asserts the log is a sequence of blocks: one refresh followed by the
/// eight reads of that same frame.
pub fn assert_serialized(entries: &[(Access, u32)], frames: usize) {
    assert_eq!(entries.len(), frames * 9, "unexpected number of calls");

    for block in entries.chunks_exact(9) {
        let (first, width) = block[0];
        assert_eq!(first, Access::Refresh, "block does not start with refresh");
        for &(access, read_width) in &block[1..] {
            assert_eq!(access, Access::Read, "refresh interleaved with reads");
            assert_eq!(read_width, width, "read observed another frame");
        }
    }
}
