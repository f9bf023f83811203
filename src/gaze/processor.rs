use super::{
    attention::attention_score,
    estimator::GazeEstimator,
    types::{GazeReading, GazeResult},
};
use crate::{Error, Result, frame};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

/// Runs frames through the one shared estimator.
///
/// The estimator sits behind a single mutex; a refresh and the reads that
/// follow it always happen under one guard, so readings from concurrent
/// connections never mix.
#[derive(Clone)]
pub struct GazeProcessor {
    estimator: Arc<Mutex<Box<dyn GazeEstimator>>>,
    estimator_name: &'static str,
}

impl GazeProcessor {
    pub fn new(estimator: Box<dyn GazeEstimator>) -> Self {
        let estimator_name = estimator.name();
        Self {
            estimator: Arc::new(Mutex::new(estimator)),
            estimator_name,
        }
    }

    pub fn estimator_name(&self) -> &'static str {
        self.estimator_name
    }

    /// Decodes, estimates and scores one frame. Never fails: decode and
    /// estimation errors come back as a failed result.
    pub async fn process(&self, payload: String) -> GazeResult {
        let processor = self.clone();
        let outcome = tokio::task::spawn_blocking(move || processor.process_blocking(&payload))
            .await
            .unwrap_or_else(|e| Err(Error::estimation(format!("estimation task failed: {}", e))));

        into_result(outcome)
    }

    /// Same as [`GazeProcessor::process`] but on the calling thread.
    pub fn process_sync(&self, payload: &str) -> GazeResult {
        into_result(self.process_blocking(payload))
    }

    fn process_blocking(&self, payload: &str) -> Result<GazeResult> {
        let frame = frame::decode(payload)?;
        let reading = self.estimate(&frame)?;
        let score = attention_score(&reading);

        debug!(
            "Frame processed: center={}, blinking={}, attention={:.2}",
            reading.is_center, reading.is_blinking, score
        );

        Ok(GazeResult::processed(reading, score))
    }

    fn estimate(&self, frame: &frame::BgrFrame) -> Result<GazeReading> {
        let mut estimator = match self.estimator.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A previous refresh panicked; the estimator's own state is
                // replaced on the next refresh, so keep serving
                self.estimator.clear_poison();
                poisoned.into_inner()
            }
        };

        estimator.refresh(frame)?;
        Ok(GazeReading::capture(&**estimator))
    }
}

fn into_result(outcome: Result<GazeResult>) -> GazeResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            error!("Error processing frame: {}", e);
            GazeResult::failed(e.to_string())
        }
    }
}
