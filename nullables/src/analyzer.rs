//! Nullable action analyzer — deterministic confidences for testing.

use async_trait::async_trait;
use facegate_liveness::{ActionAnalyzer, CapabilityError};
use facegate_types::{CapturedFrame, LivenessAction};
use std::sync::Mutex;
use std::time::Duration;

/// An action analyzer that replays a configured confidence sequence.
pub struct NullAnalyzer {
    confidences: Mutex<Vec<f64>>,
    index: Mutex<usize>,
    delay: Option<Duration>,
}

impl NullAnalyzer {
    /// Create with a sequence of confidences, returned in order and
    /// repeating from the start once exhausted.
    pub fn new(confidences: Vec<f64>) -> Self {
        Self {
            confidences: Mutex::new(confidences),
            index: Mutex::new(0),
            delay: None,
        }
    }

    /// Create with a single confidence returned for every call.
    pub fn constant(confidence: f64) -> Self {
        Self::new(vec![confidence])
    }

    /// A nullable that never answers within any realistic budget, for
    /// exercising timeout paths.
    pub fn stalled() -> Self {
        Self {
            confidences: Mutex::new(vec![1.0]),
            index: Mutex::new(0),
            delay: Some(Duration::from_secs(3600)),
        }
    }
}

#[async_trait]
impl ActionAnalyzer for NullAnalyzer {
    async fn detect_action(
        &self,
        _frame_a: &CapturedFrame,
        _frame_b: &CapturedFrame,
        _action: LivenessAction,
    ) -> Result<f64, CapabilityError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let confidences = self.confidences.lock().unwrap();
        let mut idx = self.index.lock().unwrap();
        let current = *idx % confidences.len();
        *idx += 1;
        Ok(confidences[current])
    }
}
