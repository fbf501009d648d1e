//! The capture state machine.

use facegate_types::{CapturedFrame, ChallengeToken, FramePair, LivenessAction};

use crate::error::CaptureError;
use crate::source::FrameSource;

/// The challenge as presented to the user: which action to perform, and
/// the token to submit alongside the frames.
#[derive(Clone, Debug)]
pub struct ChallengeInstruction {
    pub token: ChallengeToken,
    pub action: LivenessAction,
}

/// Observable states of the capture flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    /// Instruction displayed, waiting for the user to start.
    ChallengeReady,
    CountdownA { remaining: u32 },
    CapturedA,
    CountdownB { remaining: u32 },
    /// Both frames present; submission is permitted.
    Complete,
}

impl CaptureState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ChallengeReady => "challenge ready",
            Self::CountdownA { .. } => "counting down to frame A",
            Self::CapturedA => "frame A captured",
            Self::CountdownB { .. } => "counting down to frame B",
            Self::Complete => "complete",
        }
    }
}

/// Everything needed to call the verify endpoint.
#[derive(Debug)]
pub struct CaptureSubmission {
    pub challenge: ChallengeToken,
    pub frames: FramePair,
}

/// Drives the two-frame capture flow over a frame source.
///
/// Frames are captured only when a countdown tick reaches zero — there is
/// deliberately no manual-capture entry point, so a caller cannot align a
/// replayed video with the capture instant. Ticks are injected by the UI
/// loop (one per second in production), which keeps the machine free of
/// timers and fully deterministic under test.
pub struct CaptureDriver<S: FrameSource> {
    source: S,
    countdown_ticks: u32,
    state: CaptureState,
    instruction: Option<ChallengeInstruction>,
    frame_a: Option<CapturedFrame>,
    frame_b: Option<CapturedFrame>,
    source_open: bool,
}

impl<S: FrameSource> CaptureDriver<S> {
    pub fn new(source: S, countdown_ticks: u32) -> Self {
        Self {
            source,
            countdown_ticks,
            state: CaptureState::Idle,
            instruction: None,
            frame_a: None,
            frame_b: None,
            source_open: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn instruction(&self) -> Option<&ChallengeInstruction> {
        self.instruction.as_ref()
    }

    /// Display a fresh challenge and acquire the camera.
    pub fn begin(&mut self, instruction: ChallengeInstruction) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(self.out_of_order("begin a new challenge"));
        }
        self.source.open()?;
        self.source_open = true;
        tracing::debug!(action = %instruction.action, "capture flow started");
        self.instruction = Some(instruction);
        self.state = CaptureState::ChallengeReady;
        Ok(())
    }

    /// User action: start the countdown for the next frame.
    pub fn start_countdown(&mut self) -> Result<u32, CaptureError> {
        let next = match self.state {
            CaptureState::ChallengeReady => CaptureState::CountdownA {
                remaining: self.countdown_ticks,
            },
            CaptureState::CapturedA => CaptureState::CountdownB {
                remaining: self.countdown_ticks,
            },
            _ => return Err(self.out_of_order("start a countdown")),
        };
        self.state = next;
        Ok(self.countdown_ticks)
    }

    /// One countdown tick. When the countdown reaches zero the pending
    /// frame is captured automatically.
    pub fn tick(&mut self) -> Result<CaptureState, CaptureError> {
        match self.state {
            CaptureState::CountdownA { remaining } if remaining > 1 => {
                self.state = CaptureState::CountdownA {
                    remaining: remaining - 1,
                };
            }
            CaptureState::CountdownA { .. } => {
                let frame = self.grab()?;
                self.frame_a = Some(frame);
                self.state = CaptureState::CapturedA;
            }
            CaptureState::CountdownB { remaining } if remaining > 1 => {
                self.state = CaptureState::CountdownB {
                    remaining: remaining - 1,
                };
            }
            CaptureState::CountdownB { .. } => {
                let frame = self.grab()?;
                // The driver is the guarantor of the strict-ordering
                // invariant the server relies on.
                let after_a = self
                    .frame_a
                    .as_ref()
                    .map_or(false, |a| frame.captured_at_ms > a.captured_at_ms);
                if !after_a {
                    let err = CaptureError::Camera(
                        "frame B not captured after frame A".into(),
                    );
                    self.reset();
                    return Err(err);
                }
                self.frame_b = Some(frame);
                self.state = CaptureState::Complete;
            }
            _ => return Err(self.out_of_order("tick the countdown")),
        }
        Ok(self.state)
    }

    /// Stop capture: discard any frames, release the camera, return to
    /// `Idle`. Legal in every state, so a stuck flow can always recover.
    pub fn cancel(&mut self) {
        tracing::debug!(state = self.state.name(), "capture cancelled");
        self.reset();
    }

    /// Hand over the finished submission. Only legal once both frames are
    /// captured; resets the machine and releases the camera.
    pub fn take_submission(&mut self) -> Result<CaptureSubmission, CaptureError> {
        if self.state != CaptureState::Complete {
            return Err(self.out_of_order("submit"));
        }
        // All three are guaranteed present in `Complete`.
        let (Some(instruction), Some(frame_a), Some(frame_b)) = (
            self.instruction.take(),
            self.frame_a.take(),
            self.frame_b.take(),
        ) else {
            self.reset();
            return Err(CaptureError::Camera("capture state lost".into()));
        };
        self.reset();
        Ok(CaptureSubmission {
            challenge: instruction.token,
            frames: FramePair::new(frame_a, frame_b),
        })
    }

    fn grab(&mut self) -> Result<CapturedFrame, CaptureError> {
        match self.source.grab() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                // Device failure mid-flow: release everything before
                // surfacing it.
                self.reset();
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        if self.source_open {
            self.source.close();
            self.source_open = false;
        }
        self.instruction = None;
        self.frame_a = None;
        self.frame_b = None;
        self.state = CaptureState::Idle;
    }

    fn out_of_order(&self, event: &'static str) -> CaptureError {
        CaptureError::OutOfOrder {
            state: self.state.name(),
            event,
        }
    }
}

impl<S: FrameSource> Drop for CaptureDriver<S> {
    fn drop(&mut self) {
        if self.source_open {
            self.source.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct SourceLog {
        opens: usize,
        closes: usize,
    }

    /// Frame source that replays a scripted list of capture times.
    struct ScriptedSource {
        log: Arc<Mutex<SourceLog>>,
        stamps_ms: Vec<u64>,
        next: usize,
    }

    impl ScriptedSource {
        fn new(stamps_ms: Vec<u64>) -> (Self, Arc<Mutex<SourceLog>>) {
            let log = Arc::new(Mutex::new(SourceLog::default()));
            (
                Self {
                    log: Arc::clone(&log),
                    stamps_ms,
                    next: 0,
                },
                log,
            )
        }
    }

    impl FrameSource for ScriptedSource {
        fn open(&mut self) -> Result<(), CaptureError> {
            self.log.lock().unwrap().opens += 1;
            Ok(())
        }

        fn grab(&mut self) -> Result<CapturedFrame, CaptureError> {
            let stamp = *self
                .stamps_ms
                .get(self.next)
                .ok_or_else(|| CaptureError::Camera("no more frames".into()))?;
            self.next += 1;
            Ok(CapturedFrame::new(vec![0xFF, 0xD8, 0xFF, 0xE0], stamp))
        }

        fn close(&mut self) {
            self.log.lock().unwrap().closes += 1;
        }
    }

    fn instruction() -> ChallengeInstruction {
        ChallengeInstruction {
            token: ChallengeToken::generate(),
            action: LivenessAction::Blink,
        }
    }

    #[test]
    fn full_flow_yields_strictly_ordered_frames() {
        let (source, log) = ScriptedSource::new(vec![1_000, 4_000]);
        let mut driver = CaptureDriver::new(source, 3);

        driver.begin(instruction()).unwrap();
        assert_eq!(driver.state(), CaptureState::ChallengeReady);

        driver.start_countdown().unwrap();
        assert_eq!(driver.tick().unwrap(), CaptureState::CountdownA { remaining: 2 });
        assert_eq!(driver.tick().unwrap(), CaptureState::CountdownA { remaining: 1 });
        assert_eq!(driver.tick().unwrap(), CaptureState::CapturedA);

        driver.start_countdown().unwrap();
        driver.tick().unwrap();
        driver.tick().unwrap();
        assert_eq!(driver.tick().unwrap(), CaptureState::Complete);

        let submission = driver.take_submission().unwrap();
        assert!(
            submission.frames.frame_a.captured_at_ms < submission.frames.frame_b.captured_at_ms
        );
        assert_eq!(driver.state(), CaptureState::Idle);
        assert_eq!(log.lock().unwrap().closes, 1);
    }

    #[test]
    fn frame_b_is_unreachable_without_frame_a() {
        let (source, _) = ScriptedSource::new(vec![1_000]);
        let mut driver = CaptureDriver::new(source, 3);

        // No countdown can start before a challenge is shown.
        assert!(matches!(
            driver.start_countdown().unwrap_err(),
            CaptureError::OutOfOrder { .. }
        ));

        driver.begin(instruction()).unwrap();

        // Ticking without an armed countdown is rejected.
        assert!(matches!(
            driver.tick().unwrap_err(),
            CaptureError::OutOfOrder { .. }
        ));

        // There is no way to arm the frame-B countdown from here: arming
        // from ChallengeReady always targets frame A.
        driver.start_countdown().unwrap();
        assert!(matches!(
            driver.state(),
            CaptureState::CountdownA { .. }
        ));
    }

    #[test]
    fn submission_requires_both_frames() {
        let (source, _) = ScriptedSource::new(vec![1_000, 4_000]);
        let mut driver = CaptureDriver::new(source, 1);
        driver.begin(instruction()).unwrap();
        driver.start_countdown().unwrap();
        driver.tick().unwrap(); // frame A

        assert!(matches!(
            driver.take_submission().unwrap_err(),
            CaptureError::OutOfOrder { .. }
        ));
    }

    #[test]
    fn cancel_discards_frames_and_releases_the_camera() {
        let (source, log) = ScriptedSource::new(vec![1_000, 4_000]);
        let mut driver = CaptureDriver::new(source, 1);
        driver.begin(instruction()).unwrap();
        driver.start_countdown().unwrap();
        driver.tick().unwrap(); // frame A captured

        driver.cancel();
        assert_eq!(driver.state(), CaptureState::Idle);
        assert_eq!(log.lock().unwrap().closes, 1);
        assert!(driver.instruction().is_none());

        // No partial submission is possible after cancelling.
        assert!(driver.take_submission().is_err());
    }

    #[test]
    fn drop_releases_the_camera() {
        let (source, log) = ScriptedSource::new(vec![1_000]);
        {
            let mut driver = CaptureDriver::new(source, 1);
            driver.begin(instruction()).unwrap();
        }
        assert_eq!(log.lock().unwrap().closes, 1);
    }

    #[test]
    fn begin_twice_is_rejected_until_cancelled() {
        let (source, _) = ScriptedSource::new(vec![1_000]);
        let mut driver = CaptureDriver::new(source, 1);
        driver.begin(instruction()).unwrap();
        assert!(matches!(
            driver.begin(instruction()).unwrap_err(),
            CaptureError::OutOfOrder { .. }
        ));
        driver.cancel();
        assert!(driver.begin(instruction()).is_ok());
    }

    #[test]
    fn non_monotonic_camera_stamps_abort_the_flow() {
        let (source, log) = ScriptedSource::new(vec![4_000, 1_000]);
        let mut driver = CaptureDriver::new(source, 1);
        driver.begin(instruction()).unwrap();
        driver.start_countdown().unwrap();
        driver.tick().unwrap(); // frame A at 4000ms
        driver.start_countdown().unwrap();

        let err = driver.tick().unwrap_err(); // frame B at 1000ms
        assert!(matches!(err, CaptureError::Camera(_)));
        assert_eq!(driver.state(), CaptureState::Idle);
        assert_eq!(log.lock().unwrap().closes, 1);
    }

    #[test]
    fn countdown_length_is_configurable() {
        let (source, _) = ScriptedSource::new(vec![1_000]);
        let mut driver = CaptureDriver::new(source, 1);
        driver.begin(instruction()).unwrap();
        assert_eq!(driver.start_countdown().unwrap(), 1);
        assert_eq!(driver.tick().unwrap(), CaptureState::CapturedA);
    }
}
