//! The camera abstraction.

use facegate_types::CapturedFrame;

use crate::error::CaptureError;

/// A live video capability that produces frames on demand.
///
/// Implementations wrap a real camera (with whatever retry and warm-up
/// logic the device needs); tests inject scripted sources. The driver
/// calls `close` on every exit path — cancellation, completion, failure,
/// and drop — so implementations can release the device eagerly.
pub trait FrameSource {
    /// Acquire the device and start producing frames.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Capture one still frame, stamped with its capture time.
    fn grab(&mut self) -> Result<CapturedFrame, CaptureError>;

    /// Release the device. Must be safe to call more than once.
    fn close(&mut self);
}
