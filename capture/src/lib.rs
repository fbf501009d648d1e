//! Client-side capture protocol driver.
//!
//! The server's liveness assumption rests on how the two frames are taken:
//! frame A before frame B, each captured automatically when a countdown
//! reaches zero, never on a manual click. This crate reproduces that
//! contract as an explicit state machine over an abstract frame source, so
//! the flow is testable without a real camera.

pub mod driver;
pub mod error;
pub mod source;

pub use driver::{CaptureDriver, CaptureState, CaptureSubmission, ChallengeInstruction};
pub use error::CaptureError;
pub use source::FrameSource;
