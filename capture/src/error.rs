use thiserror::Error;

/// Capture flow failures.
///
/// `OutOfOrder` is the state-machine guard: the event is legal somewhere,
/// just not in the current state. `Camera` wraps device-level failures,
/// which stay on the client side of the protocol boundary.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot {event} while {state}")]
    OutOfOrder {
        state: &'static str,
        event: &'static str,
    },

    #[error("camera error: {0}")]
    Camera(String),
}
