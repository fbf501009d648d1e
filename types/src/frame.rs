//! Captured camera frames.
//!
//! Frames are opaque JPEG payloads tagged with a millisecond capture time.
//! They exist only for the duration of one verification call; nothing in
//! this workspace persists them.

/// JPEG start-of-image marker.
const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// A single still image captured by the client.
#[derive(Clone)]
pub struct CapturedFrame {
    /// Raw JPEG bytes.
    pub jpeg: Vec<u8>,
    /// Capture time in milliseconds since epoch, as declared by the capture
    /// driver (or stamped at receipt when the client declared none).
    pub captured_at_ms: u64,
}

impl CapturedFrame {
    pub fn new(jpeg: Vec<u8>, captured_at_ms: u64) -> Self {
        Self {
            jpeg,
            captured_at_ms,
        }
    }

    /// Cheap sanity check: the payload at least begins like a JPEG.
    /// Full decoding is the analysis capability's job.
    pub fn looks_like_jpeg(&self) -> bool {
        self.jpeg.len() > 2 && self.jpeg[..2] == JPEG_MAGIC
    }
}

impl std::fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("bytes", &self.jpeg.len())
            .field("captured_at_ms", &self.captured_at_ms)
            .finish()
    }
}

/// The two frames bracketing the instructed action.
#[derive(Clone, Debug)]
pub struct FramePair {
    pub frame_a: CapturedFrame,
    pub frame_b: CapturedFrame,
}

impl FramePair {
    pub fn new(frame_a: CapturedFrame, frame_b: CapturedFrame) -> Self {
        Self { frame_a, frame_b }
    }

    /// Whether frame A was captured no later than frame B.
    ///
    /// The capture driver guarantees strictly increasing capture times; at
    /// the server boundary receipt-stamped frames may tie within one
    /// millisecond, so the check here is non-decreasing.
    pub fn is_ordered(&self) -> bool {
        self.frame_a.captured_at_ms <= self.frame_b.captured_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(ms: u64) -> CapturedFrame {
        CapturedFrame::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00], ms)
    }

    #[test]
    fn jpeg_magic_is_required() {
        assert!(jpeg(0).looks_like_jpeg());
        assert!(!CapturedFrame::new(vec![0x89, 0x50, 0x4E, 0x47], 0).looks_like_jpeg());
        assert!(!CapturedFrame::new(Vec::new(), 0).looks_like_jpeg());
    }

    #[test]
    fn ordering_allows_ties_but_not_reversal() {
        assert!(FramePair::new(jpeg(100), jpeg(200)).is_ordered());
        assert!(FramePair::new(jpeg(100), jpeg(100)).is_ordered());
        assert!(!FramePair::new(jpeg(200), jpeg(100)).is_ordered());
    }
}
