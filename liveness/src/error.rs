use thiserror::Error;

/// Verification failures, in validation order.
///
/// The first four are challenge-lifecycle violations and never consume the
/// challenge (`ChallengeAlreadyConsumed` is itself evidence it was consumed
/// earlier). `ActionNotDetected` and `NoFaceMatch` are failures on the
/// merits — expected, common outcomes reached only after the challenge has
/// been burned.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("challenge not found")]
    ChallengeNotFound,

    #[error("challenge expired")]
    ChallengeExpired,

    #[error("challenge already consumed")]
    ChallengeAlreadyConsumed,

    #[error("challenge was issued under a different tenant context")]
    TenantMismatch,

    #[error("frames outside the challenge window: {0}")]
    FrameOutOfWindow(String),

    #[error("instructed action not detected (confidence {confidence:.2})")]
    ActionNotDetected { confidence: f64 },

    #[error("no identity matched above the acceptance threshold")]
    NoFaceMatch,

    #[error("verification timed out during {stage}")]
    VerificationTimeout { stage: &'static str },

    #[error("capability error: {0}")]
    Capability(String),
}

impl VerifyError {
    /// Machine-readable wire code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ChallengeNotFound => "challenge_not_found",
            Self::ChallengeExpired => "challenge_expired",
            Self::ChallengeAlreadyConsumed => "challenge_already_consumed",
            Self::TenantMismatch => "tenant_mismatch",
            Self::FrameOutOfWindow(_) => "frame_out_of_window",
            Self::ActionNotDetected { .. } => "action_not_detected",
            Self::NoFaceMatch => "no_face_match",
            Self::VerificationTimeout { .. } => "verification_timeout",
            Self::Capability(_) => "capability_error",
        }
    }

    /// Whether this outcome is a failure on the merits rather than a
    /// protocol violation — i.e. the challenge was consumed and the frames
    /// were judged, they just did not pass.
    pub fn is_merit_failure(&self) -> bool {
        matches!(self, Self::ActionNotDetected { .. } | Self::NoFaceMatch)
    }
}

/// Challenge issuance failures.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("invalid tenant context: {0}")]
    InvalidContext(String),
}

impl IssueError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidContext(_) => "invalid_context",
        }
    }
}

/// Tenant directory resolution failures.
///
/// Statuses mirror the directory's role as a gatekeeper: a missing header
/// is the caller's mistake, an unknown branch does not exist, and an
/// unregistered or inactive device is refused service.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    #[error("branch not found: {0}")]
    UnknownBranch(String),

    #[error("unregistered device: {0}")]
    DeviceNotRegistered(String),

    #[error("inactive device: {0}")]
    DeviceInactive(String),
}

impl DirectoryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader(_) => "missing_tenant_header",
            Self::UnknownBranch(_) => "unknown_branch",
            Self::DeviceNotRegistered(_) => "device_not_registered",
            Self::DeviceInactive(_) => "device_inactive",
        }
    }
}
