//! Liveness protocol core.
//!
//! A challenge-response flow proving that a biometric sample was captured
//! from a live subject:
//! 1. **Issuance**: the server hands out a time-bound, single-use challenge
//!    naming an action from a fixed vocabulary, stamped with the tenant
//!    context that requested it.
//! 2. **Verification**: the client submits the challenge token plus two
//!    frames bracketing the action; the verifier burns the challenge on the
//!    first attempt, then asks the external action-analysis and
//!    identity-matching capabilities to judge the frames.
//!
//! The capabilities are modular — the protocol specifies *that* analysis
//! must happen, not *how*. Production wires them to a remote face engine;
//! tests inject deterministic fakes.

pub mod capability;
pub mod challenge;
pub mod directory;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod verifier;

pub use capability::{
    ActionAnalyzer, AuditEvent, AuditSink, CapabilityError, FaceMatcher, MatchCandidate,
    TenantDirectory, TracingAudit,
};
pub use challenge::{Challenge, ChallengeIssuer};
pub use directory::{BranchEntry, DeviceEntry, StaticDirectory};
pub use engine::RemoteFaceEngine;
pub use error::{DirectoryError, IssueError, VerifyError};
pub use outcome::VerificationResult;
pub use verifier::LivenessVerifier;
