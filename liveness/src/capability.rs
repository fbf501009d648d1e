//! External capabilities consumed by the verifier.
//!
//! Action analysis and identity matching are opaque model-inference
//! services; the tenant directory and audit sink are the platform's
//! storage-backed collaborators. All four are traits so the protocol core
//! is testable without a camera, a model, or a database.

use async_trait::async_trait;
use facegate_types::{
    CapturedFrame, ChallengeToken, IdentityRef, LivenessAction, TenantContext, Timestamp,
};
use thiserror::Error;

use crate::error::DirectoryError;

/// Failure inside an external capability (network, model, malformed reply).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CapabilityError(pub String);

/// The best identity candidate the matcher found for a frame.
#[derive(Clone, Copy, Debug)]
pub struct MatchCandidate {
    pub identity: IdentityRef,
    pub confidence: f64,
}

/// Judges whether the instructed action occurred between two frames.
#[async_trait]
pub trait ActionAnalyzer: Send + Sync {
    /// Confidence in `[0, 1]` that `action` happened between `frame_a`
    /// and `frame_b`.
    async fn detect_action(
        &self,
        frame_a: &CapturedFrame,
        frame_b: &CapturedFrame,
        action: LivenessAction,
    ) -> Result<f64, CapabilityError>;
}

/// Searches the tenant's identity store for the face in a frame.
#[async_trait]
pub trait FaceMatcher: Send + Sync {
    /// Best match for the face in `frame` within `tenant`'s branch scope,
    /// or `None` when no enrolled face resembles it at all. `uid_hint`
    /// narrows the search to one enrolled identity when present.
    async fn match_identity(
        &self,
        frame: &CapturedFrame,
        tenant: &TenantContext,
        uid_hint: Option<IdentityRef>,
    ) -> Result<Option<MatchCandidate>, CapabilityError>;
}

/// Resolves request headers into a validated tenant context.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Map an (org id, branch code, device code) header triple to a
    /// `TenantContext`, rejecting unknown branches and unregistered or
    /// inactive devices.
    async fn resolve(
        &self,
        org_id: &str,
        branch_code: &str,
        device_code: &str,
    ) -> Result<TenantContext, DirectoryError>;
}

/// One verification attempt, as recorded for audit.
///
/// Only consumed attempts are audited — lifecycle rejections burn nothing
/// and prove nothing.
#[derive(Clone, Debug)]
pub struct AuditEvent {
    pub tenant: TenantContext,
    pub challenge: ChallengeToken,
    pub action: LivenessAction,
    /// Outcome code: `"ok"` or a `VerifyError` code.
    pub outcome: &'static str,
    pub identity: Option<IdentityRef>,
    pub confidence: f64,
    pub at: Timestamp,
}

/// Receives one event per consumed verification attempt.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Default audit sink: structured tracing events.
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, event: AuditEvent) {
        if event.outcome == "ok" {
            tracing::info!(
                tenant = %event.tenant,
                challenge = %event.challenge,
                action = %event.action,
                identity = ?event.identity,
                confidence = event.confidence,
                "verification passed"
            );
        } else {
            tracing::warn!(
                tenant = %event.tenant,
                challenge = %event.challenge,
                action = %event.action,
                outcome = event.outcome,
                confidence = event.confidence,
                "verification failed"
            );
        }
    }
}
