//! Nullable face matcher — deterministic identities for testing.

use async_trait::async_trait;
use facegate_liveness::{CapabilityError, FaceMatcher, MatchCandidate};
use facegate_types::{CapturedFrame, IdentityRef, TenantContext};

/// A matcher that returns the same candidate (or none) for every frame.
pub struct NullMatcher {
    candidate: Option<MatchCandidate>,
}

impl NullMatcher {
    /// Always match `uid` at `confidence`.
    pub fn matching(uid: i64, confidence: f64) -> Self {
        Self {
            candidate: Some(MatchCandidate {
                identity: IdentityRef(uid),
                confidence,
            }),
        }
    }

    /// Never match anyone.
    pub fn empty() -> Self {
        Self { candidate: None }
    }
}

#[async_trait]
impl FaceMatcher for NullMatcher {
    async fn match_identity(
        &self,
        _frame: &CapturedFrame,
        _tenant: &TenantContext,
        _uid_hint: Option<IdentityRef>,
    ) -> Result<Option<MatchCandidate>, CapabilityError> {
        Ok(self.candidate)
    }
}
