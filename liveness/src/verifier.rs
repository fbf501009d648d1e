//! The liveness verifier — consumes a challenge and two frames, renders a
//! single pass/fail decision bound to a matched identity.
//!
//! Validation order is fixed and fail-fast: unknown token, expiry, replay,
//! tenant binding, frame window (none of which consume the challenge),
//! then the challenge is burned and the external capabilities judge the
//! frames. One challenge buys at most one judged attempt, pass or fail.

use std::sync::Arc;
use std::time::Duration;

use facegate_types::{ChallengeToken, FramePair, IdentityRef, TenantContext, Timestamp};
use tokio::time::timeout;

use crate::capability::{ActionAnalyzer, AuditEvent, AuditSink, FaceMatcher};
use crate::challenge::{Challenge, ChallengeIssuer};
use crate::error::VerifyError;
use crate::outcome::{combined_confidence, VerificationResult};

pub struct LivenessVerifier {
    issuer: Arc<ChallengeIssuer>,
    analyzer: Arc<dyn ActionAnalyzer>,
    matcher: Arc<dyn FaceMatcher>,
    audit: Arc<dyn AuditSink>,
}

impl LivenessVerifier {
    pub fn new(
        issuer: Arc<ChallengeIssuer>,
        analyzer: Arc<dyn ActionAnalyzer>,
        matcher: Arc<dyn FaceMatcher>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            issuer,
            analyzer,
            matcher,
            audit,
        }
    }

    /// Verify two frames against an outstanding challenge.
    ///
    /// External capability calls are bounded by the configured timeout; a
    /// timeout is surfaced as its own error kind so callers can tell
    /// "unproven" from "proven false". Because the challenge is consumed
    /// before the first external call, a timeout never burns a challenge
    /// that had not passed lifecycle validation — and always leaves a
    /// validated one burned.
    pub async fn verify(
        &self,
        token: &ChallengeToken,
        frames: FramePair,
        tenant: &TenantContext,
        uid_hint: Option<IdentityRef>,
        now: Timestamp,
    ) -> Result<VerificationResult, VerifyError> {
        let challenge = self.issuer.claim(token, tenant, &frames, now)?;
        let params = self.issuer.params();
        let budget = Duration::from_secs(params.verify_timeout_secs);

        let action_confidence = match timeout(
            budget,
            self.analyzer
                .detect_action(&frames.frame_a, &frames.frame_b, challenge.action),
        )
        .await
        {
            Err(_) => {
                return Err(self.fail(&challenge, VerifyError::VerificationTimeout {
                    stage: "action analysis",
                }, now));
            }
            Ok(Err(e)) => {
                return Err(self.fail(&challenge, VerifyError::Capability(e.to_string()), now));
            }
            Ok(Ok(confidence)) => confidence,
        };

        if action_confidence < params.action_threshold {
            return Err(self.fail(
                &challenge,
                VerifyError::ActionNotDetected {
                    confidence: action_confidence,
                },
                now,
            ));
        }

        // Identity is matched against the later frame: it is the one taken
        // after the action completed, facing the camera.
        let candidate = match timeout(
            budget,
            self.matcher.match_identity(&frames.frame_b, tenant, uid_hint),
        )
        .await
        {
            Err(_) => {
                return Err(self.fail(&challenge, VerifyError::VerificationTimeout {
                    stage: "identity matching",
                }, now));
            }
            Ok(Err(e)) => {
                return Err(self.fail(&challenge, VerifyError::Capability(e.to_string()), now));
            }
            Ok(Ok(candidate)) => candidate,
        };

        let accepted = candidate
            .filter(|m| m.confidence >= params.match_threshold)
            .filter(|m| uid_hint.map_or(true, |hint| m.identity == hint));
        let Some(matched) = accepted else {
            return Err(self.fail(&challenge, VerifyError::NoFaceMatch, now));
        };

        let confidence = combined_confidence(action_confidence, matched.confidence);
        self.audit.record(AuditEvent {
            tenant: challenge.tenant.clone(),
            challenge: challenge.token,
            action: challenge.action,
            outcome: "ok",
            identity: Some(matched.identity),
            confidence,
            at: now,
        });
        Ok(VerificationResult {
            ok: true,
            matched_identity: Some(matched.identity),
            confidence,
            tenant: challenge.tenant.clone(),
        })
    }

    /// Record a failed consumed attempt and hand the error back.
    fn fail(&self, challenge: &Challenge, error: VerifyError, now: Timestamp) -> VerifyError {
        let confidence = match error {
            VerifyError::ActionNotDetected { confidence } => confidence,
            _ => 0.0,
        };
        self.audit.record(AuditEvent {
            tenant: challenge.tenant.clone(),
            challenge: challenge.token,
            action: challenge.action,
            outcome: error.code(),
            identity: None,
            confidence,
            at: now,
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityError, MatchCandidate};
    use async_trait::async_trait;
    use facegate_types::{CapturedFrame, LivenessAction, LivenessParams};
    use std::sync::Mutex;

    struct FixedAnalyzer(f64);

    #[async_trait]
    impl ActionAnalyzer for FixedAnalyzer {
        async fn detect_action(
            &self,
            _: &CapturedFrame,
            _: &CapturedFrame,
            _: LivenessAction,
        ) -> Result<f64, CapabilityError> {
            Ok(self.0)
        }
    }

    struct StalledAnalyzer;

    #[async_trait]
    impl ActionAnalyzer for StalledAnalyzer {
        async fn detect_action(
            &self,
            _: &CapturedFrame,
            _: &CapturedFrame,
            _: LivenessAction,
        ) -> Result<f64, CapabilityError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1.0)
        }
    }

    struct FixedMatcher(Option<MatchCandidate>);

    #[async_trait]
    impl FaceMatcher for FixedMatcher {
        async fn match_identity(
            &self,
            _: &CapturedFrame,
            _: &TenantContext,
            _: Option<IdentityRef>,
        ) -> Result<Option<MatchCandidate>, CapabilityError> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct RecordingAudit(Mutex<Vec<AuditEvent>>);

    impl AuditSink for RecordingAudit {
        fn record(&self, event: AuditEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn tenant() -> TenantContext {
        TenantContext::new("acme", 7, "kiosk-1")
    }

    fn frames() -> FramePair {
        FramePair::new(
            CapturedFrame::new(vec![0xFF, 0xD8, 0xFF, 0xE0], 1_000_500),
            CapturedFrame::new(vec![0xFF, 0xD8, 0xFF, 0xE1], 1_004_500),
        )
    }

    fn verifier_with(
        params: LivenessParams,
        analyzer: impl ActionAnalyzer + 'static,
        matcher: impl FaceMatcher + 'static,
    ) -> (LivenessVerifier, Arc<ChallengeIssuer>, Arc<RecordingAudit>) {
        let issuer = Arc::new(ChallengeIssuer::new(params));
        let audit = Arc::new(RecordingAudit::default());
        let verifier = LivenessVerifier::new(
            Arc::clone(&issuer),
            Arc::new(analyzer),
            Arc::new(matcher),
            audit.clone(),
        );
        (verifier, issuer, audit)
    }

    fn candidate(uid: i64, confidence: f64) -> MatchCandidate {
        MatchCandidate {
            identity: IdentityRef(uid),
            confidence,
        }
    }

    #[tokio::test]
    async fn detected_action_and_strong_match_pass() {
        let (verifier, issuer, audit) = verifier_with(
            LivenessParams::default(),
            FixedAnalyzer(0.95),
            FixedMatcher(Some(candidate(42, 0.92))),
        );
        let now = Timestamp::new(1000);
        let c = issuer.issue(&tenant(), now).unwrap();

        let result = verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap();
        assert!(result.ok);
        assert_eq!(result.matched_identity, Some(IdentityRef(42)));
        assert_eq!(result.confidence, 0.92); // min(0.95, 0.92)
        assert_eq!(result.tenant, tenant());

        let events = audit.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, "ok");
    }

    #[tokio::test]
    async fn a_used_challenge_cannot_be_replayed() {
        let (verifier, issuer, _) = verifier_with(
            LivenessParams::default(),
            FixedAnalyzer(0.95),
            FixedMatcher(Some(candidate(42, 0.92))),
        );
        let now = Timestamp::new(1000);
        let c = issuer.issue(&tenant(), now).unwrap();

        verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap();
        let err = verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::ChallengeAlreadyConsumed));
    }

    #[tokio::test]
    async fn undetected_action_fails_and_still_burns_the_challenge() {
        let (verifier, issuer, audit) = verifier_with(
            LivenessParams::default(),
            FixedAnalyzer(0.1),
            FixedMatcher(Some(candidate(42, 0.92))),
        );
        let now = Timestamp::new(1000);
        let c = issuer.issue(&tenant(), now).unwrap();

        let err = verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::ActionNotDetected { .. }));

        // The failed attempt consumed the challenge all the same.
        let err = verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::ChallengeAlreadyConsumed));

        let events = audit.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, "action_not_detected");
    }

    #[tokio::test]
    async fn weak_or_missing_match_fails() {
        let now = Timestamp::new(1000);

        let (verifier, issuer, _) = verifier_with(
            LivenessParams::default(),
            FixedAnalyzer(0.95),
            FixedMatcher(None),
        );
        let c = issuer.issue(&tenant(), now).unwrap();
        let err = verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::NoFaceMatch));

        // A candidate below the 0.45 threshold is no match either.
        let (verifier, issuer, _) = verifier_with(
            LivenessParams::default(),
            FixedAnalyzer(0.95),
            FixedMatcher(Some(candidate(42, 0.3))),
        );
        let c = issuer.issue(&tenant(), now).unwrap();
        let err = verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::NoFaceMatch));
    }

    #[tokio::test]
    async fn hint_contradicting_the_match_fails() {
        let (verifier, issuer, _) = verifier_with(
            LivenessParams::default(),
            FixedAnalyzer(0.95),
            FixedMatcher(Some(candidate(42, 0.92))),
        );
        let now = Timestamp::new(1000);
        let c = issuer.issue(&tenant(), now).unwrap();

        let err = verifier
            .verify(&c.token, frames(), &tenant(), Some(IdentityRef(7)), now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::NoFaceMatch));
    }

    #[tokio::test]
    async fn stalled_capability_times_out_distinctly() {
        let params = LivenessParams {
            verify_timeout_secs: 0,
            ..LivenessParams::default()
        };
        let (verifier, issuer, audit) = verifier_with(
            params,
            StalledAnalyzer,
            FixedMatcher(Some(candidate(42, 0.92))),
        );
        let now = Timestamp::new(1000);
        let c = issuer.issue(&tenant(), now).unwrap();

        let err = verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::VerificationTimeout { .. }));

        // The timeout happened after consumption — the challenge stays burned.
        let err = verifier
            .verify(&c.token, frames(), &tenant(), None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::ChallengeAlreadyConsumed));

        let events = audit.0.lock().unwrap();
        assert_eq!(events[0].outcome, "verification_timeout");
    }

    #[tokio::test]
    async fn lifecycle_rejections_are_not_audited() {
        let (verifier, _, audit) = verifier_with(
            LivenessParams::default(),
            FixedAnalyzer(0.95),
            FixedMatcher(Some(candidate(42, 0.92))),
        );
        let err = verifier
            .verify(
                &ChallengeToken::generate(),
                frames(),
                &tenant(),
                None,
                Timestamp::new(1000),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::ChallengeNotFound));
        assert!(audit.0.lock().unwrap().is_empty());
    }
}
