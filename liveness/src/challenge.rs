//! Challenge issuance and the single-use challenge store.
//!
//! The store is the platform's replay defence. Issuance registers a
//! challenge under an unguessable token; verification *claims* it — one
//! atomic check-and-set under the store lock that validates lifecycle,
//! tenant binding, and the frame window, then burns the challenge. A
//! claimed challenge never validates again, and concurrent claims of the
//! same token produce exactly one winner.

use std::collections::HashMap;
use std::sync::Mutex;

use facegate_types::{
    ChallengeToken, FramePair, LivenessAction, LivenessParams, TenantContext, Timestamp,
};
use rand::Rng;
use serde::Serialize;

use crate::error::{IssueError, VerifyError};

/// An outstanding liveness challenge.
#[derive(Clone, Debug, Serialize)]
pub struct Challenge {
    pub token: ChallengeToken,
    pub action: LivenessAction,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    /// The tenant context the challenge was issued under. No challenge is
    /// ever valid outside it.
    pub tenant: TenantContext,
    /// Set exactly once, on the first verification attempt that passes
    /// lifecycle validation.
    pub consumed: bool,
}

impl Challenge {
    /// Seconds of validity remaining relative to `now`.
    pub fn expires_in(&self, now: Timestamp) -> u64 {
        self.expires_at.as_secs().saturating_sub(now.as_secs())
    }
}

struct IssuerState {
    by_token: HashMap<ChallengeToken, Challenge>,
    /// The single outstanding challenge per tenant context. Issuing a new
    /// challenge supersedes the tenant's prior one.
    active: HashMap<String, ChallengeToken>,
}

/// Generates and tracks liveness challenges.
pub struct ChallengeIssuer {
    params: LivenessParams,
    inner: Mutex<IssuerState>,
}

impl ChallengeIssuer {
    pub fn new(params: LivenessParams) -> Self {
        Self {
            params,
            inner: Mutex::new(IssuerState {
                by_token: HashMap::new(),
                active: HashMap::new(),
            }),
        }
    }

    pub fn params(&self) -> &LivenessParams {
        &self.params
    }

    /// Issue a fresh challenge for `tenant`, superseding any outstanding
    /// unconsumed challenge the tenant already holds.
    pub fn issue(&self, tenant: &TenantContext, now: Timestamp) -> Result<Challenge, IssueError> {
        if !tenant.is_wellformed() {
            return Err(IssueError::InvalidContext(tenant.to_string()));
        }

        let action = LivenessAction::ALL[rand::thread_rng().gen_range(0..LivenessAction::ALL.len())];
        let challenge = Challenge {
            token: ChallengeToken::generate(),
            action,
            issued_at: now,
            expires_at: now.plus_secs(self.params.challenge_ttl_secs),
            tenant: tenant.clone(),
            consumed: false,
        };

        let mut state = self.lock();
        if let Some(old) = state.active.insert(tenant.key(), challenge.token) {
            state.by_token.remove(&old);
            tracing::debug!(tenant = %tenant, "superseded outstanding challenge");
        }
        state.by_token.insert(challenge.token, challenge.clone());
        tracing::debug!(
            tenant = %tenant,
            challenge = %challenge.token,
            action = %challenge.action,
            expires_in = challenge.expires_in(now),
            "challenge issued"
        );
        Ok(challenge)
    }

    /// Claim a challenge for one verification attempt.
    ///
    /// Runs the lifecycle checks in order — unknown token, expiry, replay,
    /// tenant binding, frame window — and on success marks the challenge
    /// consumed before returning it. The whole sequence holds the store
    /// lock, so concurrent claims of one token serialize: exactly one
    /// caller observes `consumed == false`, every other gets
    /// `ChallengeAlreadyConsumed`.
    pub fn claim(
        &self,
        token: &ChallengeToken,
        tenant: &TenantContext,
        frames: &FramePair,
        now: Timestamp,
    ) -> Result<Challenge, VerifyError> {
        let mut state = self.lock();

        let challenge = state
            .by_token
            .get(token)
            .ok_or(VerifyError::ChallengeNotFound)?;

        if challenge.expires_at.is_past(now) {
            let key = challenge.tenant.key();
            state.by_token.remove(token);
            if state.active.get(&key).is_some_and(|t| t == token) {
                state.active.remove(&key);
            }
            return Err(VerifyError::ChallengeExpired);
        }
        if challenge.consumed {
            return Err(VerifyError::ChallengeAlreadyConsumed);
        }
        if challenge.tenant != *tenant {
            return Err(VerifyError::TenantMismatch);
        }
        if let Err(reason) = frame_window_check(challenge, frames) {
            return Err(VerifyError::FrameOutOfWindow(reason));
        }

        let key = challenge.tenant.key();
        let claimed = match state.by_token.get_mut(token) {
            Some(c) => {
                c.consumed = true;
                c.clone()
            }
            // Unreachable: the lock is held since the lookup above.
            None => return Err(VerifyError::ChallengeNotFound),
        };
        if state.active.get(&key).is_some_and(|t| t == token) {
            state.active.remove(&key);
        }
        tracing::debug!(challenge = %token, "challenge consumed");
        Ok(claimed)
    }

    /// Drop expired challenges from the store. Purely an optimization —
    /// expiry is re-checked on every claim — so running it is optional.
    pub fn purge_expired(&self, now: Timestamp) -> usize {
        let mut state = self.lock();
        let expired: Vec<(ChallengeToken, String)> = state
            .by_token
            .iter()
            .filter(|(_, c)| c.expires_at.is_past(now))
            .map(|(t, c)| (*t, c.tenant.key()))
            .collect();
        for (token, key) in &expired {
            state.by_token.remove(token);
            if state.active.get(key).is_some_and(|t| t == token) {
                state.active.remove(key);
            }
        }
        if !expired.is_empty() {
            tracing::debug!(purged = expired.len(), "expired challenges purged");
        }
        expired.len()
    }

    /// Number of challenges currently tracked (consumed ones linger until
    /// they expire, so replays keep answering `ChallengeAlreadyConsumed`).
    pub fn tracked(&self) -> usize {
        self.lock().by_token.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IssuerState> {
        self.inner.lock().expect("challenge store lock poisoned")
    }
}

/// Frame timestamps must be ordered and lie inside the challenge window.
/// Second-granularity deadlines are inclusive on both ends, consistent
/// with the expiry check.
fn frame_window_check(challenge: &Challenge, frames: &FramePair) -> Result<(), String> {
    if !frames.is_ordered() {
        return Err("frame A captured after frame B".into());
    }
    if frames.frame_a.captured_at_ms < challenge.issued_at.as_millis() {
        return Err("frame A predates challenge issuance".into());
    }
    if frames.frame_b.captured_at_ms >= challenge.expires_at.plus_secs(1).as_millis() {
        return Err("frame B postdates challenge expiry".into());
    }
    Ok(())
}
