//! Verification outcomes.

use facegate_types::{IdentityRef, TenantContext};
use serde::Serialize;

/// The single-shot result of one successful verification call.
#[derive(Clone, Debug, Serialize)]
pub struct VerificationResult {
    pub ok: bool,
    /// Present only when `ok` is true.
    pub matched_identity: Option<IdentityRef>,
    /// Combined confidence in `[0, 1]`.
    pub confidence: f64,
    /// Echoed from the challenge.
    pub tenant: TenantContext,
}

/// Combine action and match confidence into one score.
///
/// The combination is the minimum of the two: the overall claim "a live,
/// enrolled person performed the action" is only as strong as its weakest
/// leg. Minimum is monotone non-decreasing in both inputs.
pub fn combined_confidence(action_confidence: f64, match_confidence: f64) -> f64 {
    action_confidence.min(match_confidence)
}
