//! Tunable liveness protocol parameters.
//!
//! Defaults mirror the deployed service: a 15-second challenge TTL (long
//! enough to read the instruction and react, short enough to bound replay
//! exposure), a 3-tick capture countdown, and a 0.45 match threshold.
//! None of the literals are load-bearing security parameters; every field
//! is configuration.

use serde::{Deserialize, Serialize};

/// Parameters shared by the issuer, verifier, and capture driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LivenessParams {
    /// Challenge time-to-live in seconds.
    #[serde(default = "default_challenge_ttl_secs")]
    pub challenge_ttl_secs: u64,

    /// Countdown ticks before each automatic frame capture.
    #[serde(default = "default_countdown_ticks")]
    pub countdown_ticks: u32,

    /// Minimum action-detection confidence to accept the instructed action.
    #[serde(default = "default_action_threshold")]
    pub action_threshold: f64,

    /// Minimum identity-match confidence to accept a match.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Upper bound in seconds on each external capability call during
    /// verification.
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_challenge_ttl_secs() -> u64 {
    15
}

fn default_countdown_ticks() -> u32 {
    3
}

fn default_action_threshold() -> f64 {
    0.5
}

fn default_match_threshold() -> f64 {
    0.45
}

fn default_verify_timeout_secs() -> u64 {
    10
}

impl Default for LivenessParams {
    fn default() -> Self {
        Self {
            challenge_ttl_secs: default_challenge_ttl_secs(),
            countdown_ticks: default_countdown_ticks(),
            action_threshold: default_action_threshold(),
            match_threshold: default_match_threshold(),
            verify_timeout_secs: default_verify_timeout_secs(),
        }
    }
}
