//! Fundamental types for the FaceGate liveness platform.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: challenge tokens, the liveness action vocabulary, tenant
//! contexts, timestamps, captured frames, and tunable protocol parameters.

pub mod action;
pub mod frame;
pub mod params;
pub mod tenant;
pub mod time;
pub mod token;

pub use action::LivenessAction;
pub use frame::{CapturedFrame, FramePair};
pub use params::LivenessParams;
pub use tenant::TenantContext;
pub use time::Timestamp;
pub use token::ChallengeToken;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a matched identity in the external identity store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityRef(pub i64);

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid:{}", self.0)
    }
}
