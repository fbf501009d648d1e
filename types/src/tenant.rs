//! Tenant context — the (organization, branch, device) triple.
//!
//! Every challenge is stamped with the tenant context it was issued under,
//! and verification compares the request's context against the stamp.
//! Equality over all three fields is the isolation predicate: a challenge
//! issued to one device is worthless on any other device, branch, or org.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity of the caller requesting or verifying a challenge.
///
/// The branch id is the numeric id resolved from the branch code by the
/// tenant directory; the org id and device code are carried verbatim from
/// the request headers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext {
    pub org_id: String,
    pub branch_id: i64,
    pub device_code: String,
}

impl TenantContext {
    pub fn new(org_id: impl Into<String>, branch_id: i64, device_code: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            branch_id,
            device_code: device_code.into(),
        }
    }

    /// Whether this context carries usable values in every field.
    pub fn is_wellformed(&self) -> bool {
        !self.org_id.is_empty() && self.branch_id > 0 && !self.device_code.is_empty()
    }

    /// Stable key for per-tenant indexing.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.org_id, self.branch_id, self.device_code)
    }
}

impl fmt::Display for TenantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "org={} branch={} device={}",
            self.org_id, self.branch_id, self.device_code
        )
    }
}
