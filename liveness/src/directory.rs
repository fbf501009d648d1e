//! Config-backed tenant directory.
//!
//! Production deployments point this at the org's branch/device table from
//! the service config; directory *management* (enrolling branches and
//! devices) belongs to the platform's admin surface, not this core.

use std::collections::HashMap;

use async_trait::async_trait;
use facegate_types::TenantContext;
use serde::{Deserialize, Serialize};

use crate::capability::TenantDirectory;
use crate::error::DirectoryError;

/// One branch and its registered devices, as configured.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BranchEntry {
    pub code: String,
    pub id: i64,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// A device registered under a branch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub code: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// An in-memory `TenantDirectory` built from config entries.
pub struct StaticDirectory {
    branches: HashMap<String, Branch>,
}

struct Branch {
    id: i64,
    devices: HashMap<String, bool>,
}

impl StaticDirectory {
    pub fn new(entries: &[BranchEntry]) -> Self {
        let branches = entries
            .iter()
            .map(|entry| {
                let devices = entry
                    .devices
                    .iter()
                    .map(|d| (d.code.clone(), d.active))
                    .collect();
                (
                    entry.code.clone(),
                    Branch {
                        id: entry.id,
                        devices,
                    },
                )
            })
            .collect();
        Self { branches }
    }
}

#[async_trait]
impl TenantDirectory for StaticDirectory {
    async fn resolve(
        &self,
        org_id: &str,
        branch_code: &str,
        device_code: &str,
    ) -> Result<TenantContext, DirectoryError> {
        if org_id.is_empty() {
            return Err(DirectoryError::MissingHeader("X-Org-Id"));
        }
        if branch_code.is_empty() {
            return Err(DirectoryError::MissingHeader("X-Branch-Code"));
        }
        if device_code.is_empty() {
            return Err(DirectoryError::MissingHeader("X-Device-Code"));
        }
        let branch = self
            .branches
            .get(branch_code)
            .ok_or_else(|| DirectoryError::UnknownBranch(branch_code.to_string()))?;
        match branch.devices.get(device_code) {
            None => Err(DirectoryError::DeviceNotRegistered(device_code.to_string())),
            Some(false) => Err(DirectoryError::DeviceInactive(device_code.to_string())),
            Some(true) => Ok(TenantContext::new(org_id, branch.id, device_code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaticDirectory {
        StaticDirectory::new(&[BranchEntry {
            code: "BR-MAIN".into(),
            id: 7,
            devices: vec![
                DeviceEntry {
                    code: "kiosk-1".into(),
                    active: true,
                },
                DeviceEntry {
                    code: "kiosk-2".into(),
                    active: false,
                },
            ],
        }])
    }

    #[tokio::test]
    async fn resolves_a_registered_active_device() {
        let ctx = directory()
            .resolve("acme", "BR-MAIN", "kiosk-1")
            .await
            .unwrap();
        assert_eq!(ctx, TenantContext::new("acme", 7, "kiosk-1"));
    }

    #[tokio::test]
    async fn rejects_missing_headers_unknown_branches_and_bad_devices() {
        let dir = directory();
        assert!(matches!(
            dir.resolve("", "BR-MAIN", "kiosk-1").await.unwrap_err(),
            DirectoryError::MissingHeader("X-Org-Id")
        ));
        assert!(matches!(
            dir.resolve("acme", "BR-NOPE", "kiosk-1").await.unwrap_err(),
            DirectoryError::UnknownBranch(_)
        ));
        assert!(matches!(
            dir.resolve("acme", "BR-MAIN", "kiosk-9").await.unwrap_err(),
            DirectoryError::DeviceNotRegistered(_)
        ));
        assert!(matches!(
            dir.resolve("acme", "BR-MAIN", "kiosk-2").await.unwrap_err(),
            DirectoryError::DeviceInactive(_)
        ));
    }
}
