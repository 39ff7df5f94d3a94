//! Administrator identity and the admin-only guard.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Holds the single administrator fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    admin: String,
}

impl AccessControl {
    pub fn new(admin: impl Into<String>) -> Self {
        Self {
            admin: admin.into(),
        }
    }

    /// The administrator's identity.
    pub fn admin(&self) -> &str {
        &self.admin
    }

    pub fn is_admin(&self, caller: &str) -> bool {
        self.admin == caller
    }

    /// Fail with [`Error::Unauthorized`] unless `caller` is the administrator.
    pub fn require_admin(&self, caller: &str) -> Result<()> {
        if self.is_admin(caller) {
            return Ok(());
        }

        warn!(caller, "rejected admin-only operation");
        Err(Error::Unauthorized(caller.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_guard() {
        let access = AccessControl::new("0xadmin");
        assert!(access.is_admin("0xadmin"));
        assert!(access.require_admin("0xadmin").is_ok());
        assert_eq!(access.admin(), "0xadmin");
    }

    #[test]
    fn others_are_rejected() {
        let access = AccessControl::new("0xadmin");
        assert!(!access.is_admin("0xmallory"));
        assert_eq!(
            access.require_admin("0xmallory"),
            Err(Error::Unauthorized("0xmallory".to_string()))
        );
    }

    #[test]
    fn comparison_is_exact() {
        let access = AccessControl::new("0xAdmin");
        assert!(!access.is_admin("0xadmin"));
        assert!(!access.is_admin("0xAdmin "));
    }
}
