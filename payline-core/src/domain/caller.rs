//! Caller capability context
//!
//! Core operations never consult ambient request state. The authenticating
//! layer resolves the caller once and passes this context into every
//! operation that needs authorization; the core trusts it and does not
//! re-verify identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// Role granted to the authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

/// Authenticated caller identity and role
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Caller {
    pub account_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn member(account_id: Uuid) -> Self {
        Self {
            account_id,
            role: Role::Member,
        }
    }

    pub fn admin(account_id: Uuid) -> Self {
        Self {
            account_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require the admin role
    pub fn require_admin(&self, operation: &str) -> Result<()> {
        if !self.is_admin() {
            return Err(Error::unauthorized(format!(
                "{operation} requires an administrative caller"
            )));
        }
        Ok(())
    }

    /// Require that the caller acts on their own account, or is an admin
    pub fn require_self_or_admin(&self, account_id: Uuid, operation: &str) -> Result<()> {
        if self.account_id != account_id && !self.is_admin() {
            return Err(Error::unauthorized(format!(
                "{operation} is limited to the owning account"
            )));
        }
        Ok(())
    }
}
