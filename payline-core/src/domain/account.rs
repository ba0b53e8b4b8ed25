//! Account domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A balance-holding account
///
/// The balance is owned exclusively by the repository's atomic adjustment;
/// nothing outside the ledger and deposit paths may write it. Policy keeps
/// balances non-negative but the store does not clamp them: unconditional
/// refunds can legitimately drive a balance below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Display name of the account holder
    pub name: String,
    /// Administrative accounts may grant funds, cancel transfers, and
    /// settle deposit claims manually
    pub is_admin: bool,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            is_admin: false,
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the account as administrative
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_starts_empty() {
        let account = Account::new(Uuid::new_v4(), "Alice");
        assert_eq!(account.balance, Decimal::ZERO);
        assert!(!account.is_admin);
    }

    #[test]
    fn test_account_validation() {
        let mut account = Account::new(Uuid::new_v4(), "Alice");
        assert!(account.validate().is_ok());

        account.name = "  ".to_string();
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_admin_builder() {
        let account = Account::new(Uuid::new_v4(), "Ops").admin();
        assert!(account.is_admin);
    }
}
