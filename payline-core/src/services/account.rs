//! Account service - account lifecycle and balance queries

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{Account, Caller};

/// Service for opening accounts and reading balances
pub struct AccountService {
    repository: Arc<DuckDbRepository>,
}

impl AccountService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Open a new account with a zero balance
    pub fn open_account(&self, name: &str, is_admin: bool) -> Result<Account> {
        let mut account = Account::new(Uuid::new_v4(), name.trim());
        if is_admin {
            account = account.admin();
        }
        account.validate().map_err(Error::validation)?;
        self.repository.create_account(&account)?;
        Ok(account)
    }

    pub fn get_account(&self, id: Uuid) -> Result<Account> {
        self.repository
            .get_account(id)?
            .ok_or(Error::AccountNotFound(id))
    }

    /// Current balance, visible to the owner and to admins
    pub fn get_balance(&self, caller: &Caller, account_id: Uuid) -> Result<Decimal> {
        caller.require_self_or_admin(account_id, "balance query")?;
        self.repository.get_balance(account_id)
    }

    /// All accounts, admin only
    pub fn list_accounts(&self, caller: &Caller) -> Result<Vec<Account>> {
        caller.require_admin("account listing")?;
        self.repository.list_accounts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AccountService {
        let repo = Arc::new(DuckDbRepository::open_in_memory().unwrap());
        repo.ensure_schema().unwrap();
        AccountService::new(repo)
    }

    #[test]
    fn test_open_account() {
        let service = service();
        let account = service.open_account("Alice", false).unwrap();
        assert_eq!(account.balance, Decimal::ZERO);

        let loaded = service.get_account(account.id).unwrap();
        assert_eq!(loaded.name, "Alice");
    }

    #[test]
    fn test_open_account_rejects_blank_name() {
        let service = service();
        assert!(matches!(
            service.open_account("   ", false),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_balance_visibility() {
        let service = service();
        let account = service.open_account("Alice", false).unwrap();

        let owner = Caller::member(account.id);
        assert_eq!(
            service.get_balance(&owner, account.id).unwrap(),
            Decimal::ZERO
        );

        let stranger = Caller::member(Uuid::new_v4());
        assert!(matches!(
            service.get_balance(&stranger, account.id),
            Err(Error::Unauthorized(_))
        ));

        let admin = Caller::admin(Uuid::new_v4());
        assert!(service.get_balance(&admin, account.id).is_ok());
    }

    #[test]
    fn test_list_accounts_is_admin_only() {
        let service = service();
        service.open_account("Alice", false).unwrap();
        service.open_account("Bob", false).unwrap();

        let admin = Caller::admin(Uuid::new_v4());
        assert_eq!(service.list_accounts(&admin).unwrap().len(), 2);

        let member = Caller::member(Uuid::new_v4());
        assert!(service.list_accounts(&member).is_err());
    }
}
