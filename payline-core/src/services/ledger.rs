//! Ledger service - transfer recording and cancellation
//!
//! The ledger is permissive about solvency: it records any well-formed,
//! authorized movement and lets balances go where the arithmetic takes
//! them. Callers that want an overdraft check perform it before asking
//! the ledger to record.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{validate_amount, Caller, TransferKind, TransferRecord, TransferStatus};

/// Service recording value movements between accounts
pub struct LedgerService {
    repository: Arc<DuckDbRepository>,
}

impl LedgerService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Record a transfer between two accounts
    ///
    /// Ordinary transfers debit the sender and credit the receiver; admin
    /// grants credit the receiver only. Refund records cannot be requested
    /// directly, they exist only as the product of a cancellation.
    pub fn record_transfer(
        &self,
        caller: &Caller,
        from: Uuid,
        to: Uuid,
        amount: Decimal,
        kind: TransferKind,
        description: Option<String>,
    ) -> Result<TransferRecord> {
        validate_amount(amount)?;
        if from == to {
            return Err(Error::validation("cannot transfer to the same account"));
        }

        match kind {
            TransferKind::Transfer => {
                caller.require_self_or_admin(from, "transfer")?;
            }
            TransferKind::AdminGrant => {
                caller.require_admin("admin grant")?;
            }
            TransferKind::Refund => {
                return Err(Error::validation(
                    "refunds are created by cancellation, not recorded directly",
                ));
            }
        }

        // Both endpoints must exist even when only one side is adjusted
        if self.repository.get_account(from)?.is_none() {
            return Err(Error::AccountNotFound(from));
        }
        if self.repository.get_account(to)?.is_none() {
            return Err(Error::AccountNotFound(to));
        }

        let record = TransferRecord::new(from, to, amount, kind, description);
        let adjustments = movement_for(&record);
        self.repository.record_transfer(&record, &adjustments)?;
        Ok(record)
    }

    /// Cancel a completed transfer, synthesizing the compensating refund
    ///
    /// Admin only. The original flips to cancelled and the refund moves
    /// the money back in the same database transaction. The refund is
    /// unconditional: it applies even if it drives a balance negative.
    pub fn cancel_transfer(
        &self,
        caller: &Caller,
        transfer_id: Uuid,
    ) -> Result<(TransferRecord, TransferRecord)> {
        caller.require_admin("cancellation")?;

        let original = self
            .repository
            .get_transfer(transfer_id)?
            .ok_or(Error::TransferNotFound(transfer_id))?;

        if original.kind == TransferKind::Refund {
            return Err(Error::validation("refunds cannot be cancelled"));
        }
        if original.status == TransferStatus::Cancelled {
            return Err(Error::AlreadyCancelled(transfer_id));
        }

        let refund = original.reversal();
        let adjustments = reversal_for(&original);
        self.repository
            .apply_cancellation(original.id, &refund, &adjustments)?;

        let cancelled = TransferRecord {
            status: TransferStatus::Cancelled,
            ..original
        };
        Ok((cancelled, refund))
    }

    pub fn get_transfer(&self, transfer_id: Uuid) -> Result<TransferRecord> {
        self.repository
            .get_transfer(transfer_id)?
            .ok_or(Error::TransferNotFound(transfer_id))
    }

    /// Transfers touching an account, newest first; owner or admin
    pub fn history(&self, caller: &Caller, account_id: Uuid) -> Result<Vec<TransferRecord>> {
        caller.require_self_or_admin(account_id, "history")?;
        self.repository.transfers_for_account(account_id)
    }

    /// Every transfer in the ledger, admin only
    pub fn all_transfers(&self, caller: &Caller) -> Result<Vec<TransferRecord>> {
        caller.require_admin("ledger listing")?;
        self.repository.all_transfers()
    }
}

/// Balance deltas a transfer applies when recorded
fn movement_for(record: &TransferRecord) -> Vec<(Uuid, Decimal)> {
    match record.kind {
        TransferKind::Transfer => vec![
            (record.from_account_id, -record.amount),
            (record.to_account_id, record.amount),
        ],
        // grants mint into the receiver, the admin side is not debited
        TransferKind::AdminGrant => vec![(record.to_account_id, record.amount)],
        TransferKind::Refund => vec![
            (record.from_account_id, -record.amount),
            (record.to_account_id, record.amount),
        ],
    }
}

/// Balance deltas that undo an original transfer
fn reversal_for(original: &TransferRecord) -> Vec<(Uuid, Decimal)> {
    match original.kind {
        TransferKind::Transfer | TransferKind::Refund => vec![
            (original.to_account_id, -original.amount),
            (original.from_account_id, original.amount),
        ],
        // undoing a grant burns from the grantee only
        TransferKind::AdminGrant => vec![(original.to_account_id, -original.amount)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Account;

    fn setup() -> (Arc<DuckDbRepository>, LedgerService) {
        let repo = Arc::new(DuckDbRepository::open_in_memory().unwrap());
        repo.ensure_schema().unwrap();
        let service = LedgerService::new(repo.clone());
        (repo, service)
    }

    fn seeded(repo: &DuckDbRepository, name: &str, balance: Decimal) -> Account {
        let mut account = Account::new(Uuid::new_v4(), name);
        account.balance = balance;
        repo.create_account(&account).unwrap();
        account
    }

    #[test]
    fn test_transfer_debits_and_credits() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let caller = Caller::member(alice.id);
        ledger
            .record_transfer(
                &caller,
                alice.id,
                bob.id,
                Decimal::new(4000, 2),
                TransferKind::Transfer,
                Some("lunch".to_string()),
            )
            .unwrap();

        assert_eq!(repo.get_balance(alice.id).unwrap(), Decimal::new(6000, 2));
        assert_eq!(repo.get_balance(bob.id).unwrap(), Decimal::new(4000, 2));
    }

    #[test]
    fn test_member_cannot_spend_someone_elses_funds() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let caller = Caller::member(bob.id);
        let err = ledger
            .record_transfer(
                &caller,
                alice.id,
                bob.id,
                Decimal::new(4000, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert_eq!(repo.get_balance(alice.id).unwrap(), Decimal::new(10000, 2));
    }

    #[test]
    fn test_grant_requires_admin_and_credits_only() {
        let (repo, ledger) = setup();
        let treasury = seeded(&repo, "Treasury", Decimal::ZERO);
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let member = Caller::member(treasury.id);
        assert!(ledger
            .record_transfer(
                &member,
                treasury.id,
                bob.id,
                Decimal::new(2500, 2),
                TransferKind::AdminGrant,
                None,
            )
            .is_err());

        let admin = Caller::admin(treasury.id);
        ledger
            .record_transfer(
                &admin,
                treasury.id,
                bob.id,
                Decimal::new(2500, 2),
                TransferKind::AdminGrant,
                None,
            )
            .unwrap();

        // the granting side is untouched
        assert_eq!(repo.get_balance(treasury.id).unwrap(), Decimal::ZERO);
        assert_eq!(repo.get_balance(bob.id).unwrap(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_refund_kind_cannot_be_recorded_directly() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let admin = Caller::admin(alice.id);
        let err = ledger
            .record_transfer(
                &admin,
                alice.id,
                bob.id,
                Decimal::new(100, 2),
                TransferKind::Refund,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_cancel_restores_balances() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let caller = Caller::member(alice.id);
        let record = ledger
            .record_transfer(
                &caller,
                alice.id,
                bob.id,
                Decimal::new(4000, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap();

        let admin = Caller::admin(Uuid::new_v4());
        let (cancelled, refund) = ledger.cancel_transfer(&admin, record.id).unwrap();

        assert_eq!(cancelled.status, TransferStatus::Cancelled);
        assert_eq!(refund.kind, TransferKind::Refund);
        assert_eq!(refund.original_transfer_id, Some(record.id));
        assert_eq!(
            refund.description.as_deref(),
            Some(format!("Refund for transfer {}", record.id).as_str())
        );

        assert_eq!(repo.get_balance(alice.id).unwrap(), Decimal::new(10000, 2));
        assert_eq!(repo.get_balance(bob.id).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_cancel_twice_fails() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let record = ledger
            .record_transfer(
                &Caller::member(alice.id),
                alice.id,
                bob.id,
                Decimal::new(4000, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap();

        let admin = Caller::admin(Uuid::new_v4());
        ledger.cancel_transfer(&admin, record.id).unwrap();
        let err = ledger.cancel_transfer(&admin, record.id).unwrap_err();
        assert!(matches!(err, Error::AlreadyCancelled(_)));
    }

    #[test]
    fn test_cancel_requires_admin() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let record = ledger
            .record_transfer(
                &Caller::member(alice.id),
                alice.id,
                bob.id,
                Decimal::new(4000, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap();

        let err = ledger
            .cancel_transfer(&Caller::member(alice.id), record.id)
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn test_refund_of_refund_is_rejected() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let record = ledger
            .record_transfer(
                &Caller::member(alice.id),
                alice.id,
                bob.id,
                Decimal::new(4000, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap();

        let admin = Caller::admin(Uuid::new_v4());
        let (_, refund) = ledger.cancel_transfer(&admin, record.id).unwrap();

        let err = ledger.cancel_transfer(&admin, refund.id).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_cancelled_grant_debits_grantee_only() {
        let (repo, ledger) = setup();
        let treasury = seeded(&repo, "Treasury", Decimal::ZERO);
        let bob = seeded(&repo, "Bob", Decimal::ZERO);

        let admin = Caller::admin(treasury.id);
        let grant = ledger
            .record_transfer(
                &admin,
                treasury.id,
                bob.id,
                Decimal::new(2500, 2),
                TransferKind::AdminGrant,
                None,
            )
            .unwrap();

        ledger.cancel_transfer(&admin, grant.id).unwrap();
        assert_eq!(repo.get_balance(bob.id).unwrap(), Decimal::ZERO);
        assert_eq!(repo.get_balance(treasury.id).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_refund_may_drive_balance_negative() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::ZERO);
        let carol = seeded(&repo, "Carol", Decimal::ZERO);

        let record = ledger
            .record_transfer(
                &Caller::member(alice.id),
                alice.id,
                bob.id,
                Decimal::new(10000, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap();

        // Bob spends the money before the cancellation lands
        ledger
            .record_transfer(
                &Caller::member(bob.id),
                bob.id,
                carol.id,
                Decimal::new(10000, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap();

        let admin = Caller::admin(Uuid::new_v4());
        ledger.cancel_transfer(&admin, record.id).unwrap();

        assert_eq!(repo.get_balance(bob.id).unwrap(), Decimal::new(-10000, 2));
        assert_eq!(repo.get_balance(alice.id).unwrap(), Decimal::new(10000, 2));
    }

    #[test]
    fn test_history_shows_both_directions() {
        let (repo, ledger) = setup();
        let alice = seeded(&repo, "Alice", Decimal::new(10000, 2));
        let bob = seeded(&repo, "Bob", Decimal::new(10000, 2));

        ledger
            .record_transfer(
                &Caller::member(alice.id),
                alice.id,
                bob.id,
                Decimal::new(100, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap();
        ledger
            .record_transfer(
                &Caller::member(bob.id),
                bob.id,
                alice.id,
                Decimal::new(200, 2),
                TransferKind::Transfer,
                None,
            )
            .unwrap();

        let history = ledger.history(&Caller::member(alice.id), alice.id).unwrap();
        assert_eq!(history.len(), 2);
        // newest first
        assert_eq!(history[0].amount, Decimal::new(200, 2));

        assert!(ledger
            .history(&Caller::member(bob.id), alice.id)
            .is_err());
    }
}
