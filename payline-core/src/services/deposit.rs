//! Deposit service - external funding claims and settlement
//!
//! A claim never moves money when it is filed. Funds land when the claim
//! settles, either manually by an admin or through a verified gateway
//! webhook, and that settlement credits the account exactly once.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{validate_amount, Caller, DepositClaim, FundingMethod};

/// Service managing deposit claims
pub struct DepositService {
    repository: Arc<DuckDbRepository>,
}

impl DepositService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// File a new pending claim against an account
    pub fn file_claim(
        &self,
        caller: &Caller,
        account_id: Uuid,
        amount: Decimal,
        method: FundingMethod,
        comment: Option<String>,
    ) -> Result<DepositClaim> {
        caller.require_self_or_admin(account_id, "deposit claim")?;
        validate_amount(amount)?;
        if self.repository.get_account(account_id)?.is_none() {
            return Err(Error::AccountNotFound(account_id));
        }

        let claim = DepositClaim::new(account_id, amount, method, comment);
        self.repository.insert_claim(&claim)?;
        Ok(claim)
    }

    pub fn get_claim(&self, claim_id: Uuid) -> Result<DepositClaim> {
        self.repository
            .get_claim(claim_id)?
            .ok_or(Error::ClaimNotFound(claim_id))
    }

    /// Manually settle a pending claim, admin only
    pub fn settle_claim(&self, caller: &Caller, claim_id: Uuid) -> Result<(DepositClaim, Decimal)> {
        caller.require_admin("manual settlement")?;
        self.settle(claim_id)
    }

    /// Settle a pending claim without an authorization gate
    ///
    /// Used by the gateway bridge after a webhook signature has been
    /// verified. Idempotent: a second settlement attempt fails with
    /// `AlreadySettled` and credits nothing.
    pub fn settle(&self, claim_id: Uuid) -> Result<(DepositClaim, Decimal)> {
        self.repository.settle_claim(claim_id)
    }

    /// Every claim in the system, admin only
    pub fn list_claims(&self, caller: &Caller) -> Result<Vec<DepositClaim>> {
        caller.require_admin("claim listing")?;
        self.repository.list_claims()
    }

    /// Claims filed against one account; owner or admin
    pub fn claims_for_account(
        &self,
        caller: &Caller,
        account_id: Uuid,
    ) -> Result<Vec<DepositClaim>> {
        caller.require_self_or_admin(account_id, "claim listing")?;
        self.repository.claims_for_account(account_id)
    }
}
