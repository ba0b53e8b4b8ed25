//! Deposit claim domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// How the external funds are claimed to arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FundingMethod {
    /// Manual bank-transfer claim, settled by an administrator
    BankTransfer,
    /// Payment-gateway checkout, settled by a verified webhook
    Gateway,
}

impl FundingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingMethod::BankTransfer => "bank-transfer",
            FundingMethod::Gateway => "gateway",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "bank-transfer" => Ok(FundingMethod::BankTransfer),
            "gateway" => Ok(FundingMethod::Gateway),
            other => Err(Error::validation(format!("unknown funding method: {other}"))),
        }
    }
}

/// Lifecycle status of a deposit claim
///
/// The balance is credited if and only if the status transitions
/// `Pending -> Completed`, and that transition happens at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Completed,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "completed" => Ok(ClaimStatus::Completed),
            other => Err(Error::validation(format!("unknown claim status: {other}"))),
        }
    }
}

/// A pending external-funding request awaiting settlement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositClaim {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub method: FundingMethod,
    /// Free-text comment or correlation token supplied by the claimant
    pub comment: Option<String>,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
}

impl DepositClaim {
    /// Create a new pending claim
    pub fn new(
        account_id: Uuid,
        amount: Decimal,
        method: FundingMethod,
        comment: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            method,
            comment,
            status: ClaimStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
