//! Transfer record domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// What kind of value movement a transfer record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Ordinary peer-to-peer movement: debit sender, credit receiver
    Transfer,
    /// Administrative credit: only the destination is credited
    AdminGrant,
    /// Reversal synthesized by cancellation, never requested directly
    Refund,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Transfer => "transfer",
            TransferKind::AdminGrant => "admin_grant",
            TransferKind::Refund => "refund",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "transfer" => Ok(TransferKind::Transfer),
            "admin_grant" => Ok(TransferKind::AdminGrant),
            "refund" => Ok(TransferKind::Refund),
            other => Err(Error::validation(format!("unknown transfer kind: {other}"))),
        }
    }
}

/// Lifecycle status of a transfer record
///
/// The only permitted transition is `Completed -> Cancelled`, exactly once,
/// and only while synthesizing the paired refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "completed" => Ok(TransferStatus::Completed),
            "cancelled" => Ok(TransferStatus::Cancelled),
            other => Err(Error::validation(format!(
                "unknown transfer status: {other}"
            ))),
        }
    }
}

/// An immutable ledger entry describing one value movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    /// Strictly positive, at most 2 fractional digits
    pub amount: Decimal,
    pub kind: TransferKind,
    pub status: TransferStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set only on refunds: the record this one reverses
    pub original_transfer_id: Option<Uuid>,
}

impl TransferRecord {
    /// Create a new completed transfer record
    pub fn new(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Decimal,
        kind: TransferKind,
        description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_account_id,
            to_account_id,
            amount,
            kind,
            status: TransferStatus::Completed,
            description,
            created_at: Utc::now(),
            original_transfer_id: None,
        }
    }

    /// Synthesize the refund record reversing this transfer
    ///
    /// The account pair is swapped and the amount carried over unchanged;
    /// the refund references this record's id.
    pub fn reversal(&self) -> TransferRecord {
        TransferRecord {
            id: Uuid::new_v4(),
            from_account_id: self.to_account_id,
            to_account_id: self.from_account_id,
            amount: self.amount,
            kind: TransferKind::Refund,
            status: TransferStatus::Completed,
            description: Some(format!("Refund for transfer {}", self.id)),
            created_at: Utc::now(),
            original_transfer_id: Some(self.id),
        }
    }
}

/// Validate a monetary amount: strictly positive, at most 2 fractional digits
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > 2 {
        return Err(Error::InvalidAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_reversal_swaps_accounts_and_links_original() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let original = TransferRecord::new(
            from,
            to,
            Decimal::new(4000, 2),
            TransferKind::Transfer,
            None,
        );

        let refund = original.reversal();
        assert_eq!(refund.from_account_id, to);
        assert_eq!(refund.to_account_id, from);
        assert_eq!(refund.amount, original.amount);
        assert_eq!(refund.kind, TransferKind::Refund);
        assert_eq!(refund.status, TransferStatus::Completed);
        assert_eq!(refund.original_transfer_id, Some(original.id));
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Decimal::new(1, 2)).is_ok()); // 0.01
        assert!(validate_amount(Decimal::new(4000, 2)).is_ok()); // 40.00
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::new(-100, 2)).is_err());
        // 3 fractional digits
        assert!(validate_amount(Decimal::from_str("1.005").unwrap()).is_err());
        // trailing zeros beyond 2 digits normalize away
        assert!(validate_amount(Decimal::from_str("1.500").unwrap()).is_ok());
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            TransferKind::Transfer,
            TransferKind::AdminGrant,
            TransferKind::Refund,
        ] {
            assert_eq!(TransferKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(TransferKind::parse("cashback").is_err());
    }
}
