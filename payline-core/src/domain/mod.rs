//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod caller;
mod deposit;
mod transfer;
pub mod result;

pub use account::Account;
pub use caller::{Caller, Role};
pub use deposit::{ClaimStatus, DepositClaim, FundingMethod};
pub use transfer::{validate_amount, TransferKind, TransferRecord, TransferStatus};
