//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and repository interactions. Each
//! service focuses on a specific use case or feature area.

mod account;
mod deposit;
mod gateway;
mod ledger;
pub mod logging;
pub mod migration;

pub use account::AccountService;
pub use deposit::DepositService;
pub use gateway::{GatewayBridge, WebhookNotification};
pub use ledger::LedgerService;
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
