//! Payline Core - Business logic for the peer-to-peer balance ledger
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, TransferRecord, DepositClaim)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::{AccountService, DepositService, GatewayBridge, LedgerService};

// Re-export commonly used types at crate root
pub use config::GatewaySettings;
pub use domain::result::{Error, Result};
pub use domain::{
    Account, Caller, ClaimStatus, DepositClaim, FundingMethod, Role, TransferKind, TransferRecord,
    TransferStatus,
};
pub use services::WebhookNotification;

/// Main context for Payline operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct PaylineContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub account_service: AccountService,
    pub ledger_service: LedgerService,
    pub deposit_service: Arc<DepositService>,
    pub gateway: GatewayBridge,
}

impl PaylineContext {
    /// Create a new Payline context
    pub fn new(payline_dir: &Path) -> Result<Self> {
        let config = Config::load(payline_dir)?;

        let db_path = payline_dir.join("payline.duckdb");
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);

        // Initialize schema
        repository.ensure_schema()?;

        let account_service = AccountService::new(Arc::clone(&repository));
        let ledger_service = LedgerService::new(Arc::clone(&repository));
        let deposit_service = Arc::new(DepositService::new(Arc::clone(&repository)));
        let gateway = GatewayBridge::new(Arc::clone(&deposit_service), config.gateway.clone());

        Ok(Self {
            config,
            repository,
            account_service,
            ledger_service,
            deposit_service,
            gateway,
        })
    }
}
