//! DuckDB repository implementation
//!
//! All balance movements go through this adapter so that the debit, the
//! credit, and the ledger row land in one database transaction. Monetary
//! values are stored as DECIMAL(18,2); they are written via CAST from
//! string parameters and read back through ::VARCHAR so no float ever
//! touches an amount.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, ClaimStatus, DepositClaim, FundingMethod, TransferKind, TransferRecord,
    TransferStatus,
};
use crate::services::MigrationService;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the ledger database at the given path
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when another process holds the database file.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[payline] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::Other(format!("Failed to open database after {MAX_RETRIES} retries"))
        }))
    }

    /// Open an in-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Disable extension autoloading to avoid macOS code signing issues
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<crate::services::MigrationResult> {
        let conn = self.conn.lock().unwrap();
        let migration_service = MigrationService::new(&conn);
        migration_service.run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // === Account operations ===

    pub fn create_account(&self, account: &Account) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO accounts (account_id, name, is_admin, balance, created_at, updated_at)
             VALUES (?, ?, ?, CAST(? AS DECIMAL(18,2)), ?, ?)",
            params![
                account.id.to_string(),
                account.name,
                account.is_admin,
                account.balance.to_string(),
                account.created_at.to_rfc3339(),
                account.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let account = conn.query_row(
            "SELECT account_id, name, is_admin, balance::VARCHAR,
                    created_at::VARCHAR, updated_at::VARCHAR
             FROM accounts WHERE account_id = ?",
            [id.to_string()],
            |row| Ok(row_to_account(row)),
        );
        optional_row(account)
    }

    /// Current balance of an account
    pub fn get_balance(&self, id: Uuid) -> Result<Decimal> {
        let conn = self.conn.lock().unwrap();
        let balance: std::result::Result<String, duckdb::Error> = conn.query_row(
            "SELECT balance::VARCHAR FROM accounts WHERE account_id = ?",
            [id.to_string()],
            |row| row.get(0),
        );
        match balance {
            Ok(s) => Ok(parse_decimal(&s)),
            Err(duckdb::Error::QueryReturnedNoRows) => Err(Error::AccountNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT account_id, name, is_admin, balance::VARCHAR,
                    created_at::VARCHAR, updated_at::VARCHAR
             FROM accounts ORDER BY created_at",
        )?;

        let accounts = stmt
            .query_map([], |row| Ok(row_to_account(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(accounts)
    }

    pub fn get_account_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Transfer operations ===

    /// Insert a transfer record and apply its balance adjustments atomically
    ///
    /// Each adjustment is a signed delta applied to one account. If any
    /// adjusted account does not exist the whole transaction rolls back
    /// and nothing is recorded.
    pub fn record_transfer(
        &self,
        record: &TransferRecord,
        adjustments: &[(Uuid, Decimal)],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        apply_adjustments(&tx, adjustments)?;
        insert_transfer_row(&tx, record)?;

        tx.commit()?;
        Ok(())
    }

    /// Cancel a transfer: flip the original to cancelled, insert the refund
    /// record, and apply the reversal adjustments, all in one transaction
    ///
    /// The status flip is a compare-and-set on `status = 'completed'` so a
    /// concurrent cancellation of the same transfer fails cleanly.
    pub fn apply_cancellation(
        &self,
        original_id: Uuid,
        refund: &TransferRecord,
        adjustments: &[(Uuid, Decimal)],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let flipped = tx.execute(
            "UPDATE transfers SET status = 'cancelled'
             WHERE transfer_id = ? AND status = 'completed'",
            params![original_id.to_string()],
        )?;
        if flipped == 0 {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM transfers WHERE transfer_id = ?",
                params![original_id.to_string()],
                |row| row.get(0),
            )?;
            // dropping the transaction rolls it back
            return if exists == 0 {
                Err(Error::TransferNotFound(original_id))
            } else {
                Err(Error::AlreadyCancelled(original_id))
            };
        }

        apply_adjustments(&tx, adjustments)?;
        insert_transfer_row(&tx, refund)?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_transfer(&self, id: Uuid) -> Result<Option<TransferRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn.query_row(
            &format!("{TRANSFER_SELECT} WHERE transfer_id = ?"),
            [id.to_string()],
            |row| Ok(row_to_transfer(row)),
        );
        optional_row(record)
    }

    /// Transfers touching an account (either side), newest first
    pub fn transfers_for_account(&self, account_id: Uuid) -> Result<Vec<TransferRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{TRANSFER_SELECT}
             WHERE from_account_id = ? OR to_account_id = ?
             ORDER BY created_at DESC"
        ))?;

        let id = account_id.to_string();
        let records = stmt
            .query_map([id.as_str(), id.as_str()], |row| Ok(row_to_transfer(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    pub fn all_transfers(&self) -> Result<Vec<TransferRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{TRANSFER_SELECT} ORDER BY created_at DESC"))?;

        let records = stmt
            .query_map([], |row| Ok(row_to_transfer(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    pub fn get_transfer_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM transfers", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Deposit claim operations ===

    pub fn insert_claim(&self, claim: &DepositClaim) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO deposit_claims (claim_id, account_id, amount, method, comment, status, created_at)
             VALUES (?, ?, CAST(? AS DECIMAL(18,2)), ?, ?, ?, ?)",
            params![
                claim.id.to_string(),
                claim.account_id.to_string(),
                claim.amount.to_string(),
                claim.method.as_str(),
                claim.comment,
                claim.status.as_str(),
                claim.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_claim(&self, id: Uuid) -> Result<Option<DepositClaim>> {
        let conn = self.conn.lock().unwrap();
        let claim = conn.query_row(
            &format!("{CLAIM_SELECT} WHERE claim_id = ?"),
            [id.to_string()],
            |row| Ok(row_to_claim(row)),
        );
        optional_row(claim)
    }

    pub fn list_claims(&self) -> Result<Vec<DepositClaim>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{CLAIM_SELECT} ORDER BY created_at DESC"))?;

        let claims = stmt
            .query_map([], |row| Ok(row_to_claim(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(claims)
    }

    pub fn claims_for_account(&self, account_id: Uuid) -> Result<Vec<DepositClaim>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{CLAIM_SELECT} WHERE account_id = ? ORDER BY created_at DESC"
        ))?;

        let claims = stmt
            .query_map([account_id.to_string()], |row| Ok(row_to_claim(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(claims)
    }

    /// Settle a pending claim: mark it completed and credit the claimed
    /// amount, atomically and at most once
    ///
    /// The status flip is a compare-and-set on `status = 'pending'`; the
    /// first settlement wins and every later attempt gets `AlreadySettled`
    /// without touching any balance. Returns the settled claim and the
    /// account's new balance.
    pub fn settle_claim(&self, claim_id: Uuid) -> Result<(DepositClaim, Decimal)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let flipped = tx.execute(
            "UPDATE deposit_claims SET status = 'completed'
             WHERE claim_id = ? AND status = 'pending'",
            params![claim_id.to_string()],
        )?;
        if flipped == 0 {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM deposit_claims WHERE claim_id = ?",
                params![claim_id.to_string()],
                |row| row.get(0),
            )?;
            return if exists == 0 {
                Err(Error::ClaimNotFound(claim_id))
            } else {
                Err(Error::AlreadySettled(claim_id))
            };
        }

        let claim = tx.query_row(
            &format!("{CLAIM_SELECT} WHERE claim_id = ?"),
            params![claim_id.to_string()],
            |row| Ok(row_to_claim(row)),
        )?;

        apply_adjustments(&tx, &[(claim.account_id, claim.amount)])?;

        let new_balance: String = tx.query_row(
            "SELECT balance::VARCHAR FROM accounts WHERE account_id = ?",
            params![claim.account_id.to_string()],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok((claim, parse_decimal(&new_balance)))
    }

    pub fn get_claim_counts(&self) -> Result<(i64, i64)> {
        let conn = self.conn.lock().unwrap();
        let counts: (i64, i64) = conn.query_row(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'completed')
             FROM deposit_claims",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }
}

const TRANSFER_SELECT: &str = "SELECT transfer_id, from_account_id, to_account_id, amount::VARCHAR,
        kind, status, description, created_at::VARCHAR, original_transfer_id
 FROM transfers";

const CLAIM_SELECT: &str = "SELECT claim_id, account_id, amount::VARCHAR, method, comment, status, created_at::VARCHAR
 FROM deposit_claims";

/// Map a single-row lookup to None only when no row matched; every other
/// database error still surfaces
fn optional_row<T>(result: std::result::Result<T, duckdb::Error>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Apply signed balance deltas inside an open transaction
///
/// An adjustment against a missing account yields AccountNotFound; the
/// caller drops the transaction, which rolls everything back.
fn apply_adjustments(tx: &duckdb::Transaction, adjustments: &[(Uuid, Decimal)]) -> Result<()> {
    for (account_id, delta) in adjustments {
        let changed = tx.execute(
            "UPDATE accounts
             SET balance = balance + CAST(? AS DECIMAL(18,2)), updated_at = ?
             WHERE account_id = ?",
            params![
                delta.to_string(),
                Utc::now().to_rfc3339(),
                account_id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(Error::AccountNotFound(*account_id));
        }
    }
    Ok(())
}

fn insert_transfer_row(tx: &duckdb::Transaction, record: &TransferRecord) -> Result<()> {
    tx.execute(
        "INSERT INTO transfers (transfer_id, from_account_id, to_account_id, amount,
                                kind, status, description, created_at, original_transfer_id)
         VALUES (?, ?, ?, CAST(? AS DECIMAL(18,2)), ?, ?, ?, ?, ?)",
        params![
            record.id.to_string(),
            record.from_account_id.to_string(),
            record.to_account_id.to_string(),
            record.amount.to_string(),
            record.kind.as_str(),
            record.status.as_str(),
            record.description,
            record.created_at.to_rfc3339(),
            record.original_transfer_id.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

fn row_to_account(row: &duckdb::Row) -> Account {
    let id_str: String = row.get(0).unwrap_or_default();
    let balance_str: String = row.get(3).unwrap_or_default();
    let created_str: String = row.get(4).unwrap_or_default();
    let updated_str: String = row.get(5).unwrap_or_default();

    Account {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        name: row.get(1).unwrap_or_default(),
        is_admin: row.get(2).unwrap_or(false),
        balance: parse_decimal(&balance_str),
        created_at: parse_timestamp(&created_str),
        updated_at: parse_timestamp(&updated_str),
    }
}

fn row_to_transfer(row: &duckdb::Row) -> TransferRecord {
    let id_str: String = row.get(0).unwrap_or_default();
    let from_str: String = row.get(1).unwrap_or_default();
    let to_str: String = row.get(2).unwrap_or_default();
    let amount_str: String = row.get(3).unwrap_or_default();
    let kind_str: String = row.get(4).unwrap_or_default();
    let status_str: String = row.get(5).unwrap_or_default();
    let created_str: String = row.get(7).unwrap_or_default();
    let original_str: Option<String> = row.get(8).ok();

    TransferRecord {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        from_account_id: Uuid::parse_str(&from_str).unwrap_or_default(),
        to_account_id: Uuid::parse_str(&to_str).unwrap_or_default(),
        amount: parse_decimal(&amount_str),
        kind: TransferKind::parse(&kind_str).unwrap_or(TransferKind::Transfer),
        status: TransferStatus::parse(&status_str).unwrap_or(TransferStatus::Completed),
        description: row.get(6).ok(),
        created_at: parse_timestamp(&created_str),
        original_transfer_id: original_str.and_then(|s| Uuid::parse_str(&s).ok()),
    }
}

fn row_to_claim(row: &duckdb::Row) -> DepositClaim {
    let id_str: String = row.get(0).unwrap_or_default();
    let account_str: String = row.get(1).unwrap_or_default();
    let amount_str: String = row.get(2).unwrap_or_default();
    let method_str: String = row.get(3).unwrap_or_default();
    let status_str: String = row.get(5).unwrap_or_default();
    let created_str: String = row.get(6).unwrap_or_default();

    DepositClaim {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        account_id: Uuid::parse_str(&account_str).unwrap_or_default(),
        amount: parse_decimal(&amount_str),
        method: FundingMethod::parse(&method_str).unwrap_or(FundingMethod::BankTransfer),
        comment: row.get(4).ok(),
        status: ClaimStatus::parse(&status_str).unwrap_or(ClaimStatus::Pending),
        created_at: parse_timestamp(&created_str),
    }
}

/// Parse a DECIMAL column read back through ::VARCHAR
fn parse_decimal(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap_or_default()
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}
