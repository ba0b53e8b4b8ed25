//! Adapter implementations
//!
//! Adapters bind the service layer to concrete technologies:
//! - DuckDB for the ledger repository

pub mod duckdb;
