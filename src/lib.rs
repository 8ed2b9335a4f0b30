//! rowdesk — browse, search, edit and export database tables.
//!
//! The workspace is split the same way the data flows. This crate re-exports
//! the pieces so integration tests and the binary can import them from one
//! place, and holds the command-line commands in [`commands`].
//!
//! # Architecture
//!
//! ```text
//! rowdesk-store ──► rowdesk-core (query, validate) ──► rowdesk-web / commands
//!   JsonStore            search ──► filter                axum router
//!   SqliteStore          validate ◄── writes              CLI subcommands
//! ```
//!
//! Stores are synchronous; the web layer calls them from the blocking pool.

pub mod commands;

pub use rowdesk_core::config::Config;
pub use rowdesk_core::{
    filter, search, validate, Criterion, FilterOptions, KeySet, Operator, Query, Row, TableId,
    TableIdError, ValidationError,
};
pub use rowdesk_store::{open_store, JsonStore, SqliteStore, StoreError, TableStore};
pub use rowdesk_web::{router, serve, ApiError, AppState};
