//! rowdesk-core — row model, query engine and row validation.
//!
//! Everything here is synchronous and free of I/O apart from config loading.
//! The store and web crates load rows, hand them to this crate, and persist or
//! serialize whatever comes back.
//!
//! # Architecture
//!
//! ```text
//! Store ──► Query (search ──► filter) ──► Web / CLI
//!   ▲
//!   └──── Validate ◄──── writes
//! ```

pub mod config;
pub mod export;
pub mod integrity;
pub mod query;
pub mod render;
pub mod table_id;
pub mod types;
pub mod units;
pub mod validate;

pub use query::{filter, search, Criterion, FilterOptions, Operator, Query};
pub use table_id::{TableId, TableIdError};
pub use types::{value_number, value_text, KeySet, Row};
pub use validate::{validate, ValidationError};
