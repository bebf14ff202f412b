// Common Charges - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod db;
pub mod entities;
pub mod error;
pub mod ledger;
pub mod registry;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use db::{setup_database, LedgerStore, SqliteStore};
pub use entities::{
    Charge, GeneratedCharge, NewCharge, PaymentReceipt, PaymentStatus, PendingCharge, Period,
    Unit, DEFAULT_BASE_AMOUNT,
};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{generate_charges, list_pending, mark_paid, payment_status};
pub use registry::register_unit;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default SQLite file used by the CLI and the server
pub const DEFAULT_DATABASE: &str = "common_charges.db";
