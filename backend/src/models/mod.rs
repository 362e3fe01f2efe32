//! Database models for the Stock Ledger & Payment Reconciliation Engine
//!
//! Re-exports models and common types from the shared crate

pub use shared::models::*;
pub use shared::types::*;
