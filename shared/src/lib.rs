//! Shared types and models for the Stock Ledger & Payment Reconciliation Engine
//!
//! This crate contains the domain models, database enum mappings, and the
//! pure engine functions (status classification, valuation, payment status
//! derivation, aging bucketing) shared between the backend and its tests.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
