//! Business logic services for the Stock Ledger & Payment Reconciliation Engine

pub mod aging;
pub mod payments;
pub mod reporting;
pub mod stock_ledger;

pub use aging::AgingService;
pub use payments::PaymentService;
pub use reporting::ReportingService;
pub use stock_ledger::StockLedgerService;
