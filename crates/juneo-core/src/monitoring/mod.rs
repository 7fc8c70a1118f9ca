//! Asynchronous monitoring of submitted transactions.
//!
//! Each leg of an operation is followed by polling its chain at a fixed
//! interval, bounded by the operation's deadline.

pub mod transaction;

pub use transaction::{LegOutcome, TransactionMonitor};
