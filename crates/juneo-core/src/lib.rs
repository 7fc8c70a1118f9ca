//! Operation engine for the Juneo network.
//!
//! Operations (sends, cross-chain moves, wrapping, staking) are validated
//! and estimated against current balances, then executed as a sequence of
//! chain transactions. Each execution is tracked by an
//! [`ExecutableOperation`] whose status and receipts can be watched while
//! the engine drives it.

pub mod balance;
pub mod builder;
pub mod engine;
pub mod monitoring;
pub mod operation;
pub mod state;

#[cfg(test)]
mod testing;

pub use balance::{BalanceProvider, CachedBalanceProvider};
pub use builder::{BuilderError, EngineBuilder};
pub use engine::{Engine, EngineError};
pub use operation::{
	CrossOperation, DelegateOperation, InputError, Leg, LegKind, Operation, OperationSummary,
	SendOperation, UnwrapOperation, ValidateOperation, WrapOperation,
};
pub use state::{ExecutableOperation, OperationSnapshot, OperationStatus, StateError};
