//! Transaction construction for the Juneo operation engine.
//!
//! This crate turns UTXO snapshots and account state into unsigned
//! transactions. It selects inputs, computes change, applies the static fee
//! schedule, encodes EVM calls and estimates staking rewards. Nothing here
//! performs network I/O.

use juneo_types::{AssetId, CodecError};
use thiserror::Error;

/// EVM call encoding.
pub mod evm;
/// Fee schedule lookups.
pub mod fee;
/// Staking reward calculation.
pub mod reward;
/// Deterministic UTXO selection.
pub mod selector;
/// Builders for every transaction kind.
pub mod transactions;

pub use fee::{FeeData, FeeEngine};
pub use selector::{select_utxos, Selection, UtxoSelector};
pub use transactions::{ChainSpec, UtxoContext};

/// Errors that can occur while building transactions.
#[derive(Debug, Error)]
pub enum BuildError {
	/// Spendable UTXOs of an asset do not cover the requested amount.
	#[error("Insufficient funds of asset {asset_id}: required {required}, available {available}")]
	InsufficientFunds {
		asset_id: AssetId,
		required: u64,
		available: u64,
	},
	/// The chain is not part of the configuration.
	#[error("Unknown chain: {0}")]
	UnknownChain(String),
	/// The chain cannot host the requested transaction.
	#[error("Unsupported: {0}")]
	Unsupported(String),
	#[error("Amount overflow")]
	Overflow,
	#[error("Invalid parameter: {0}")]
	InvalidParameter(String),
	#[error("Codec error: {0}")]
	Codec(#[from] CodecError),
}
