//! Shared types for the Juneo operation engine.
//!
//! This crate holds the binary codec, identifiers, the UTXO and transaction
//! model with its wire format, and the small value types that every other
//! crate in the workspace exchanges.

/// Asset amounts with decimals.
pub mod amount;
/// Fixed-length buffer and the wire codec traits.
pub mod buffer;
/// Virtual machine kinds.
pub mod chain;
/// Hex, base58, CB58 and bech32 text encodings.
pub mod encoding;
/// Fixed-length identifiers.
pub mod ids;
/// Zeroizing private key holder.
pub mod secret;
/// Transaction statuses and operation receipts.
pub mod status;
/// Transaction kinds, inputs, outputs and signed transactions.
pub mod transaction;
/// Formatting helpers and wire constants.
pub mod utils;
/// UTXOs and UTXO sets.
pub mod utxo;

pub use amount::{AmountError, AssetValue};
pub use buffer::{
	BufferReader, BufferWriter, CodecError, Deserializable, JuneoBuffer, Serializable,
};
pub use chain::{UtxoVm, VmKind};
pub use encoding::DecodingError;
pub use ids::{
	to_addresses, Address, AssetId, BlockchainId, FxId, IdentifierError, NodeId, SupernetId,
	TransactionId, VmId,
};
pub use secret::SecretKey;
pub use status::{Receipt, TransactionStatus};
pub use transaction::*;
pub use utils::{current_timestamp, truncate_id, with_0x_prefix, without_0x_prefix};
pub use utxo::{Utxo, UtxoKey, UtxoSet};
