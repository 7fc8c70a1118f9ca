//! Fixed-length identifiers with checksummed text forms.
//!
//! Every identifier wraps a byte array of a kind-specific length. Text input
//! is either `0x`-prefixed hex or CB58; addresses additionally accept the
//! bech32 chain form (`P-socotra1...`) and node ids the `NodeID-` prefix.
//! Equality is always byte-wise.

use crate::buffer::{BufferReader, BufferWriter, CodecError, Deserializable, Serializable};
use crate::encoding::{self, DecodingError};
use crate::utils::has_0x_prefix;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while constructing identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
	/// The text was not valid hex, CB58 or bech32.
	#[error("Decoding error: {0}")]
	Decoding(#[from] DecodingError),
	/// The decoded payload had the wrong byte length for the identifier kind.
	#[error("Type error: {kind} must be {expected} bytes, got {actual}")]
	Type {
		kind: &'static str,
		expected: usize,
		actual: usize,
	},
	#[error("Address list cannot be empty")]
	EmptyList,
}

/// Decodes identifier text as hex when prefixed with `0x`, CB58 otherwise.
fn decode_text(text: &str) -> Result<Vec<u8>, DecodingError> {
	if has_0x_prefix(text) {
		encoding::decode_hex(text)
	} else {
		encoding::decode_cb58(text)
	}
}

macro_rules! identifier {
	($(#[$meta:meta])* $name:ident, $length:expr, $kind:literal) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name([u8; $length]);

		impl $name {
			pub const LENGTH: usize = $length;

			pub const fn new(bytes: [u8; $length]) -> Self {
				Self(bytes)
			}

			/// Builds the identifier from decoded bytes, checking the length.
			pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentifierError> {
				let array: [u8; $length] =
					bytes.try_into().map_err(|_| IdentifierError::Type {
						kind: $kind,
						expected: $length,
						actual: bytes.len(),
					})?;
				Ok(Self(array))
			}

			pub fn as_bytes(&self) -> &[u8; $length] {
				&self.0
			}

			pub fn to_cb58(&self) -> String {
				encoding::encode_cb58(&self.0)
			}

			pub fn to_hex(&self) -> String {
				format!("0x{}", encoding::encode_hex(&self.0))
			}

			/// Returns true when `text` decodes to the same bytes.
			pub fn matches(&self, text: &str) -> bool {
				text.parse::<Self>().is_ok_and(|other| other == *self)
			}

			/// True for the all-zero identifier.
			pub fn is_empty(&self) -> bool {
				self.0.iter().all(|b| *b == 0)
			}
		}

		impl Serializable for $name {
			fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
				writer.write_bytes(&self.0)
			}
		}

		impl Deserializable for $name {
			fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
				reader.read_array().map(Self)
			}
		}

		impl From<[u8; $length]> for $name {
			fn from(bytes: [u8; $length]) -> Self {
				Self(bytes)
			}
		}

		impl AsRef<[u8]> for $name {
			fn as_ref(&self) -> &[u8] {
				&self.0
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}({})", stringify!($name), self)
			}
		}

		impl Serialize for $name {
			fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.collect_str(self)
			}
		}

		impl<'de> Deserialize<'de> for $name {
			fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				let text = String::deserialize(deserializer)?;
				text.parse().map_err(serde::de::Error::custom)
			}
		}
	};
}

/// Implements CB58 display and hex/CB58 parsing.
macro_rules! cb58_text {
	($name:ident) => {
		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.to_cb58())
			}
		}

		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(text: &str) -> Result<Self, Self::Err> {
				Self::from_slice(&decode_text(text)?)
			}
		}
	};
}

identifier!(
	/// Short address: RIPEMD-160 of the SHA-256 of a compressed public key,
	/// or a 20-byte EVM address.
	Address,
	20,
	"address"
);
identifier!(
	/// Identifier of a staking node.
	NodeId,
	20,
	"node id"
);
identifier!(AssetId, 32, "asset id");
identifier!(
	/// SHA-256 of a signed transaction's bytes.
	TransactionId,
	32,
	"transaction id"
);
identifier!(BlockchainId, 32, "blockchain id");
identifier!(SupernetId, 32, "supernet id");
identifier!(VmId, 32, "vm id");
identifier!(FxId, 32, "fx id");

cb58_text!(AssetId);
cb58_text!(TransactionId);
cb58_text!(BlockchainId);
cb58_text!(SupernetId);
cb58_text!(VmId);
cb58_text!(FxId);

impl Address {
	/// Bech32 form without a chain alias, e.g. `socotra1...`.
	pub fn to_bech32(&self, hrp: &str) -> Result<String, DecodingError> {
		encoding::encode_bech32(hrp, &self.0)
	}

	/// Chain-prefixed bech32 form used by node APIs, e.g. `P-socotra1...`.
	pub fn to_chain_address(&self, chain_alias: &str, hrp: &str) -> Result<String, DecodingError> {
		Ok(format!("{}-{}", chain_alias, self.to_bech32(hrp)?))
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl FromStr for Address {
	type Err = IdentifierError;

	/// Accepts hex, CB58, bech32 and chain-prefixed bech32.
	fn from_str(text: &str) -> Result<Self, Self::Err> {
		if has_0x_prefix(text) {
			return Self::from_slice(&encoding::decode_hex(text)?);
		}
		if let Some((_alias, bech32)) = text.split_once('-') {
			let (_hrp, payload) = encoding::decode_bech32(bech32)?;
			return Self::from_slice(&payload);
		}
		match encoding::decode_cb58(text) {
			Ok(bytes) => Self::from_slice(&bytes),
			Err(cb58_error) => match encoding::decode_bech32(text) {
				Ok((_hrp, payload)) => Self::from_slice(&payload),
				Err(_) => Err(cb58_error.into()),
			},
		}
	}
}

const NODE_ID_PREFIX: &str = "NodeID-";

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", NODE_ID_PREFIX, self.to_cb58())
	}
}

impl FromStr for NodeId {
	type Err = IdentifierError;

	fn from_str(text: &str) -> Result<Self, Self::Err> {
		let text = text.strip_prefix(NODE_ID_PREFIX).unwrap_or(text);
		Self::from_slice(&decode_text(text)?)
	}
}

/// Decodes a list of textual addresses.
///
/// Fails on the first invalid entry, and on an empty list.
pub fn to_addresses<S: AsRef<str>>(values: &[S]) -> Result<Vec<Address>, IdentifierError> {
	if values.is_empty() {
		return Err(IdentifierError::EmptyList);
	}
	values.iter().map(|v| v.as_ref().parse()).collect()
}
