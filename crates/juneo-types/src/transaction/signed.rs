//! Signatures, credentials and signed transactions.

use crate::buffer::{BufferWriter, CodecError, JuneoBuffer, Serializable};
use crate::encoding::sha256;
use crate::ids::TransactionId;
use crate::transaction::Transaction;
use crate::utils::constants::{SECP256K1_CREDENTIAL_TYPE_ID, SIGNATURE_LENGTH};
use std::fmt;

/// Recoverable secp256k1 signature laid out as `r || s || v`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
	pub const fn new(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
		Self(bytes)
	}

	pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
		let array: [u8; SIGNATURE_LENGTH] = bytes
			.try_into()
			.map_err(|_| CodecError::InvalidLength(bytes.len()))?;
		Ok(Self(array))
	}

	/// All-zero placeholder for a signer that was not available.
	pub const fn empty() -> Self {
		Self([0u8; SIGNATURE_LENGTH])
	}

	pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
		&self.0
	}

	/// The 64-byte `r || s` part.
	pub fn compact(&self) -> &[u8] {
		&self.0[..SIGNATURE_LENGTH - 1]
	}

	pub fn recovery_id(&self) -> u8 {
		self.0[SIGNATURE_LENGTH - 1]
	}
}

impl fmt::Debug for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Signature(0x{})", hex::encode(self.0))
	}
}

impl Serializable for Signature {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_bytes(&self.0)
	}
}

/// Signatures authorising one input, in owner-index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
	pub signatures: Vec<Signature>,
}

impl Serializable for Credential {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(SECP256K1_CREDENTIAL_TYPE_ID)?;
		writer.write_list(&self.signatures)
	}
}

/// A transaction with one credential per required signer set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub transaction: Transaction,
	pub credentials: Vec<Credential>,
}

impl SignedTransaction {
	pub fn new(transaction: Transaction, credentials: Vec<Credential>) -> Self {
		Self {
			transaction,
			credentials,
		}
	}

	/// Bytes submitted to the chain.
	pub fn signed_bytes(&self) -> Result<JuneoBuffer, CodecError> {
		self.serialize()
	}

	/// SHA-256 of the signed bytes.
	pub fn id(&self) -> Result<TransactionId, CodecError> {
		Ok(TransactionId::new(sha256(self.signed_bytes()?.as_bytes())))
	}
}

impl Serializable for SignedTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.transaction.write_to(writer)?;
		writer.write_list(&self.credentials)
	}
}
