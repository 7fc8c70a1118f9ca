//! Local key account implementation.
//!
//! Holds a secp256k1 private key in process memory and signs 32-byte
//! hashes with recoverable, low-s signatures.

use crate::{evm_address_of, short_address_of, AccountError, AccountInterface};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use juneo_types::{Address, SecretKey, Signature};

/// Account backed by a private key held in memory.
pub struct LocalAccount {
	signer: PrivateKeySigner,
	secret: SecretKey,
	address: Address,
	evm_address: Address,
}

impl LocalAccount {
	/// Creates an account from a hex or `PrivateKey-<cb58>` key.
	pub fn new(secret: SecretKey) -> Result<Self, AccountError> {
		let bytes = secret
			.to_bytes()
			.map_err(|e| AccountError::InvalidKey(e.to_string()))?;
		let signer = PrivateKeySigner::from_slice(bytes.as_slice())
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;
		let verifying_key = signer.credential().verifying_key();
		let address = short_address_of(verifying_key);
		let evm_address = evm_address_of(verifying_key);
		Ok(Self {
			signer,
			secret,
			address,
			evm_address,
		})
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	fn address(&self) -> Address {
		self.address
	}

	fn evm_address(&self) -> Address {
		self.evm_address
	}

	async fn sign_hash(&self, hash: &[u8; 32]) -> Result<Signature, AccountError> {
		let (signature, recovery_id) = self
			.signer
			.credential()
			.sign_prehash_recoverable(hash)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		let mut bytes = [0u8; 65];
		bytes[..64].copy_from_slice(&signature.to_bytes());
		bytes[64] = recovery_id.to_byte();
		Ok(Signature::new(bytes))
	}

	fn get_private_key(&self) -> SecretKey {
		self.secret.clone()
	}
}
