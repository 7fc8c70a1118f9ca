//! Account management module for the Juneo operation engine.
//!
//! This module provides the key provider used to authorise transactions: an
//! account interface over a secp256k1 key, a keychain mapping owner
//! addresses to accounts, and the signing and signature verification of
//! transactions against the owner sets their inputs require.

use alloy_signer::utils::public_key_to_address;
use async_trait::async_trait;
use juneo_types::{
	encoding::sha256, Address, CodecError, Credential, SecretKey, Signature, SignedTransaction,
	Transaction,
};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use ripemd::{Digest, Ripemd160};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

pub use implementations::local::LocalAccount;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when the keychain cannot serve a request, such as
	/// a lookup of an address it holds no key for.
	#[error("Wallet error: {0}")]
	Wallet(String),
	/// Error that occurs when the transaction cannot be encoded for signing.
	#[error("Codec error: {0}")]
	Codec(#[from] CodecError),
}

/// Trait defining the interface for account implementations.
///
/// An account controls one secp256k1 key, known on UTXO chains by its short
/// address and on EVM chains by its Ethereum-style address.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Short address: RIPEMD-160(SHA-256(compressed public key)).
	fn address(&self) -> Address;

	/// EVM address of the same key.
	fn evm_address(&self) -> Address;

	/// Signs a 32-byte hash, returning a recoverable `r || s || v` signature.
	async fn sign_hash(&self, hash: &[u8; 32]) -> Result<Signature, AccountError>;

	/// Returns the private key, used by EVM delivery to build its wallet.
	fn get_private_key(&self) -> SecretKey;
}

pub(crate) fn short_address_of(key: &VerifyingKey) -> Address {
	let compressed = key.to_encoded_point(true);
	let digest = Ripemd160::digest(sha256(compressed.as_bytes()));
	let mut bytes = [0u8; Address::LENGTH];
	bytes.copy_from_slice(&digest);
	Address::new(bytes)
}

pub(crate) fn evm_address_of(key: &VerifyingKey) -> Address {
	let bytes: [u8; 20] = public_key_to_address(key).into();
	Address::new(bytes)
}

fn recover_key(hash: &[u8; 32], signature: &Signature) -> Result<VerifyingKey, AccountError> {
	let compact = EcdsaSignature::from_slice(signature.compact())
		.map_err(|e| AccountError::SigningFailed(format!("Malformed signature: {}", e)))?;
	let recovery_id = RecoveryId::from_byte(signature.recovery_id()).ok_or_else(|| {
		AccountError::SigningFailed(format!(
			"Invalid recovery id {}",
			signature.recovery_id()
		))
	})?;
	VerifyingKey::recover_from_prehash(hash, &compact, recovery_id)
		.map_err(|e| AccountError::SigningFailed(format!("Recovery failed: {}", e)))
}

/// Recovers the short address that produced `signature` over `hash`.
pub fn recover_short_address(
	hash: &[u8; 32],
	signature: &Signature,
) -> Result<Address, AccountError> {
	recover_key(hash, signature).map(|key| short_address_of(&key))
}

/// True when `signature` over `hash` was made by the key behind `expected`,
/// which may be either a short or an EVM address.
fn signed_by(hash: &[u8; 32], signature: &Signature, expected: &Address) -> bool {
	match recover_key(hash, signature) {
		Ok(key) => short_address_of(&key) == *expected || evm_address_of(&key) == *expected,
		Err(_) => false,
	}
}

/// Returns the credential indices whose signatures do not cover the owners
/// the corresponding input requires.
///
/// An empty result means every input is authorised and the transaction can
/// be submitted.
pub fn verify_signatures(signed: &SignedTransaction) -> Result<Vec<usize>, AccountError> {
	let hash = signed.transaction.signing_hash()?;
	let required = signed.transaction.credential_signers();

	let failing = required
		.iter()
		.enumerate()
		.filter(|(index, signers)| match signed.credentials.get(*index) {
			Some(credential) => {
				credential.signatures.len() != signers.len()
					|| signers
						.iter()
						.zip(&credential.signatures)
						.any(|(signer, signature)| !signed_by(&hash, signature, signer))
			},
			None => true,
		})
		.map(|(index, _)| index)
		.collect();
	Ok(failing)
}

/// Key provider mapping owner addresses to the accounts that sign for them.
///
/// Each account is reachable by its short address and by its EVM address.
#[derive(Clone)]
pub struct Keychain {
	accounts: BTreeMap<Address, Arc<dyn AccountInterface>>,
	primary: Arc<dyn AccountInterface>,
}

impl Keychain {
	/// Creates a keychain whose primary account receives change and rewards.
	pub fn new(primary: Arc<dyn AccountInterface>) -> Self {
		let mut keychain = Self {
			accounts: BTreeMap::new(),
			primary: primary.clone(),
		};
		keychain.add(primary);
		keychain
	}

	/// Creates a keychain holding one local key.
	pub fn from_secret(secret: SecretKey) -> Result<Self, AccountError> {
		Ok(Self::new(Arc::new(LocalAccount::new(secret)?)))
	}

	pub fn add(&mut self, account: Arc<dyn AccountInterface>) {
		self.accounts.insert(account.address(), account.clone());
		self.accounts.insert(account.evm_address(), account);
	}

	pub fn primary(&self) -> &Arc<dyn AccountInterface> {
		&self.primary
	}

	/// Short addresses of every account, in address order.
	pub fn addresses(&self) -> Vec<Address> {
		let mut addresses: Vec<Address> = self
			.accounts
			.iter()
			.filter(|(address, account)| account.address() == **address)
			.map(|(address, _)| *address)
			.collect();
		addresses.dedup();
		addresses
	}

	pub fn contains(&self, address: &Address) -> bool {
		self.accounts.contains_key(address)
	}

	pub fn get(&self, address: &Address) -> Result<&Arc<dyn AccountInterface>, AccountError> {
		self.accounts
			.get(address)
			.ok_or_else(|| AccountError::Wallet(format!("No key for address {}", address)))
	}

	/// Signs every credential of `transaction`.
	///
	/// Required signers the keychain holds no key for get an empty signature,
	/// which `verify_signatures` reports.
	pub async fn sign(&self, transaction: Transaction) -> Result<SignedTransaction, AccountError> {
		let hash = transaction.signing_hash()?;
		let mut credentials = Vec::new();
		for signers in transaction.credential_signers() {
			let mut signatures = Vec::with_capacity(signers.len());
			for signer in &signers {
				match self.accounts.get(signer) {
					Some(account) => signatures.push(account.sign_hash(&hash).await?),
					None => {
						warn!(address = %signer, "No key for required signer");
						signatures.push(Signature::empty());
					},
				}
			}
			credentials.push(Credential { signatures });
		}
		Ok(SignedTransaction::new(transaction, credentials))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use juneo_types::{
		AssetId, BaseTransaction, BlockchainId, Secp256k1Output, TransactionId,
		TransferableInput, TransferableOutput, Utxo, UtxoVm,
	};

	const EWOQ_HEX: &str = "0x56289e99c94b6912bfc12adc093c9b51124f0dc54ac7a766b2bc5ccf558d8027";
	const OTHER_HEX: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

	fn account(key: &str) -> Arc<dyn AccountInterface> {
		Arc::new(LocalAccount::new(SecretKey::new(key)).unwrap())
	}

	fn utxo(index: u32, owners: Vec<Address>, threshold: u32) -> Utxo {
		Utxo {
			transaction_id: TransactionId::new([index as u8; 32]),
			output_index: index,
			asset_id: AssetId::new([0xaa; 32]),
			output: Secp256k1Output::new(1_000, 0, threshold, owners).into(),
		}
	}

	fn transaction(inputs: Vec<TransferableInput>) -> Transaction {
		Transaction::Base(BaseTransaction {
			vm: UtxoVm::Jvm,
			network_id: 12345,
			blockchain_id: BlockchainId::new([0x0b; 32]),
			outputs: vec![TransferableOutput::new(
				AssetId::new([0xaa; 32]),
				Secp256k1Output::new(500, 0, 1, vec![Address::new([9; 20])]),
			)],
			inputs,
			memo: vec![],
		})
	}

	#[tokio::test]
	async fn test_exact_signer_set_verifies() {
		let ewoq = account(EWOQ_HEX);
		let other = account(OTHER_HEX);
		let mut keychain = Keychain::new(ewoq.clone());
		keychain.add(other.clone());

		let owners = vec![ewoq.address(), other.address()];
		let tx = transaction(vec![
			TransferableInput::from_utxo(&utxo(1, vec![ewoq.address()], 1), vec![0]),
			TransferableInput::from_utxo(&utxo(2, owners, 2), vec![0, 1]),
		]);

		let signed = keychain.sign(tx).await.unwrap();
		assert_eq!(signed.credentials.len(), 2);
		assert_eq!(signed.credentials[1].signatures.len(), 2);
		assert!(verify_signatures(&signed).unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_missing_signer_reports_input() {
		let ewoq = account(EWOQ_HEX);
		let other = account(OTHER_HEX);
		let keychain = Keychain::new(ewoq.clone());

		let tx = transaction(vec![
			TransferableInput::from_utxo(&utxo(1, vec![ewoq.address()], 1), vec![0]),
			TransferableInput::from_utxo(&utxo(2, vec![other.address()], 1), vec![0]),
		]);

		let signed = keychain.sign(tx).await.unwrap();
		assert_eq!(signed.credentials[1].signatures[0], Signature::empty());
		assert_eq!(verify_signatures(&signed).unwrap(), vec![1]);
	}

	#[tokio::test]
	async fn test_wrong_signer_and_missing_credentials_fail() {
		let ewoq = account(EWOQ_HEX);
		let other = account(OTHER_HEX);
		let tx = transaction(vec![TransferableInput::from_utxo(
			&utxo(1, vec![ewoq.address()], 1),
			vec![0],
		)]);

		let wrong = Keychain::new(other.clone());
		let hash = tx.signing_hash().unwrap();
		let forged = SignedTransaction::new(
			tx.clone(),
			vec![Credential {
				signatures: vec![wrong.primary().sign_hash(&hash).await.unwrap()],
			}],
		);
		assert_eq!(verify_signatures(&forged).unwrap(), vec![0]);

		let unsigned = SignedTransaction::new(tx, vec![]);
		assert_eq!(verify_signatures(&unsigned).unwrap(), vec![0]);
	}

	#[test]
	fn test_keychain_lookup() {
		let ewoq = account(EWOQ_HEX);
		let keychain = Keychain::new(ewoq.clone());
		assert!(keychain.contains(&ewoq.address()));
		assert!(keychain.contains(&ewoq.evm_address()));
		assert_eq!(keychain.addresses(), vec![ewoq.address()]);
		assert!(matches!(
			keychain.get(&Address::new([1; 20])),
			Err(AccountError::Wallet(_))
		));
	}
}
