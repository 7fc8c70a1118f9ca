//! Transaction delivery module for the Juneo operation engine.
//!
//! This module handles the submission and monitoring of transactions on every
//! chain of the network. Each chain is reached through a `ChainApi`
//! implementation: node JSON-RPC for the platform and JVM chains, and an
//! Alloy provider combined with the atomic-transaction API for EVM chains.
//! The `DeliveryService` routes calls to the right client by blockchain id.

use async_trait::async_trait;
use juneo_config::Config;
use juneo_types::{
	Address, BlockchainId, CodecError, JuneoBuffer, SecretKey, TransactionId, TransactionStatus,
	Utxo, VmKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod jsonrpc;
}

pub use implementations::evm::alloy::EvmClient;
pub use implementations::jsonrpc::{JsonRpcClient, NodeApi};

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error returned by the node for a request it understood.
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	/// Error that occurs when a transaction is refused at submission.
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
	/// Error that occurs when no client is configured for a chain.
	#[error("No provider available for chain {0}")]
	NoProviderAvailable(BlockchainId),
	/// Error that occurs when a chain is asked for something its VM lacks.
	#[error("Unsupported: {0}")]
	Unsupported(String),
	/// Error that occurs when a node response cannot be decoded.
	#[error("Codec error: {0}")]
	Codec(#[from] CodecError),
}

/// A call on an EVM chain, signed by the client's wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmCall {
	pub to: Address,
	/// Value in wei.
	pub value: u128,
	pub data: Vec<u8>,
	pub gas_limit: Option<u64>,
}

/// What gets submitted to a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionPayload {
	/// Signed bytes of a UTXO or atomic transaction.
	Raw(JuneoBuffer),
	/// EVM call request.
	Evm(EvmCall),
}

/// Trait defining the interface to one chain's node API.
#[async_trait]
pub trait ChainApi: Send + Sync {
	/// Submits a transaction, returning its id.
	async fn submit_transaction(
		&self,
		payload: TransactionPayload,
	) -> Result<TransactionId, DeliveryError>;

	/// Returns the current status of a submitted transaction.
	async fn get_transaction_status(
		&self,
		id: &TransactionId,
	) -> Result<TransactionStatus, DeliveryError>;

	/// Fetches every UTXO on this chain owned by any of `addresses`.
	async fn get_utxos(&self, addresses: &[Address]) -> Result<Vec<Utxo>, DeliveryError>;

	/// Balance of the gas asset held by `address`, in wei.
	async fn get_evm_balance(&self, address: &Address) -> Result<u128, DeliveryError>;

	/// Next nonce of `address`.
	async fn get_evm_nonce(&self, address: &Address) -> Result<u64, DeliveryError>;
}

/// Service that manages transaction delivery across the chains of a network.
#[derive(Clone, Default)]
pub struct DeliveryService {
	/// Map of blockchain ids to their chain clients.
	providers: HashMap<BlockchainId, Arc<dyn ChainApi>>,
}

impl DeliveryService {
	/// Creates a new DeliveryService with the specified chain clients.
	pub fn new(providers: HashMap<BlockchainId, Arc<dyn ChainApi>>) -> Self {
		Self { providers }
	}

	/// Creates a client for every configured chain.
	///
	/// EVM clients sign calls with `private_key`.
	pub fn from_config(config: &Config, private_key: &SecretKey) -> Result<Self, DeliveryError> {
		let mut service = Self::default();
		for chain in &config.chains {
			let provider: Arc<dyn ChainApi> = match chain.vm {
				VmKind::Platform => Arc::new(JsonRpcClient::new(
					&chain.rpc_url,
					&chain.alias,
					NodeApi::Platform,
					&config.network.hrp,
				)?),
				VmKind::Jvm => Arc::new(JsonRpcClient::new(
					&chain.rpc_url,
					&chain.alias,
					NodeApi::Jvm,
					&config.network.hrp,
				)?),
				VmKind::Evm => Arc::new(EvmClient::new(chain, &config.network.hrp, private_key)?),
			};
			debug!(chain = %chain.alias, vm = %chain.vm, "Configured chain client");
			service = service.with_chain(chain.id, provider);
		}
		Ok(service)
	}

	/// Registers or replaces the client of `chain`.
	pub fn with_chain(mut self, chain: BlockchainId, provider: Arc<dyn ChainApi>) -> Self {
		self.providers.insert(chain, provider);
		self
	}

	/// Gets the client of a chain.
	pub fn provider(&self, chain: &BlockchainId) -> Result<&Arc<dyn ChainApi>, DeliveryError> {
		self.providers
			.get(chain)
			.ok_or(DeliveryError::NoProviderAvailable(*chain))
	}

	pub async fn submit(
		&self,
		chain: &BlockchainId,
		payload: TransactionPayload,
	) -> Result<TransactionId, DeliveryError> {
		self.provider(chain)?.submit_transaction(payload).await
	}

	pub async fn status(
		&self,
		chain: &BlockchainId,
		id: &TransactionId,
	) -> Result<TransactionStatus, DeliveryError> {
		self.provider(chain)?.get_transaction_status(id).await
	}

	pub async fn utxos(
		&self,
		chain: &BlockchainId,
		addresses: &[Address],
	) -> Result<Vec<Utxo>, DeliveryError> {
		self.provider(chain)?.get_utxos(addresses).await
	}

	pub async fn evm_balance(
		&self,
		chain: &BlockchainId,
		address: &Address,
	) -> Result<u128, DeliveryError> {
		self.provider(chain)?.get_evm_balance(address).await
	}

	pub async fn evm_nonce(
		&self,
		chain: &BlockchainId,
		address: &Address,
	) -> Result<u64, DeliveryError> {
		self.provider(chain)?.get_evm_nonce(address).await
	}
}
