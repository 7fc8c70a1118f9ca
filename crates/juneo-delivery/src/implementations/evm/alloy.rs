//! EVM chain client.
//!
//! Contract calls and value transfers go through an Alloy provider whose
//! wallet signs them. Atomic import and export transactions go through the
//! chain's atomic-transaction API.

use crate::implementations::jsonrpc::{JsonRpcClient, NodeApi};
use crate::{ChainApi, DeliveryError, EvmCall, TransactionPayload};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address as EvmAddress, FixedBytes, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport_http::Http;
use async_trait::async_trait;
use juneo_config::ChainConfig;
use juneo_types::{Address, SecretKey, TransactionId, TransactionStatus, Utxo};
use std::sync::Arc;
use tracing::{debug, info};

fn to_evm_address(address: &Address) -> EvmAddress {
	EvmAddress::from(*address.as_bytes())
}

/// Converts an EVM call into an Alloy request.
pub fn to_request(call: &EvmCall) -> TransactionRequest {
	let mut request = TransactionRequest::default()
		.to(to_evm_address(&call.to))
		.value(U256::from(call.value))
		.input(call.data.clone().into());
	if let Some(gas_limit) = call.gas_limit {
		request = request.gas_limit(gas_limit);
	}
	request
}

/// Alloy-based client of one EVM chain.
pub struct EvmClient {
	/// Provider whose wallet signs EVM calls.
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	/// Atomic-transaction API of the same chain.
	atomic: JsonRpcClient,
	chain_id: u64,
}

impl EvmClient {
	/// Creates a client for `chain`, signing calls with `private_key`.
	pub fn new(
		chain: &ChainConfig,
		hrp: &str,
		private_key: &SecretKey,
	) -> Result<Self, DeliveryError> {
		let evm = chain.evm.as_ref().ok_or_else(|| {
			DeliveryError::Unsupported(format!("Chain {} has no EVM parameters", chain.alias))
		})?;

		let base = chain.rpc_url.trim_end_matches('/');
		let url: reqwest::Url = format!("{}/ext/bc/{}/rpc", base, chain.alias)
			.parse()
			.map_err(|e| {
				DeliveryError::Network(format!("Invalid RPC URL for chain {}: {}", chain.alias, e))
			})?;

		let key = private_key
			.to_bytes()
			.map_err(|e| DeliveryError::Network(format!("Invalid private key: {}", e)))?;
		let signer = PrivateKeySigner::from_slice(key.as_slice())
			.map_err(|e| DeliveryError::Network(format!("Invalid private key: {}", e)))?;

		// Create signer with chain ID
		let wallet = EthereumWallet::from(signer.with_chain_id(Some(evm.chain_id)));

		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(wallet)
			.on_http(url);

		Ok(Self {
			provider: Arc::new(provider),
			atomic: JsonRpcClient::new(&chain.rpc_url, &chain.alias, NodeApi::EvmAtomic, hrp)?,
			chain_id: evm.chain_id,
		})
	}

	async fn send_call(&self, call: EvmCall) -> Result<TransactionId, DeliveryError> {
		let pending_tx = self
			.provider
			.send_transaction(to_request(&call))
			.await
			.map_err(|e| {
				DeliveryError::TransactionFailed(format!("Failed to send transaction: {}", e))
			})?;

		let tx_hash = *pending_tx.tx_hash();
		let id = TransactionId::new(tx_hash.0);
		info!(tx_hash = %id.to_hex(), chain_id = self.chain_id, "Submitted EVM transaction");
		Ok(id)
	}

	async fn receipt_status(&self, id: &TransactionId) -> Result<TransactionStatus, DeliveryError> {
		let tx_hash = FixedBytes::<32>::from(*id.as_bytes());
		match self.provider.get_transaction_receipt(tx_hash).await {
			Ok(Some(receipt)) if receipt.status() => Ok(TransactionStatus::Accepted),
			Ok(Some(_)) => Ok(TransactionStatus::Rejected),
			Ok(None) => Ok(TransactionStatus::Pending),
			Err(e) => Err(DeliveryError::Network(format!(
				"Failed to get receipt on chain {}: {}",
				self.chain_id, e
			))),
		}
	}
}

#[async_trait]
impl ChainApi for EvmClient {
	async fn submit_transaction(
		&self,
		payload: TransactionPayload,
	) -> Result<TransactionId, DeliveryError> {
		match payload {
			TransactionPayload::Raw(bytes) => self.atomic.issue_tx(&bytes).await,
			TransactionPayload::Evm(call) => self.send_call(call).await,
		}
	}

	/// Atomic transactions are looked up first; ids the atomic API does not
	/// know are treated as EVM transaction hashes.
	async fn get_transaction_status(
		&self,
		id: &TransactionId,
	) -> Result<TransactionStatus, DeliveryError> {
		match self.atomic.tx_status(id).await {
			Ok(TransactionStatus::Unknown) | Err(DeliveryError::Rpc { .. }) => {
				debug!(transaction_id = %id, "Not an atomic transaction, checking receipt");
				self.receipt_status(id).await
			},
			other => other,
		}
	}

	async fn get_utxos(&self, addresses: &[Address]) -> Result<Vec<Utxo>, DeliveryError> {
		self.atomic.utxos(addresses).await
	}

	async fn get_evm_balance(&self, address: &Address) -> Result<u128, DeliveryError> {
		let balance = self
			.provider
			.get_balance(to_evm_address(address))
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get balance: {}", e)))?;
		u128::try_from(balance)
			.map_err(|_| DeliveryError::Network(format!("Balance {} out of range", balance)))
	}

	async fn get_evm_nonce(&self, address: &Address) -> Result<u64, DeliveryError> {
		self.provider
			.get_transaction_count(to_evm_address(address))
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get nonce: {}", e)))
	}
}
