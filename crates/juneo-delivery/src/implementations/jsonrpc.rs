//! Node JSON-RPC client for the platform, JVM and EVM atomic APIs.
//!
//! Binary values travel as `0x`-prefixed hex followed by a four-byte
//! checksum, the last bytes of the payload's SHA-256.

use crate::{ChainApi, DeliveryError, TransactionPayload};
use async_trait::async_trait;
use juneo_types::{
	encoding::{self, sha256},
	Address, Deserializable, JuneoBuffer, TransactionId, TransactionStatus, Utxo,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

const UTXO_PAGE_LIMIT: u64 = 1024;
const CHECKSUM_LENGTH: usize = 4;

/// Node API family reached by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeApi {
	Platform,
	Jvm,
	/// Atomic-transaction API of an EVM chain.
	EvmAtomic,
}

impl NodeApi {
	/// Endpoint of this API on a node serving `base_url`.
	pub fn endpoint(&self, base_url: &str, chain_alias: &str) -> String {
		let base = base_url.trim_end_matches('/');
		match self {
			NodeApi::Platform => format!("{}/ext/bc/P", base),
			NodeApi::Jvm => format!("{}/ext/bc/{}", base, chain_alias),
			NodeApi::EvmAtomic => format!("{}/ext/bc/{}/june", base, chain_alias),
		}
	}

	fn prefix(&self) -> &'static str {
		match self {
			NodeApi::Platform => "platform",
			NodeApi::Jvm => "avm",
			NodeApi::EvmAtomic => "june",
		}
	}

	fn status_method(&self) -> &'static str {
		match self {
			NodeApi::EvmAtomic => "getAtomicTxStatus",
			_ => "getTxStatus",
		}
	}
}

/// Maps a node status string onto `TransactionStatus`.
pub fn parse_status(status: &str) -> TransactionStatus {
	match status {
		"Accepted" | "Committed" => TransactionStatus::Accepted,
		"Rejected" | "Aborted" | "Dropped" => TransactionStatus::Rejected,
		"Processing" => TransactionStatus::Pending,
		_ => TransactionStatus::Unknown,
	}
}

/// Hex with the trailing checksum the node APIs expect.
pub fn encode_checked_hex(bytes: &[u8]) -> String {
	let digest = sha256(bytes);
	let mut payload = Vec::with_capacity(bytes.len() + CHECKSUM_LENGTH);
	payload.extend_from_slice(bytes);
	payload.extend_from_slice(&digest[digest.len() - CHECKSUM_LENGTH..]);
	format!("0x{}", encoding::encode_hex(&payload))
}

/// Decodes checksummed hex, returning the payload without its checksum.
pub fn decode_checked_hex(text: &str) -> Result<Vec<u8>, DeliveryError> {
	let mut bytes =
		encoding::decode_hex(text).map_err(|e| DeliveryError::Network(e.to_string()))?;
	if bytes.len() < CHECKSUM_LENGTH {
		return Err(DeliveryError::Network(format!(
			"Hex value too short: {} bytes",
			bytes.len()
		)));
	}
	let split = bytes.len() - CHECKSUM_LENGTH;
	let digest = sha256(&bytes[..split]);
	if digest[digest.len() - CHECKSUM_LENGTH..] != bytes[split..] {
		return Err(DeliveryError::Network("Invalid hex checksum".to_string()));
	}
	bytes.truncate(split);
	Ok(bytes)
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
	jsonrpc: &'static str,
	id: u64,
	method: &'a str,
	params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
	code: i64,
	message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<R> {
	result: Option<R>,
	error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct IssueTxResponse {
	#[serde(rename = "txID")]
	tx_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
	status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UtxoIndex {
	address: String,
	utxo: String,
}

/// Counts arrive as JSON strings from some node versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Count {
	Number(u64),
	Text(String),
}

impl Count {
	fn value(&self) -> Result<u64, DeliveryError> {
		match self {
			Count::Number(n) => Ok(*n),
			Count::Text(s) => s.trim().parse().map_err(|_| {
				DeliveryError::Network(format!("Malformed count in response: {:?}", s))
			}),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UtxosResponse {
	num_fetched: Count,
	utxos: Vec<String>,
	end_index: Option<UtxoIndex>,
}

/// Client for one chain's node API.
pub struct JsonRpcClient {
	client: Client,
	endpoint: String,
	api: NodeApi,
	chain_alias: String,
	hrp: String,
	request_id: AtomicU64,
}

impl JsonRpcClient {
	pub fn new(
		base_url: &str,
		chain_alias: &str,
		api: NodeApi,
		hrp: &str,
	) -> Result<Self, DeliveryError> {
		let mut headers = HeaderMap::new();
		headers.insert("Content-Type", HeaderValue::from_static("application/json"));
		headers.insert("Accept", HeaderValue::from_static("application/json"));

		let client = Client::builder()
			.default_headers(headers)
			.build()
			.map_err(|e| DeliveryError::Network(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			endpoint: api.endpoint(base_url, chain_alias),
			api,
			chain_alias: chain_alias.to_string(),
			hrp: hrp.to_string(),
			request_id: AtomicU64::new(1),
		})
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	/// Performs one JSON-RPC call of `<prefix>.<method>`.
	async fn call<P: Serialize + Send + Sync, R: DeserializeOwned>(
		&self,
		method: &str,
		params: P,
	) -> Result<R, DeliveryError> {
		let method = format!("{}.{}", self.api.prefix(), method);
		let request = JsonRpcRequest {
			jsonrpc: "2.0",
			id: self.request_id.fetch_add(1, Ordering::Relaxed),
			method: &method,
			params,
		};

		let response = self
			.client
			.post(&self.endpoint)
			.json(&request)
			.send()
			.await
			.map_err(|e| DeliveryError::Network(format!("{} request failed: {}", method, e)))?
			.error_for_status()
			.map_err(|e| DeliveryError::Network(format!("{} request failed: {}", method, e)))?
			.json::<JsonRpcResponse<R>>()
			.await
			.map_err(|e| DeliveryError::Network(format!("Invalid {} response: {}", method, e)))?;

		if let Some(error) = response.error {
			return Err(DeliveryError::Rpc {
				code: error.code,
				message: error.message,
			});
		}
		response
			.result
			.ok_or_else(|| DeliveryError::Network(format!("Empty {} response", method)))
	}

	/// Submits signed transaction bytes.
	pub async fn issue_tx(&self, bytes: &JuneoBuffer) -> Result<TransactionId, DeliveryError> {
		let params = json!({ "tx": encode_checked_hex(bytes.as_bytes()), "encoding": "hex" });
		let response: IssueTxResponse = self
			.call("issueTx", params)
			.await
			.map_err(|e| match e {
				DeliveryError::Rpc { message, .. } => DeliveryError::TransactionFailed(message),
				other => other,
			})?;
		let id = response
			.tx_id
			.parse::<TransactionId>()
			.map_err(|e| DeliveryError::Network(format!("Invalid txID in response: {}", e)))?;
		info!(chain = %self.chain_alias, transaction_id = %id, "Issued transaction");
		Ok(id)
	}

	pub async fn tx_status(&self, id: &TransactionId) -> Result<TransactionStatus, DeliveryError> {
		let response: StatusResponse = self
			.call(self.api.status_method(), json!({ "txID": id.to_string() }))
			.await?;
		let status = parse_status(&response.status);
		debug!(chain = %self.chain_alias, transaction_id = %id, status = %response.status, "Polled status");
		Ok(status)
	}

	/// Fetches all UTXOs of `addresses`, following pagination.
	pub async fn utxos(&self, addresses: &[Address]) -> Result<Vec<Utxo>, DeliveryError> {
		if addresses.is_empty() {
			return Ok(Vec::new());
		}
		let addresses = addresses
			.iter()
			.map(|address| address.to_chain_address(&self.chain_alias, &self.hrp))
			.collect::<Result<Vec<String>, _>>()
			.map_err(|e| DeliveryError::Network(e.to_string()))?;

		let mut utxos = Vec::new();
		let mut start_index: Option<UtxoIndex> = None;
		loop {
			let mut params = json!({
				"addresses": addresses,
				"limit": UTXO_PAGE_LIMIT,
				"encoding": "hex",
			});
			if let Some(index) = &start_index {
				params["startIndex"] = serde_json::to_value(index)
					.map_err(|e| DeliveryError::Network(e.to_string()))?;
			}

			let page: UtxosResponse = self.call("getUTXOs", params).await?;
			for text in &page.utxos {
				let bytes = decode_checked_hex(text)?;
				utxos.push(Utxo::deserialize(&JuneoBuffer::from_bytes(bytes))?);
			}

			if page.num_fetched.value()? < UTXO_PAGE_LIMIT || page.end_index.is_none() {
				break;
			}
			start_index = page.end_index;
		}
		debug!(chain = %self.chain_alias, count = utxos.len(), "Fetched UTXOs");
		Ok(utxos)
	}
}

#[async_trait]
impl ChainApi for JsonRpcClient {
	async fn submit_transaction(
		&self,
		payload: TransactionPayload,
	) -> Result<TransactionId, DeliveryError> {
		match payload {
			TransactionPayload::Raw(bytes) => self.issue_tx(&bytes).await,
			TransactionPayload::Evm(_) => Err(DeliveryError::Unsupported(format!(
				"EVM calls on chain {}",
				self.chain_alias
			))),
		}
	}

	async fn get_transaction_status(
		&self,
		id: &TransactionId,
	) -> Result<TransactionStatus, DeliveryError> {
		self.tx_status(id).await
	}

	async fn get_utxos(&self, addresses: &[Address]) -> Result<Vec<Utxo>, DeliveryError> {
		self.utxos(addresses).await
	}

	async fn get_evm_balance(&self, _address: &Address) -> Result<u128, DeliveryError> {
		Err(DeliveryError::Unsupported(format!(
			"EVM balance on chain {}",
			self.chain_alias
		)))
	}

	async fn get_evm_nonce(&self, _address: &Address) -> Result<u64, DeliveryError> {
		Err(DeliveryError::Unsupported(format!(
			"EVM nonce on chain {}",
			self.chain_alias
		)))
	}
}
