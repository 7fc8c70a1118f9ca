//! Scripted chain client for engine tests.

use async_trait::async_trait;
use juneo_delivery::{ChainApi, DeliveryError, TransactionPayload};
use juneo_types::{
	Address, AssetId, Secp256k1Output, TransactionId, TransactionStatus, Utxo,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// UTXO of `amount` owned by `owner` alone.
pub fn owned_utxo(tx: u8, amount: u64, asset_id: AssetId, owner: Address) -> Utxo {
	Utxo {
		transaction_id: TransactionId::new([tx; 32]),
		output_index: 0,
		asset_id,
		output: Secp256k1Output::new(amount, 0, 1, vec![owner]).into(),
	}
}

/// Chain whose status answers follow a script.
///
/// Each status query pops the next scripted status; once the script runs
/// out, the last one repeats. Submissions are recorded and get sequential ids.
pub struct ScriptedChain {
	statuses: Mutex<VecDeque<TransactionStatus>>,
	last_status: Mutex<TransactionStatus>,
	utxos: Mutex<Vec<Utxo>>,
	submitted: Mutex<Vec<TransactionPayload>>,
	utxo_queries: Mutex<usize>,
	status_queries: Mutex<usize>,
	evm_balance: Mutex<u128>,
	utxo_delay: Mutex<Duration>,
	status_error: Mutex<Option<String>>,
	id_prefix: u8,
}

impl ScriptedChain {
	pub fn new() -> Self {
		Self::with_id_prefix(0xf0)
	}

	/// Ids of submitted transactions start with `prefix`.
	pub fn with_id_prefix(prefix: u8) -> Self {
		Self {
			statuses: Mutex::new(VecDeque::new()),
			last_status: Mutex::new(TransactionStatus::Accepted),
			utxos: Mutex::new(Vec::new()),
			submitted: Mutex::new(Vec::new()),
			utxo_queries: Mutex::new(0),
			status_queries: Mutex::new(0),
			evm_balance: Mutex::new(0),
			utxo_delay: Mutex::new(Duration::ZERO),
			status_error: Mutex::new(None),
			id_prefix: prefix,
		}
	}

	pub fn script(&self, statuses: &[TransactionStatus]) {
		self.statuses.lock().unwrap().extend(statuses.iter().copied());
	}

	pub fn set_utxos(&self, utxos: Vec<Utxo>) {
		*self.utxos.lock().unwrap() = utxos;
	}

	pub fn set_evm_balance(&self, balance: u128) {
		*self.evm_balance.lock().unwrap() = balance;
	}

	/// Every later status query fails with a network error.
	pub fn fail_status_queries(&self, message: &str) {
		*self.status_error.lock().unwrap() = Some(message.to_string());
	}

	/// UTXO queries answer after `delay`.
	pub fn set_utxo_delay(&self, delay: Duration) {
		*self.utxo_delay.lock().unwrap() = delay;
	}

	pub fn submitted(&self) -> Vec<TransactionPayload> {
		self.submitted.lock().unwrap().clone()
	}

	pub fn utxo_queries(&self) -> usize {
		*self.utxo_queries.lock().unwrap()
	}

	pub fn status_queries(&self) -> usize {
		*self.status_queries.lock().unwrap()
	}
}

#[async_trait]
impl ChainApi for ScriptedChain {
	async fn submit_transaction(
		&self,
		payload: TransactionPayload,
	) -> Result<TransactionId, DeliveryError> {
		let mut submitted = self.submitted.lock().unwrap();
		submitted.push(payload);
		let mut id = [self.id_prefix; 32];
		id[31] = submitted.len() as u8;
		Ok(TransactionId::new(id))
	}

	async fn get_transaction_status(
		&self,
		_id: &TransactionId,
	) -> Result<TransactionStatus, DeliveryError> {
		*self.status_queries.lock().unwrap() += 1;
		if let Some(message) = self.status_error.lock().unwrap().clone() {
			return Err(DeliveryError::Network(message));
		}
		let mut last = self.last_status.lock().unwrap();
		if let Some(next) = self.statuses.lock().unwrap().pop_front() {
			*last = next;
		}
		Ok(*last)
	}

	async fn get_utxos(&self, _addresses: &[Address]) -> Result<Vec<Utxo>, DeliveryError> {
		*self.utxo_queries.lock().unwrap() += 1;
		let delay = *self.utxo_delay.lock().unwrap();
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
		Ok(self.utxos.lock().unwrap().clone())
	}

	async fn get_evm_balance(&self, _address: &Address) -> Result<u128, DeliveryError> {
		Ok(*self.evm_balance.lock().unwrap())
	}

	async fn get_evm_nonce(&self, _address: &Address) -> Result<u64, DeliveryError> {
		Ok(3)
	}
}
