//! Account balances used to fail estimation early on missing funds.
//!
//! Balances are in each chain's native unit: the smallest asset unit on UTXO
//! chains and wei of the gas asset on EVM chains.

use async_trait::async_trait;
use juneo_config::Config;
use juneo_delivery::{DeliveryError, DeliveryService};
use juneo_types::{current_timestamp, Address, AssetId, BlockchainId, UtxoSet, VmKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Source of the account's spendable balances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceProvider: Send + Sync {
	/// Spendable balance of `asset_id` on `chain`.
	async fn get_balance(&self, chain: &BlockchainId, asset_id: &AssetId)
		-> Result<u128, DeliveryError>;

	/// Drops cached balances of `chain` after its state changed.
	async fn invalidate(&self, chain: &BlockchainId);
}

#[derive(Debug, Clone, Copy)]
enum ChainKind {
	Utxo,
	Evm { gas_asset: AssetId },
}

/// Balance provider reading chain state through the delivery service.
///
/// A chain's balances are computed from one fresh UTXO snapshot (or EVM
/// balance query) and cached until invalidated. Lookups share a read lock.
/// Refreshes of one chain are serialized by that chain's refresh lock, and
/// the cache write lock is only held to store the result.
pub struct CachedBalanceProvider {
	delivery: Arc<DeliveryService>,
	chains: HashMap<BlockchainId, ChainKind>,
	refreshing: HashMap<BlockchainId, Mutex<()>>,
	owned: Vec<Address>,
	evm_address: Address,
	cache: RwLock<HashMap<BlockchainId, HashMap<AssetId, u128>>>,
}

impl CachedBalanceProvider {
	pub fn new(
		delivery: Arc<DeliveryService>,
		config: &Config,
		owned: Vec<Address>,
		evm_address: Address,
	) -> Self {
		let chains: HashMap<_, _> = config
			.chains
			.iter()
			.map(|chain| {
				let kind = match chain.vm {
					VmKind::Evm => ChainKind::Evm {
						gas_asset: chain.fee_asset,
					},
					VmKind::Platform | VmKind::Jvm => ChainKind::Utxo,
				};
				(chain.id, kind)
			})
			.collect();
		let refreshing = chains.keys().map(|id| (*id, Mutex::new(()))).collect();
		Self {
			delivery,
			chains,
			refreshing,
			owned,
			evm_address,
			cache: RwLock::new(HashMap::new()),
		}
	}

	async fn cached(&self, chain: &BlockchainId, asset_id: &AssetId) -> Option<u128> {
		self.cache
			.read()
			.await
			.get(chain)
			.map(|balances| balances.get(asset_id).copied().unwrap_or(0))
	}

	async fn fetch(
		&self,
		chain: &BlockchainId,
		kind: ChainKind,
	) -> Result<HashMap<AssetId, u128>, DeliveryError> {
		let mut balances = HashMap::new();
		match kind {
			ChainKind::Utxo => {
				let utxos: UtxoSet = self
					.delivery
					.utxos(chain, &self.owned)
					.await?
					.into_iter()
					.collect();
				let now = current_timestamp();
				for utxo in utxos.iter() {
					balances.entry(utxo.asset_id).or_insert_with(|| {
						u128::from(utxos.balance(&utxo.asset_id, &self.owned, now))
					});
				}
			},
			ChainKind::Evm { gas_asset } => {
				let balance = self.delivery.evm_balance(chain, &self.evm_address).await?;
				balances.insert(gas_asset, balance);
			},
		}
		Ok(balances)
	}
}

#[async_trait]
impl BalanceProvider for CachedBalanceProvider {
	async fn get_balance(
		&self,
		chain: &BlockchainId,
		asset_id: &AssetId,
	) -> Result<u128, DeliveryError> {
		if let Some(balance) = self.cached(chain, asset_id).await {
			return Ok(balance);
		}
		let (kind, refreshing) = match (self.chains.get(chain), self.refreshing.get(chain)) {
			(Some(kind), Some(refreshing)) => (*kind, refreshing),
			_ => return Err(DeliveryError::NoProviderAvailable(*chain)),
		};

		let _refresh = refreshing.lock().await;
		// Another task may have refreshed while we waited for the lock.
		if let Some(balance) = self.cached(chain, asset_id).await {
			return Ok(balance);
		}
		let balances = self.fetch(chain, kind).await?;
		debug!(chain = %chain, assets = balances.len(), "Refreshed balances");
		let balance = balances.get(asset_id).copied().unwrap_or(0);
		self.cache.write().await.insert(*chain, balances);
		Ok(balance)
	}

	async fn invalidate(&self, chain: &BlockchainId) {
		// Waits out an in-flight refresh so it cannot store stale balances.
		let _refresh = match self.refreshing.get(chain) {
			Some(refreshing) => Some(refreshing.lock().await),
			None => None,
		};
		self.cache.write().await.remove(chain);
	}
}
