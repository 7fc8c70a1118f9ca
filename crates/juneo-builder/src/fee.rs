//! Static fee schedule lookups.

use crate::BuildError;
use juneo_config::{ChainConfig, Config};
use juneo_types::{AssetId, BlockchainId, TransactionKind};
use serde::{Deserialize, Serialize};

/// Fee owed by one transaction, in the smallest unit of `asset_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeData {
	pub asset_id: AssetId,
	pub amount: u64,
}

impl FeeData {
	pub fn new(asset_id: AssetId, amount: u64) -> Self {
		Self { asset_id, amount }
	}
}

/// Resolves fees from the configured per-chain schedules.
#[derive(Debug, Clone, Copy)]
pub struct FeeEngine<'a> {
	config: &'a Config,
}

impl<'a> FeeEngine<'a> {
	pub fn new(config: &'a Config) -> Self {
		Self { config }
	}

	pub fn chain(&self, id: &BlockchainId) -> Result<&'a ChainConfig, BuildError> {
		self.config
			.chain_by_id(id)
			.ok_or_else(|| BuildError::UnknownChain(id.to_string()))
	}

	/// Fee of a `kind` transaction on `chain`.
	pub fn fee(&self, chain: &BlockchainId, kind: TransactionKind) -> Result<FeeData, BuildError> {
		let chain = self.chain(chain)?;
		Ok(FeeData::new(chain.fee_asset, chain.fee(kind)))
	}

	/// Flat fee of an EVM call on `chain`, in atomic units of its gas asset.
	pub fn evm_call_fee(&self, chain: &BlockchainId) -> Result<FeeData, BuildError> {
		let config = self.chain(chain)?;
		let evm = config.evm.as_ref().ok_or_else(|| {
			BuildError::Unsupported(format!("Chain {} is not an EVM chain", config.alias))
		})?;
		Ok(FeeData::new(config.fee_asset, evm.call_fee))
	}
}
