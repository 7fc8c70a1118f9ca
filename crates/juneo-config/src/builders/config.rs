//! Configuration builder for creating test and development configurations.
//!
//! The default build describes a local network with a platform chain, a JVM
//! chain and one EVM chain, all paying fees in a single 9-decimal asset and
//! signed with the well-known local development key.

use crate::{
	AccountConfig, AssetConfig, ChainConfig, Config, EvmChainConfig, ExecutionConfig,
	NetworkConfig, RewardConfig, StakingConfig,
};
use juneo_types::{Address, AssetId, BlockchainId, SecretKey, TransactionKind, VmKind};
use std::collections::BTreeMap;

/// Development key funded on local networks.
pub const LOCAL_PRIVATE_KEY: &str =
	"0x56289e99c94b6912bfc12adc093c9b51124f0dc54ac7a766b2bc5ccf558d8027";

pub const LOCAL_NETWORK_ID: u32 = 12345;
pub const LOCAL_EVM_CHAIN_ID: u64 = 220001;

pub fn local_fee_asset() -> AssetId {
	AssetId::new([0xaa; 32])
}

pub fn local_platform_chain_id() -> BlockchainId {
	BlockchainId::default()
}

pub fn local_jvm_chain_id() -> BlockchainId {
	BlockchainId::new([0x0b; 32])
}

pub fn local_evm_chain_id() -> BlockchainId {
	BlockchainId::new([0x0e; 32])
}

pub fn local_wrapped_contract() -> Address {
	Address::new([0x77; 20])
}

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	network_id: u32,
	hrp: String,
	rpc_url: String,
	fee: u64,
	evm_call_fee: u64,
	min_validator_stake: u64,
	max_validator_stake: u64,
	min_delegator_stake: u64,
	reward: RewardConfig,
	poll_interval_ms: u64,
	timeout_ms: u64,
	private_key: String,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		Self {
			network_id: LOCAL_NETWORK_ID,
			hrp: "local".to_string(),
			rpc_url: "http://127.0.0.1:9650".to_string(),
			fee: 1_000_000,
			evm_call_fee: 500_000,
			min_validator_stake: 1_000_000_000,
			max_validator_stake: 1_000_000_000_000_000,
			min_delegator_stake: 10_000_000,
			reward: RewardConfig {
				min_stake_period: 14 * 86_400,
				max_stake_period: 365 * 86_400,
				stake_period_reward_share: 500_000,
				start_reward_time: 1_700_000_000,
				start_reward: 215_000,
				diminishing_reward_time: 1_800_000_000,
				diminishing_reward: 190_000,
				target_reward_time: 1_900_000_000,
				target_reward: 150_000,
			},
			poll_interval_ms: 10,
			timeout_ms: 1_000,
			private_key: LOCAL_PRIVATE_KEY.to_string(),
		}
	}

	pub fn network_id(mut self, id: u32) -> Self {
		self.network_id = id;
		self
	}

	/// Sets the bech32 human-readable part.
	pub fn hrp(mut self, hrp: impl Into<String>) -> Self {
		self.hrp = hrp.into();
		self
	}

	/// Sets the node URL shared by every chain.
	pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
		self.rpc_url = url.into();
		self
	}

	/// Sets the static fee applied to every transaction kind on every chain.
	pub fn fee(mut self, fee: u64) -> Self {
		self.fee = fee;
		self
	}

	pub fn evm_call_fee(mut self, fee: u64) -> Self {
		self.evm_call_fee = fee;
		self
	}

	pub fn validator_stake_bounds(mut self, min: u64, max: u64) -> Self {
		self.min_validator_stake = min;
		self.max_validator_stake = max;
		self
	}

	pub fn min_delegator_stake(mut self, min: u64) -> Self {
		self.min_delegator_stake = min;
		self
	}

	pub fn reward(mut self, reward: RewardConfig) -> Self {
		self.reward = reward;
		self
	}

	/// Sets the poll interval and deadline of executing operations.
	pub fn execution(mut self, poll_interval_ms: u64, timeout_ms: u64) -> Self {
		self.poll_interval_ms = poll_interval_ms;
		self.timeout_ms = timeout_ms;
		self
	}

	pub fn private_key(mut self, key: impl Into<String>) -> Self {
		self.private_key = key.into();
		self
	}

	fn fees(&self, kinds: &[TransactionKind]) -> BTreeMap<TransactionKind, u64> {
		kinds.iter().map(|kind| (*kind, self.fee)).collect()
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		use TransactionKind::*;

		let platform = ChainConfig {
			alias: "P".to_string(),
			id: local_platform_chain_id(),
			vm: VmKind::Platform,
			rpc_url: self.rpc_url.clone(),
			fee_asset: local_fee_asset(),
			fees: self.fees(&[
				Base,
				Import,
				Export,
				AddValidator,
				AddDelegator,
				AddSupernetValidator,
				CreateSupernet,
				CreateChain,
			]),
			evm: None,
		};
		let jvm = ChainConfig {
			alias: "JVM".to_string(),
			id: local_jvm_chain_id(),
			vm: VmKind::Jvm,
			rpc_url: self.rpc_url.clone(),
			fee_asset: local_fee_asset(),
			fees: self.fees(&[Base, Import, Export]),
			evm: None,
		};
		let evm = ChainConfig {
			alias: "JUNE".to_string(),
			id: local_evm_chain_id(),
			vm: VmKind::Evm,
			rpc_url: self.rpc_url.clone(),
			fee_asset: local_fee_asset(),
			fees: self.fees(&[EvmImport, EvmExport]),
			evm: Some(EvmChainConfig {
				chain_id: LOCAL_EVM_CHAIN_ID,
				atomic_denomination: 1_000_000_000,
				call_fee: self.evm_call_fee,
				wrapped_contract: Some(local_wrapped_contract()),
			}),
		};

		Config {
			network: NetworkConfig {
				id: self.network_id,
				hrp: self.hrp,
				name: "local".to_string(),
			},
			chains: vec![platform, jvm, evm],
			assets: vec![AssetConfig {
				id: local_fee_asset(),
				symbol: "JUNE".to_string(),
				decimals: 9,
			}],
			staking: StakingConfig {
				min_validator_stake: self.min_validator_stake,
				max_validator_stake: self.max_validator_stake,
				min_delegator_stake: self.min_delegator_stake,
				min_delegation_fee: 120_000,
				reward: self.reward,
			},
			execution: ExecutionConfig {
				poll_interval_ms: self.poll_interval_ms,
				timeout_ms: self.timeout_ms,
			},
			account: AccountConfig {
				private_key: SecretKey::new(self.private_key),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_build_is_valid() {
		let config = ConfigBuilder::new().build();
		assert!(config.validate().is_ok());
		assert_eq!(config.chains.len(), 3);
		assert_eq!(
			config.fee(&local_jvm_chain_id(), TransactionKind::Export),
			Some(1_000_000)
		);
		assert_eq!(config.chain("JUNE").unwrap().id, local_evm_chain_id());
	}

	#[test]
	fn test_overrides_apply() {
		let config = ConfigBuilder::new()
			.hrp("socotra")
			.fee(42)
			.execution(5, 50)
			.validator_stake_bounds(10, 20)
			.build();
		assert_eq!(config.network.hrp, "socotra");
		assert_eq!(config.platform_chain().unwrap().fee(TransactionKind::AddValidator), 42);
		assert_eq!(config.execution.timeout_ms, 50);
		assert_eq!(config.staking.max_validator_stake, 20);
	}

	#[test]
	fn test_inverted_stake_bounds_fail_validation() {
		let config = ConfigBuilder::new().validator_stake_bounds(20, 10).build();
		assert!(config.validate().is_err());
	}
}
