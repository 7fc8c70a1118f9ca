//! Configuration module for the Juneo operation engine.
//!
//! Describes the network the engine talks to: its chains and their RPC
//! endpoints, per-kind fee schedules, the asset registry, staking bounds and
//! reward parameters, polling deadlines and the signing key. Configuration is
//! loaded from TOML with `${VAR}` / `${VAR:-default}` environment
//! substitution and validated before use. A `Config` is always constructed
//! explicitly and passed to the crates that need it.

#[cfg(any(test, feature = "testing"))]
pub mod builders {
	pub mod config;
}

use juneo_types::{
	amount::MAX_DECIMALS, Address, AssetId, BlockchainId, SecretKey, TransactionKind, VmKind,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Fixed-point precision of reward rates and shares: 1 000 000 = 100%.
pub const REWARD_PRECISION: u64 = 1_000_000;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub network: NetworkConfig,
	pub chains: Vec<ChainConfig>,
	pub assets: Vec<AssetConfig>,
	pub staking: StakingConfig,
	#[serde(default)]
	pub execution: ExecutionConfig,
	pub account: AccountConfig,
}

/// Network identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// Numeric network id written into every transaction.
	pub id: u32,
	/// Human-readable part of bech32 addresses, e.g. `socotra`.
	pub hrp: String,
	#[serde(default)]
	pub name: String,
}

/// One chain of the network.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Short name used by node APIs and in address prefixes, e.g. `P`.
	pub alias: String,
	pub id: BlockchainId,
	pub vm: VmKind,
	/// Base URL of the node serving this chain; API paths are derived per VM.
	pub rpc_url: String,
	/// Asset burned as transaction fee on this chain.
	pub fee_asset: AssetId,
	/// Static fee per transaction kind, in the fee asset's smallest unit.
	#[serde(default)]
	pub fees: BTreeMap<TransactionKind, u64>,
	/// Present for EVM chains only.
	#[serde(default)]
	pub evm: Option<EvmChainConfig>,
}

impl ChainConfig {
	/// Fee for `kind`, zero when the schedule has no entry.
	pub fn fee(&self, kind: TransactionKind) -> u64 {
		self.fees.get(&kind).copied().unwrap_or(0)
	}
}

/// EVM-specific chain parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvmChainConfig {
	/// EIP-155 chain id.
	pub chain_id: u64,
	/// EVM balance units per atomic (UTXO) unit of the gas asset.
	#[serde(default = "default_atomic_denomination")]
	pub atomic_denomination: u64,
	/// Flat fee charged for a contract call, in atomic units of the gas asset.
	#[serde(default)]
	pub call_fee: u64,
	/// Wrapped gas token contract used by wrap and unwrap.
	#[serde(default)]
	pub wrapped_contract: Option<Address>,
}

fn default_atomic_denomination() -> u64 {
	1_000_000_000
}

/// Registry entry for an asset.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
	pub id: AssetId,
	pub symbol: String,
	pub decimals: u8,
}

/// Staking bounds and reward curve, applied on the platform chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StakingConfig {
	pub min_validator_stake: u64,
	pub max_validator_stake: u64,
	pub min_delegator_stake: u64,
	/// Lowest delegation fee a validator may set, in millionths.
	#[serde(default)]
	pub min_delegation_fee: u32,
	pub reward: RewardConfig,
}

/// Parameters of the staking reward curve.
///
/// Rates are in millionths. Times are Unix seconds, periods are seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RewardConfig {
	pub min_stake_period: u64,
	pub max_stake_period: u64,
	/// Share of the rate that depends on the stake period.
	pub stake_period_reward_share: u64,
	pub start_reward_time: u64,
	pub start_reward: u64,
	pub diminishing_reward_time: u64,
	pub diminishing_reward: u64,
	pub target_reward_time: u64,
	pub target_reward: u64,
}

/// Polling cadence and deadline for executing operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
}

impl Default for ExecutionConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: default_poll_interval_ms(),
			timeout_ms: default_timeout_ms(),
		}
	}
}

fn default_poll_interval_ms() -> u64 {
	1_000
}

fn default_timeout_ms() -> u64 {
	120_000
}

/// Signing key of the local account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	pub private_key: SecretKey,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};
		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Looks a chain up by alias or by its id text (CB58 or hex).
	pub fn chain(&self, id_or_alias: &str) -> Option<&ChainConfig> {
		self.chains
			.iter()
			.find(|chain| chain.alias == id_or_alias)
			.or_else(|| self.chains.iter().find(|chain| chain.id.matches(id_or_alias)))
	}

	pub fn chain_by_id(&self, id: &BlockchainId) -> Option<&ChainConfig> {
		self.chains.iter().find(|chain| chain.id == *id)
	}

	/// The platform chain, which hosts staking.
	pub fn platform_chain(&self) -> Option<&ChainConfig> {
		self.chains.iter().find(|chain| chain.vm == VmKind::Platform)
	}

	pub fn asset(&self, id: &AssetId) -> Option<&AssetConfig> {
		self.assets.iter().find(|asset| asset.id == *id)
	}

	/// Static fee for `kind` on `chain`.
	pub fn fee(&self, chain: &BlockchainId, kind: TransactionKind) -> Option<u64> {
		self.chain_by_id(chain).map(|c| c.fee(kind))
	}

	/// Validates the configuration after parsing.
	///
	/// - Chain aliases and ids are unique, exactly one platform chain exists
	/// - Fee assets are registered and EVM chains carry EVM parameters
	/// - Staking bounds, reward times and rates are ordered and in range
	/// - The poll interval is shorter than the execution timeout
	fn validate(&self) -> Result<(), ConfigError> {
		if self.network.hrp.is_empty() {
			return Err(ConfigError::Validation("Network hrp cannot be empty".into()));
		}
		if self.chains.is_empty() {
			return Err(ConfigError::Validation(
				"At least one chain must be configured".into(),
			));
		}

		let mut aliases = HashSet::new();
		let mut ids = HashSet::new();
		for chain in &self.chains {
			if !aliases.insert(chain.alias.as_str()) {
				return Err(ConfigError::Validation(format!(
					"Duplicate chain alias '{}'",
					chain.alias
				)));
			}
			if !ids.insert(chain.id) {
				return Err(ConfigError::Validation(format!(
					"Duplicate chain id {} for '{}'",
					chain.id, chain.alias
				)));
			}
			if chain.rpc_url.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Chain '{}' has no rpc_url",
					chain.alias
				)));
			}
			if self.asset(&chain.fee_asset).is_none() {
				return Err(ConfigError::Validation(format!(
					"Fee asset {} of chain '{}' is not in the asset registry",
					chain.fee_asset, chain.alias
				)));
			}
			match (&chain.vm, &chain.evm) {
				(VmKind::Evm, None) => {
					return Err(ConfigError::Validation(format!(
						"EVM chain '{}' requires an [evm] section",
						chain.alias
					)));
				},
				(VmKind::Evm, Some(evm)) if evm.atomic_denomination == 0 => {
					return Err(ConfigError::Validation(format!(
						"EVM chain '{}' atomic_denomination must be positive",
						chain.alias
					)));
				},
				(VmKind::Platform | VmKind::Jvm, Some(_)) => {
					return Err(ConfigError::Validation(format!(
						"Chain '{}' is not an EVM chain but has an [evm] section",
						chain.alias
					)));
				},
				_ => {},
			}
		}

		let platform_chains = self
			.chains
			.iter()
			.filter(|chain| chain.vm == VmKind::Platform)
			.count();
		if platform_chains != 1 {
			return Err(ConfigError::Validation(format!(
				"Exactly one platform chain is required, found {}",
				platform_chains
			)));
		}

		for asset in &self.assets {
			if asset.decimals > MAX_DECIMALS {
				return Err(ConfigError::Validation(format!(
					"Asset {} has {} decimals (max {})",
					asset.symbol, asset.decimals, MAX_DECIMALS
				)));
			}
		}

		self.validate_staking()?;

		if self.execution.poll_interval_ms == 0
			|| self.execution.poll_interval_ms >= self.execution.timeout_ms
		{
			return Err(ConfigError::Validation(format!(
				"poll_interval_ms ({}) must be positive and below timeout_ms ({})",
				self.execution.poll_interval_ms, self.execution.timeout_ms
			)));
		}

		if self.account.private_key.is_empty() {
			return Err(ConfigError::Validation(
				"Account private_key cannot be empty".into(),
			));
		}

		Ok(())
	}

	fn validate_staking(&self) -> Result<(), ConfigError> {
		let staking = &self.staking;
		if staking.min_validator_stake > staking.max_validator_stake {
			return Err(ConfigError::Validation(format!(
				"min_validator_stake ({}) exceeds max_validator_stake ({})",
				staking.min_validator_stake, staking.max_validator_stake
			)));
		}
		if u64::from(staking.min_delegation_fee) > REWARD_PRECISION {
			return Err(ConfigError::Validation(
				"min_delegation_fee cannot exceed 1000000".into(),
			));
		}

		let reward = &staking.reward;
		if reward.min_stake_period >= reward.max_stake_period {
			return Err(ConfigError::Validation(format!(
				"min_stake_period ({}) must be below max_stake_period ({})",
				reward.min_stake_period, reward.max_stake_period
			)));
		}
		if !(reward.start_reward_time <= reward.diminishing_reward_time
			&& reward.diminishing_reward_time <= reward.target_reward_time)
		{
			return Err(ConfigError::Validation(
				"Reward times must satisfy start <= diminishing <= target".into(),
			));
		}
		let rates = [
			("stake_period_reward_share", reward.stake_period_reward_share),
			("start_reward", reward.start_reward),
			("diminishing_reward", reward.diminishing_reward),
			("target_reward", reward.target_reward),
		];
		for (name, rate) in rates {
			if rate > REWARD_PRECISION {
				return Err(ConfigError::Validation(format!(
					"{} ({}) cannot exceed {}",
					name, rate, REWARD_PRECISION
				)));
			}
		}
		Ok(())
	}
}

/// Parses TOML, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const FEE_ASSET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

	fn sample_config() -> String {
		format!(
			r#"
[network]
id = 12345
hrp = "local"

[[chains]]
alias = "P"
id = "11111111111111111111111111111111LpoYY"
vm = "platform"
rpc_url = "${{TEST_JUNEO_RPC:-http://127.0.0.1:9650}}"
fee_asset = "{asset}"
[chains.fees]
base = 1000000
import = 1000000
export = 1000000

[[chains]]
alias = "JUNE"
id = "0x0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e"
vm = "evm"
rpc_url = "http://127.0.0.1:9650"
fee_asset = "{asset}"
[chains.evm]
chain_id = 45003
call_fee = 500000

[[assets]]
id = "{asset}"
symbol = "JUNE"
decimals = 9

[staking]
min_validator_stake = 100
max_validator_stake = 1000
min_delegator_stake = 10

[staking.reward]
min_stake_period = 86400
max_stake_period = 31536000
stake_period_reward_share = 500000
start_reward_time = 0
start_reward = 215000
diminishing_reward_time = 100
diminishing_reward = 190000
target_reward_time = 200
target_reward = 150000

[execution]
poll_interval_ms = 50
timeout_ms = 5000

[account]
private_key = "${{TEST_JUNEO_KEY:-0x56289e99c94b6912bfc12adc093c9b51124f0dc54ac7a766b2bc5ccf558d8027}}"
"#,
			asset = FEE_ASSET
		)
	}

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TEST_JUNEO_HOST", "localhost");
		std::env::set_var("TEST_JUNEO_PORT", "9650");

		let input = "url = \"http://${TEST_JUNEO_HOST}:${TEST_JUNEO_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:9650\"");

		std::env::remove_var("TEST_JUNEO_HOST");
		std::env::remove_var("TEST_JUNEO_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MISSING_JUNEO_VAR:-fallback}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${MISSING_JUNEO_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("MISSING_JUNEO_VAR"));
	}

	#[test]
	fn test_parse_sample_config() {
		let config: Config = sample_config().parse().unwrap();
		assert_eq!(config.network.id, 12345);
		assert_eq!(config.chains.len(), 2);

		let platform = config.platform_chain().unwrap();
		assert_eq!(platform.alias, "P");
		assert!(platform.id.is_empty());
		assert_eq!(platform.fee(TransactionKind::Export), 1_000_000);
		assert_eq!(platform.fee(TransactionKind::AddDelegator), 0);
		assert_eq!(platform.rpc_url, "http://127.0.0.1:9650");

		let evm = config.chain("JUNE").unwrap();
		assert_eq!(evm.evm.as_ref().unwrap().atomic_denomination, 1_000_000_000);
		assert_eq!(config.chain(&evm.id.to_string()).unwrap().alias, "JUNE");
		assert!(config.chain("X").is_none());

		assert_eq!(config.execution.poll_interval_ms, 50);
		assert_eq!(config.staking.reward.target_reward, 150_000);
		assert_eq!(config.asset(&platform.fee_asset).unwrap().decimals, 9);
	}

	#[test]
	fn test_duplicate_alias_rejected() {
		let text = sample_config().replace("alias = \"JUNE\"", "alias = \"P\"");
		let err = text.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Duplicate chain alias"));
	}

	#[test]
	fn test_unknown_fee_asset_rejected() {
		let text = sample_config().replacen(
			&format!("fee_asset = \"{}\"", FEE_ASSET),
			&format!("fee_asset = \"0x{}\"", "bb".repeat(32)),
			1,
		);
		let err = text.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("not in the asset registry"));
	}

	#[test]
	fn test_evm_chain_requires_evm_section() {
		let text = sample_config().replace("[chains.evm]\nchain_id = 45003\ncall_fee = 500000\n", "");
		let err = text.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("requires an [evm] section"));
	}

	#[test]
	fn test_reward_times_must_be_ordered() {
		let text = sample_config().replace("target_reward_time = 200", "target_reward_time = 50");
		let err = text.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Reward times"));
	}

	#[test]
	fn test_poll_interval_must_be_below_timeout() {
		let text = sample_config().replace("timeout_ms = 5000", "timeout_ms = 50");
		assert!(matches!(
			text.parse::<Config>(),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_invalid_identifier_is_parse_error() {
		let text = sample_config().replace("0x0e0e", "0xzz0e");
		assert!(matches!(text.parse::<Config>(), Err(ConfigError::Parse(_))));
	}

	#[tokio::test]
	async fn test_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(sample_config().as_bytes()).unwrap();

		let config = Config::from_file(file.path()).await.unwrap();
		assert_eq!(config.network.hrp, "local");
		assert_eq!(
			config.account.private_key.to_bytes().unwrap()[0],
			0x56
		);
	}

	#[tokio::test]
	async fn test_from_missing_file() {
		let result = Config::from_file("/nonexistent/juneo.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}
}
