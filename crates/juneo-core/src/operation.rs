//! Typed operations and their estimation.
//!
//! An [`Operation`] is an immutable intent. Estimating it validates its
//! parameters, plans the chain legs it needs with their fees, checks the
//! account holds enough on every chain involved and, for staking, computes
//! the potential reward. Estimation never submits anything.

use crate::balance::BalanceProvider;
use crate::state::ExecutableOperation;
use crate::EngineError;
use juneo_builder::{reward, FeeData, FeeEngine};
use juneo_config::{ChainConfig, Config, REWARD_PRECISION};
use juneo_types::{Address, AssetId, BlockchainId, NodeId, TransactionKind, VmKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Caller-supplied parameters that violate a local rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
	#[error("amount must be greater than 0")]
	ZeroAmount,
	#[error("amount {0} exceeds the largest UTXO amount")]
	AmountTooLarge(u128),
	#[error("start time {start_time} must be in the future (now {now})")]
	StartTimeNotInFuture { start_time: u64, now: u64 },
	#[error("end time {end_time} must be after start time {start_time}")]
	EndBeforeStart { start_time: u64, end_time: u64 },
	#[error("stake period of {period}s must be between {minimum}s and {maximum}s")]
	StakePeriodOutOfRange { period: u64, minimum: u64, maximum: u64 },
	#[error("stake amount {amount} is below the minimum of {minimum}")]
	StakeBelowMinimum { amount: u64, minimum: u64 },
	#[error("stake amount {amount} is above the maximum of {maximum}")]
	StakeAboveMaximum { amount: u64, maximum: u64 },
	#[error("delegation fee {fee} must be between {minimum} and {maximum}")]
	DelegationFeeOutOfRange { fee: u32, minimum: u32, maximum: u32 },
	#[error("unknown chain {0}")]
	UnknownChain(String),
	#[error("source and destination are both {0}")]
	SameChain(String),
	#[error("moving funds from {from} to {to} is not supported")]
	UnsupportedChainPair { from: String, to: String },
	#[error("{operation} is not supported on chain {chain}")]
	UnsupportedChain { operation: String, chain: String },
	#[error("asset {asset_id} cannot be moved on chain {chain}")]
	UnsupportedAsset { asset_id: AssetId, chain: String },
}

/// Sends `amount` of `asset_id` to `recipient` on one chain.
///
/// On EVM chains only the gas asset can be sent and `amount` is in wei.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOperation {
	pub chain: BlockchainId,
	pub asset_id: AssetId,
	pub amount: u128,
	pub recipient: Address,
}

/// Moves `amount` of `asset_id` from `source` to `recipient` on
/// `destination`, through an export and an import.
///
/// The amount is in atomic units; `recipient` is an EVM address when the
/// destination is an EVM chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossOperation {
	pub source: BlockchainId,
	pub destination: BlockchainId,
	pub asset_id: AssetId,
	pub amount: u64,
	pub recipient: Address,
}

/// Deposits `amount` wei of gas token into the chain's wrapped token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapOperation {
	pub chain: BlockchainId,
	pub amount: u128,
}

/// Withdraws `amount` wei of gas token from the chain's wrapped token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwrapOperation {
	pub chain: BlockchainId,
	pub amount: u128,
}

/// Stakes `amount` on the platform chain as validator `node_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateOperation {
	pub node_id: NodeId,
	pub amount: u64,
	pub start_time: u64,
	pub end_time: u64,
	/// Fee charged to delegators, in millionths.
	pub delegation_fee: u32,
}

/// Delegates `amount` on the platform chain to validator `node_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateOperation {
	pub node_id: NodeId,
	pub amount: u64,
	pub start_time: u64,
	pub end_time: u64,
}

/// An intent of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
	Send(SendOperation),
	Cross(CrossOperation),
	Wrap(WrapOperation),
	Unwrap(UnwrapOperation),
	Validate(ValidateOperation),
	Delegate(DelegateOperation),
}

/// What a leg submits to its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
	Base,
	Export,
	Import,
	EvmExport,
	EvmImport,
	/// Call signed by the EVM wallet.
	EvmCall,
	AddValidator,
	AddDelegator,
}

impl LegKind {
	/// Transaction kind keying the fee schedule, `None` for EVM calls.
	pub fn transaction_kind(&self) -> Option<TransactionKind> {
		match self {
			LegKind::Base => Some(TransactionKind::Base),
			LegKind::Export => Some(TransactionKind::Export),
			LegKind::Import => Some(TransactionKind::Import),
			LegKind::EvmExport => Some(TransactionKind::EvmExport),
			LegKind::EvmImport => Some(TransactionKind::EvmImport),
			LegKind::AddValidator => Some(TransactionKind::AddValidator),
			LegKind::AddDelegator => Some(TransactionKind::AddDelegator),
			LegKind::EvmCall => None,
		}
	}
}

impl fmt::Display for LegKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.transaction_kind() {
			Some(kind) => fmt::Display::fmt(&kind, f),
			None => f.write_str("evm_call"),
		}
	}
}

/// One planned chain transaction of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
	pub chain_id: BlockchainId,
	pub kind: LegKind,
	/// Fee in atomic units of the chain's fee asset.
	pub fee: FeeData,
}

/// Result of estimating an operation.
#[derive(Debug)]
pub struct OperationSummary {
	pub operation: Operation,
	/// Legs in execution order, each with the fee owed on its chain.
	pub legs: Vec<Leg>,
	/// Potential staking reward; zero for other operations.
	pub reward: u64,
	executable: ExecutableOperation,
}

impl OperationSummary {
	/// Total fees per asset over every leg.
	pub fn fees(&self) -> Vec<FeeData> {
		let mut totals: BTreeMap<AssetId, u64> = BTreeMap::new();
		for leg in &self.legs {
			let total = totals.entry(leg.fee.asset_id).or_insert(0);
			*total = total.saturating_add(leg.fee.amount);
		}
		totals
			.into_iter()
			.map(|(asset_id, amount)| FeeData::new(asset_id, amount))
			.collect()
	}

	/// Fees owed on `chain`.
	pub fn chain_fees(&self, chain: &BlockchainId) -> Vec<FeeData> {
		self.legs
			.iter()
			.filter(|leg| leg.chain_id == *chain)
			.map(|leg| leg.fee)
			.collect()
	}

	pub fn executable(&self) -> &ExecutableOperation {
		&self.executable
	}

	/// Takes the executable operation, ready for the engine.
	pub fn into_executable(self) -> ExecutableOperation {
		self.executable
	}
}

/// What estimation reads.
pub struct EstimateContext<'a> {
	pub config: &'a Config,
	pub balances: &'a dyn BalanceProvider,
	/// Unix time start times are checked against.
	pub now: u64,
}

/// Legs and per-chain funding an operation needs.
pub(crate) struct Plan {
	pub legs: Vec<Leg>,
	/// Amount needed per chain and asset, in the chain's native unit.
	pub required: BTreeMap<(BlockchainId, AssetId), u128>,
	pub reward: u64,
}

impl Plan {
	fn new() -> Self {
		Self {
			legs: Vec::new(),
			required: BTreeMap::new(),
			reward: 0,
		}
	}

	fn leg(&mut self, chain_id: BlockchainId, kind: LegKind, fee: FeeData) {
		self.legs.push(Leg { chain_id, kind, fee });
	}

	fn require(&mut self, chain: BlockchainId, asset_id: AssetId, amount: u128) {
		if amount == 0 {
			return;
		}
		let total = self.required.entry((chain, asset_id)).or_insert(0);
		*total = total.saturating_add(amount);
	}
}

/// Converts atomic units to the chain's native balance unit.
pub(crate) fn to_native(chain: &ChainConfig, atomic: u64) -> u128 {
	match &chain.evm {
		Some(evm) => u128::from(atomic) * u128::from(evm.atomic_denomination),
		None => u128::from(atomic),
	}
}

pub(crate) fn chain<'c>(config: &'c Config, id: &BlockchainId) -> Result<&'c ChainConfig, InputError> {
	config
		.chain_by_id(id)
		.ok_or_else(|| InputError::UnknownChain(id.to_string()))
}

pub(crate) fn platform(config: &Config) -> Result<&ChainConfig, InputError> {
	config
		.platform_chain()
		.ok_or_else(|| InputError::UnknownChain("platform".to_string()))
}

fn evm_gas_asset(chain: &ChainConfig, asset_id: &AssetId) -> Result<(), InputError> {
	if chain.vm == VmKind::Evm && chain.fee_asset != *asset_id {
		return Err(InputError::UnsupportedAsset {
			asset_id: *asset_id,
			chain: chain.alias.clone(),
		});
	}
	Ok(())
}

pub(crate) fn wrapped_contract(chain: &ChainConfig, operation: &str) -> Result<Address, InputError> {
	chain
		.evm
		.as_ref()
		.and_then(|evm| evm.wrapped_contract)
		.ok_or_else(|| InputError::UnsupportedChain {
			operation: operation.to_string(),
			chain: chain.alias.clone(),
		})
}

fn validate_stake_window(
	config: &Config,
	start_time: u64,
	end_time: u64,
	now: u64,
) -> Result<(), InputError> {
	if start_time <= now {
		return Err(InputError::StartTimeNotInFuture { start_time, now });
	}
	if end_time <= start_time {
		return Err(InputError::EndBeforeStart {
			start_time,
			end_time,
		});
	}
	let reward = &config.staking.reward;
	let period = end_time - start_time;
	if period < reward.min_stake_period || period > reward.max_stake_period {
		return Err(InputError::StakePeriodOutOfRange {
			period,
			minimum: reward.min_stake_period,
			maximum: reward.max_stake_period,
		});
	}
	Ok(())
}

fn validate_stake_amount(amount: u64, minimum: u64, maximum: u64) -> Result<(), InputError> {
	if amount < minimum {
		return Err(InputError::StakeBelowMinimum { amount, minimum });
	}
	if amount > maximum {
		return Err(InputError::StakeAboveMaximum { amount, maximum });
	}
	Ok(())
}

/// Chains, fees and exported amounts of a cross-chain move.
pub(crate) struct CrossRoute<'c> {
	pub source: &'c ChainConfig,
	pub destination: &'c ChainConfig,
	pub export_kind: LegKind,
	pub import_kind: LegKind,
	pub export_fee: FeeData,
	pub import_fee: FeeData,
	/// Outputs the export leg creates for the destination, per asset.
	///
	/// The import fee travels with the funds: it is added to the moved asset
	/// when they match, and exported separately from UTXO chains otherwise.
	pub exported: Vec<(AssetId, u64)>,
}

impl CrossOperation {
	fn chains<'c>(
		&self,
		config: &'c Config,
	) -> Result<(&'c ChainConfig, &'c ChainConfig), InputError> {
		if self.amount == 0 {
			return Err(InputError::ZeroAmount);
		}
		if self.source == self.destination {
			return Err(InputError::SameChain(self.source.to_string()));
		}
		let source = chain(config, &self.source)?;
		let destination = chain(config, &self.destination)?;
		if source.vm == VmKind::Evm && destination.vm == VmKind::Evm {
			return Err(InputError::UnsupportedChainPair {
				from: source.alias.clone(),
				to: destination.alias.clone(),
			});
		}
		evm_gas_asset(source, &self.asset_id)?;
		Ok((source, destination))
	}

	pub(crate) fn route<'c>(&self, config: &'c Config) -> Result<CrossRoute<'c>, EngineError> {
		let (source, destination) = self.chains(config)?;
		let (export_kind, export_schedule) = match source.vm {
			VmKind::Evm => (LegKind::EvmExport, TransactionKind::EvmExport),
			VmKind::Platform | VmKind::Jvm => (LegKind::Export, TransactionKind::Export),
		};
		let (import_kind, import_schedule) = match destination.vm {
			VmKind::Evm => (LegKind::EvmImport, TransactionKind::EvmImport),
			VmKind::Platform | VmKind::Jvm => (LegKind::Import, TransactionKind::Import),
		};
		let fees = FeeEngine::new(config);
		let export_fee = fees.fee(&source.id, export_schedule)?;
		let import_fee = fees.fee(&destination.id, import_schedule)?;

		let mut exported = vec![(self.asset_id, self.amount)];
		if import_fee.asset_id == self.asset_id {
			exported[0].1 = self
				.amount
				.checked_add(import_fee.amount)
				.ok_or(InputError::AmountTooLarge(u128::from(self.amount)))?;
		} else if import_fee.amount > 0 && source.vm != VmKind::Evm {
			exported.push((import_fee.asset_id, import_fee.amount));
		}

		Ok(CrossRoute {
			source,
			destination,
			export_kind,
			import_kind,
			export_fee,
			import_fee,
			exported,
		})
	}
}

impl Operation {
	pub fn name(&self) -> &'static str {
		match self {
			Operation::Send(_) => "send",
			Operation::Cross(_) => "cross",
			Operation::Wrap(_) => "wrap",
			Operation::Unwrap(_) => "unwrap",
			Operation::Validate(_) => "validate",
			Operation::Delegate(_) => "delegate",
		}
	}

	/// Checks parameters against local rules only.
	pub fn validate(&self, config: &Config, now: u64) -> Result<(), InputError> {
		match self {
			Operation::Send(send) => {
				if send.amount == 0 {
					return Err(InputError::ZeroAmount);
				}
				let chain = chain(config, &send.chain)?;
				match chain.vm {
					VmKind::Evm => evm_gas_asset(chain, &send.asset_id),
					VmKind::Platform | VmKind::Jvm => u64::try_from(send.amount)
						.map(|_| ())
						.map_err(|_| InputError::AmountTooLarge(send.amount)),
				}
			},
			Operation::Cross(cross) => cross.chains(config).map(|_| ()),
			Operation::Wrap(WrapOperation { chain: id, amount })
			| Operation::Unwrap(UnwrapOperation { chain: id, amount }) => {
				if *amount == 0 {
					return Err(InputError::ZeroAmount);
				}
				wrapped_contract(chain(config, id)?, self.name()).map(|_| ())
			},
			Operation::Validate(validate) => {
				if validate.amount == 0 {
					return Err(InputError::ZeroAmount);
				}
				platform(config)?;
				validate_stake_window(config, validate.start_time, validate.end_time, now)?;
				validate_stake_amount(
					validate.amount,
					config.staking.min_validator_stake,
					config.staking.max_validator_stake,
				)?;
				let maximum = REWARD_PRECISION as u32;
				if validate.delegation_fee < config.staking.min_delegation_fee
					|| validate.delegation_fee > maximum
				{
					return Err(InputError::DelegationFeeOutOfRange {
						fee: validate.delegation_fee,
						minimum: config.staking.min_delegation_fee,
						maximum,
					});
				}
				Ok(())
			},
			Operation::Delegate(delegate) => {
				if delegate.amount == 0 {
					return Err(InputError::ZeroAmount);
				}
				platform(config)?;
				validate_stake_window(config, delegate.start_time, delegate.end_time, now)?;
				// Delegations are held to the validator minimum as well.
				let minimum = config
					.staking
					.min_validator_stake
					.max(config.staking.min_delegator_stake);
				validate_stake_amount(delegate.amount, minimum, config.staking.max_validator_stake)
			},
		}
	}

	/// Plans legs, fees and the funds each chain must hold.
	pub(crate) fn plan(&self, config: &Config) -> Result<Plan, EngineError> {
		let fees = FeeEngine::new(config);
		let mut plan = Plan::new();
		match self {
			Operation::Send(send) => {
				let chain = chain(config, &send.chain)?;
				match chain.vm {
					VmKind::Evm => {
						let fee = fees.evm_call_fee(&chain.id)?;
						plan.leg(chain.id, LegKind::EvmCall, fee);
						plan.require(chain.id, send.asset_id, send.amount);
						plan.require(chain.id, fee.asset_id, to_native(chain, fee.amount));
					},
					VmKind::Platform | VmKind::Jvm => {
						let fee = fees.fee(&chain.id, TransactionKind::Base)?;
						plan.leg(chain.id, LegKind::Base, fee);
						plan.require(chain.id, send.asset_id, send.amount);
						plan.require(chain.id, fee.asset_id, u128::from(fee.amount));
					},
				}
			},
			Operation::Cross(cross) => {
				let route = cross.route(config)?;
				let (source, destination) = (route.source, route.destination);
				plan.leg(source.id, route.export_kind, route.export_fee);
				plan.leg(destination.id, route.import_kind, route.import_fee);
				for (asset_id, amount) in &route.exported {
					plan.require(source.id, *asset_id, to_native(source, *amount));
				}
				plan.require(
					source.id,
					route.export_fee.asset_id,
					to_native(source, route.export_fee.amount),
				);
				let import_fee_exported = route
					.exported
					.iter()
					.any(|(asset_id, _)| *asset_id == route.import_fee.asset_id);
				if !import_fee_exported {
					plan.require(
						destination.id,
						route.import_fee.asset_id,
						to_native(destination, route.import_fee.amount),
					);
				}
			},
			Operation::Wrap(wrap) => {
				let chain = chain(config, &wrap.chain)?;
				let fee = fees.evm_call_fee(&chain.id)?;
				plan.leg(chain.id, LegKind::EvmCall, fee);
				plan.require(chain.id, chain.fee_asset, wrap.amount);
				plan.require(chain.id, fee.asset_id, to_native(chain, fee.amount));
			},
			Operation::Unwrap(unwrap) => {
				let chain = chain(config, &unwrap.chain)?;
				let fee = fees.evm_call_fee(&chain.id)?;
				plan.leg(chain.id, LegKind::EvmCall, fee);
				plan.require(chain.id, fee.asset_id, to_native(chain, fee.amount));
			},
			Operation::Validate(ValidateOperation {
				amount,
				start_time,
				end_time,
				..
			}) => {
				let platform = platform(config)?;
				let fee = fees.fee(&platform.id, TransactionKind::AddValidator)?;
				plan.leg(platform.id, LegKind::AddValidator, fee);
				plan.require(platform.id, platform.fee_asset, u128::from(*amount));
				plan.require(platform.id, fee.asset_id, u128::from(fee.amount));
				plan.reward = reward::reward(
					&config.staking.reward,
					end_time - start_time,
					*start_time,
					*amount,
				);
			},
			Operation::Delegate(DelegateOperation {
				amount,
				start_time,
				end_time,
				..
			}) => {
				let platform = platform(config)?;
				let fee = fees.fee(&platform.id, TransactionKind::AddDelegator)?;
				plan.leg(platform.id, LegKind::AddDelegator, fee);
				plan.require(platform.id, platform.fee_asset, u128::from(*amount));
				plan.require(platform.id, fee.asset_id, u128::from(fee.amount));
				plan.reward = reward::reward(
					&config.staking.reward,
					end_time - start_time,
					*start_time,
					*amount,
				);
			},
		}
		Ok(plan)
	}

	/// Validates, plans and checks funds, returning a summary whose
	/// executable operation is in `Estimated`.
	pub async fn estimate(&self, ctx: &EstimateContext<'_>) -> Result<OperationSummary, EngineError> {
		self.validate(ctx.config, ctx.now)?;
		let plan = self.plan(ctx.config)?;

		for ((chain_id, asset_id), required) in &plan.required {
			let available = ctx.balances.get_balance(chain_id, asset_id).await?;
			if available < *required {
				let chain = chain(ctx.config, chain_id)?;
				return Err(EngineError::InsufficientBalance {
					chain: chain.alias.clone(),
					asset_id: *asset_id,
					required: *required,
					available,
				});
			}
		}
		debug!(operation = self.name(), legs = plan.legs.len(), reward = plan.reward, "Estimated operation");

		let executable = ExecutableOperation::estimated(self.clone(), plan.legs.clone())?;
		Ok(OperationSummary {
			operation: self.clone(),
			legs: plan.legs,
			reward: plan.reward,
			executable,
		})
	}
}
