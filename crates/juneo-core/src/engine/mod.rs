//! Cross-chain orchestrator.
//!
//! The engine estimates operations and executes them leg by leg: build,
//! sign, verify, submit, then poll the leg's chain until the transaction is
//! final. A cross-chain move runs its import only after the export is
//! accepted. There is no rollback: a failed import leaves the operation in
//! `Error` with the export receipt accepted.

mod legs;

use crate::balance::BalanceProvider;
use crate::monitoring::{LegOutcome, TransactionMonitor};
use crate::operation::{EstimateContext, InputError, Operation, OperationSummary};
use crate::state::{ExecutableOperation, OperationStatus, StateError};
use juneo_account::{AccountError, Keychain};
use juneo_builder::BuildError;
use juneo_config::Config;
use juneo_delivery::{DeliveryError, DeliveryService, TransactionPayload};
use juneo_types::{
	current_timestamp, truncate_id, AssetId, BlockchainId, CodecError, TransactionId,
	TransactionStatus,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

/// Errors that can occur while estimating or executing operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Invalid input: {0}")]
	Input(#[from] InputError),
	#[error("Build error: {0}")]
	Build(#[from] BuildError),
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
	#[error("Delivery error: {0}")]
	Delivery(#[from] DeliveryError),
	#[error("Codec error: {0}")]
	Codec(#[from] CodecError),
	#[error("State error: {0}")]
	State(#[from] StateError),
	/// The balance provider reports less than the operation needs.
	#[error(
		"Insufficient balance of asset {asset_id} on {chain}: required {required}, available {available}"
	)]
	InsufficientBalance {
		chain: String,
		asset_id: AssetId,
		required: u128,
		available: u128,
	},
	/// Signing left these credential indices without valid signatures.
	#[error("Missing or invalid signatures for inputs {0:?}")]
	UnsignedInputs(Vec<usize>),
	#[error("Transaction {transaction_id} rejected by chain {chain}")]
	LegRejected {
		chain: BlockchainId,
		transaction_id: TransactionId,
	},
}

/// How one leg ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegResult {
	Accepted(TransactionId),
	TimedOut,
}

/// Orchestrates operations over the chains of one network.
#[derive(Clone)]
pub struct Engine {
	config: Arc<Config>,
	keychain: Arc<Keychain>,
	delivery: Arc<DeliveryService>,
	balances: Arc<dyn BalanceProvider>,
	monitor: TransactionMonitor,
}

impl Engine {
	pub fn new(
		config: Config,
		keychain: Keychain,
		delivery: Arc<DeliveryService>,
		balances: Arc<dyn BalanceProvider>,
	) -> Self {
		let monitor = TransactionMonitor::new(
			delivery.clone(),
			Duration::from_millis(config.execution.poll_interval_ms),
		);
		Self {
			config: Arc::new(config),
			keychain: Arc::new(keychain),
			delivery,
			balances,
			monitor,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn keychain(&self) -> &Keychain {
		&self.keychain
	}

	/// Estimates `operation` against current balances.
	pub async fn estimate(&self, operation: &Operation) -> Result<OperationSummary, EngineError> {
		let ctx = EstimateContext {
			config: &self.config,
			balances: self.balances.as_ref(),
			now: current_timestamp(),
		};
		operation.estimate(&ctx).await
	}

	/// Executes an operation to a terminal state.
	///
	/// Operations still in `Created` are estimated first. Returns the final
	/// status, `Done` or `Timeout`; any failure moves the operation to
	/// `Error` and is returned.
	#[instrument(skip_all, fields(operation_id = %truncate_id(&executable.id().to_string()), operation = executable.operation().name()))]
	pub async fn execute(
		&self,
		executable: &mut ExecutableOperation,
	) -> Result<OperationStatus, EngineError> {
		let deadline = Instant::now() + Duration::from_millis(self.config.execution.timeout_ms);

		if let Err(e) = self.prepare(executable).await {
			error!(error = %e, "Operation failed before execution");
			self.fail(executable);
			return Err(e);
		}

		let result = match self.run(executable, deadline).await {
			Ok(LegResult::Accepted(_)) => executable
				.transition(OperationStatus::Done)
				.map_err(EngineError::from),
			Ok(LegResult::TimedOut) => executable
				.transition(OperationStatus::Timeout)
				.map_err(EngineError::from),
			Err(e) => Err(e),
		};
		if let Err(e) = result {
			error!(error = %e, "Operation failed");
			self.fail(executable);
			return Err(e);
		}

		let status = executable.status();
		if status == OperationStatus::Done {
			info!(legs = executable.receipts().len(), "Operation done");
		} else {
			warn!(
				receipts = executable.receipts().len(),
				timeout_ms = self.config.execution.timeout_ms,
				"Operation timed out"
			);
		}
		Ok(status)
	}

	/// Re-checks parameters, plans unestimated operations and enters
	/// `Executing`.
	async fn prepare(&self, executable: &mut ExecutableOperation) -> Result<(), EngineError> {
		match executable.status() {
			OperationStatus::Created => {
				let summary = self.estimate(executable.operation()).await?;
				executable.plan(summary.legs.clone())?;
			},
			OperationStatus::Estimated => {
				executable
					.operation()
					.validate(&self.config, current_timestamp())?;
			},
			from => {
				return Err(StateError::InvalidTransition {
					from,
					to: OperationStatus::Executing,
				}
				.into())
			},
		}
		executable.transition(OperationStatus::Executing)?;
		Ok(())
	}

	fn fail(&self, executable: &mut ExecutableOperation) {
		if let Err(e) = executable.transition(OperationStatus::Error) {
			warn!(error = %e, status = %executable.status(), "Operation left unchanged");
		}
	}

	async fn run(
		&self,
		executable: &mut ExecutableOperation,
		deadline: Instant,
	) -> Result<LegResult, EngineError> {
		let operation = executable.operation().clone();
		match &operation {
			Operation::Send(send) => self.execute_send(executable, send, deadline).await,
			Operation::Cross(cross) => self.execute_cross(executable, cross, deadline).await,
			Operation::Wrap(wrap) => self.execute_wrap(executable, wrap, deadline).await,
			Operation::Unwrap(unwrap) => self.execute_unwrap(executable, unwrap, deadline).await,
			Operation::Validate(validate) => {
				self.execute_validate(executable, validate, deadline).await
			},
			Operation::Delegate(delegate) => {
				self.execute_delegate(executable, delegate, deadline).await
			},
		}
	}

	/// Submits one leg and follows it until it is final.
	#[instrument(skip_all, fields(chain = %truncate_id(&chain.to_string())))]
	async fn run_leg(
		&self,
		executable: &mut ExecutableOperation,
		chain: BlockchainId,
		payload: TransactionPayload,
		deadline: Instant,
	) -> Result<LegResult, EngineError> {
		if Instant::now() >= deadline {
			return Ok(LegResult::TimedOut);
		}
		let leg = executable.start_leg(chain)?;
		let tx_id = self.delivery.submit(&chain, payload).await?;
		info!(leg, tx_id = %truncate_id(&tx_id.to_string()), "Submitted leg");
		executable.set_transaction_id(leg, tx_id)?;

		let outcome = self
			.monitor
			.monitor(&chain, &tx_id, deadline, |status| {
				executable
					.set_transaction_status(leg, status)
					.map_err(EngineError::from)
			})
			.await?;

		match outcome {
			LegOutcome::Final(TransactionStatus::Accepted) => {
				self.balances.invalidate(&chain).await;
				info!(leg, "Leg accepted");
				Ok(LegResult::Accepted(tx_id))
			},
			LegOutcome::Final(status) => {
				self.balances.invalidate(&chain).await;
				error!(leg, status = ?status, "Leg rejected");
				Err(EngineError::LegRejected {
					chain,
					transaction_id: tx_id,
				})
			},
			LegOutcome::TimedOut => Ok(LegResult::TimedOut),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::balance::CachedBalanceProvider;
	use crate::operation::{
		CrossOperation, DelegateOperation, SendOperation, UnwrapOperation, WrapOperation,
	};
	use crate::testing::{owned_utxo, ScriptedChain};
	use juneo_config::builders::config::{
		local_evm_chain_id, local_fee_asset, local_jvm_chain_id, local_platform_chain_id,
		local_wrapped_contract, ConfigBuilder, LOCAL_PRIVATE_KEY,
	};
	use juneo_types::{Address, NodeId, SecretKey};

	const DAY: u64 = 86_400;

	struct Harness {
		engine: Engine,
		jvm: Arc<ScriptedChain>,
		platform: Arc<ScriptedChain>,
		evm: Arc<ScriptedChain>,
	}

	fn harness(timeout_ms: u64) -> Harness {
		let config = ConfigBuilder::new()
			.fee(1_000)
			.evm_call_fee(10)
			.execution(10, timeout_ms)
			.build();
		let keychain = Keychain::from_secret(SecretKey::new(LOCAL_PRIVATE_KEY)).unwrap();
		let owner = keychain.primary().address();

		let jvm = Arc::new(ScriptedChain::with_id_prefix(0xb0));
		jvm.set_utxos(vec![
			owned_utxo(1, 1_000_000, local_fee_asset(), owner),
			owned_utxo(2, 2_000_000, local_fee_asset(), owner),
		]);
		let platform = Arc::new(ScriptedChain::with_id_prefix(0xc0));
		platform.set_utxos(vec![owned_utxo(3, 5_000_000_000, local_fee_asset(), owner)]);
		let evm = Arc::new(ScriptedChain::with_id_prefix(0xe0));
		evm.set_evm_balance(10_000_000_000_000_000_000);

		let delivery = Arc::new(
			DeliveryService::default()
				.with_chain(local_jvm_chain_id(), jvm.clone())
				.with_chain(local_platform_chain_id(), platform.clone())
				.with_chain(local_evm_chain_id(), evm.clone()),
		);
		let balances = Arc::new(CachedBalanceProvider::new(
			delivery.clone(),
			&config,
			keychain.addresses(),
			keychain.primary().evm_address(),
		));
		Harness {
			engine: Engine::new(config, keychain, delivery, balances),
			jvm,
			platform,
			evm,
		}
	}

	fn cross_to(destination: BlockchainId, recipient: Address) -> Operation {
		Operation::Cross(CrossOperation {
			source: local_jvm_chain_id(),
			destination,
			asset_id: local_fee_asset(),
			amount: 100_000,
			recipient,
		})
	}

	#[tokio::test(start_paused = true)]
	async fn test_send_completes() {
		let h = harness(1_000);
		h.jvm.script(&[TransactionStatus::Pending, TransactionStatus::Accepted]);
		let op = Operation::Send(SendOperation {
			chain: local_jvm_chain_id(),
			asset_id: local_fee_asset(),
			amount: 500_000,
			recipient: Address::new([9; 20]),
		});

		let mut executable = h.engine.estimate(&op).await.unwrap().into_executable();
		let watcher = executable.subscribe();
		let status = h.engine.execute(&mut executable).await.unwrap();

		assert_eq!(status, OperationStatus::Done);
		assert_eq!(executable.receipts().len(), 1);
		assert!(executable.receipts()[0].is_accepted());
		assert_eq!(h.jvm.submitted().len(), 1);
		assert!(matches!(h.jvm.submitted()[0], TransactionPayload::Raw(_)));
		assert_eq!(watcher.borrow().status, OperationStatus::Done);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cross_exports_then_imports() {
		let h = harness(1_000);
		h.jvm.script(&[TransactionStatus::Pending, TransactionStatus::Accepted]);
		h.platform.script(&[TransactionStatus::Accepted]);
		let owner = h.engine.keychain().primary().address();

		let mut executable = h
			.engine
			.estimate(&cross_to(local_platform_chain_id(), owner))
			.await
			.unwrap()
			.into_executable();
		let status = h.engine.execute(&mut executable).await.unwrap();

		assert_eq!(status, OperationStatus::Done);
		let receipts = executable.receipts();
		assert_eq!(receipts.len(), 2);
		assert_eq!(receipts[0].chain_id, local_jvm_chain_id());
		assert_eq!(receipts[1].chain_id, local_platform_chain_id());
		assert!(receipts.iter().all(|r| r.is_accepted()));
		assert_eq!(h.jvm.submitted().len(), 1);
		assert_eq!(h.platform.submitted().len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cross_into_evm_uses_atomic_import() {
		let h = harness(1_000);
		let recipient = h.engine.keychain().primary().evm_address();

		let mut executable = h
			.engine
			.estimate(&cross_to(local_evm_chain_id(), recipient))
			.await
			.unwrap()
			.into_executable();
		let status = h.engine.execute(&mut executable).await.unwrap();

		assert_eq!(status, OperationStatus::Done);
		assert_eq!(h.evm.submitted().len(), 1);
		assert!(matches!(h.evm.submitted()[0], TransactionPayload::Raw(_)));
	}

	#[tokio::test(start_paused = true)]
	async fn test_rejected_import_leaves_export_accepted() {
		let h = harness(1_000);
		h.platform.script(&[TransactionStatus::Pending, TransactionStatus::Rejected]);
		let owner = h.engine.keychain().primary().address();

		let mut executable = h
			.engine
			.estimate(&cross_to(local_platform_chain_id(), owner))
			.await
			.unwrap()
			.into_executable();
		let err = h.engine.execute(&mut executable).await.unwrap_err();

		assert!(matches!(err, EngineError::LegRejected { chain, .. } if chain == local_platform_chain_id()));
		assert_eq!(executable.status(), OperationStatus::Error);
		let receipts = executable.receipts();
		assert!(receipts[0].is_accepted());
		assert_eq!(
			receipts[1].transaction_status,
			Some(TransactionStatus::Rejected)
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_deadline_times_out_with_pending_receipt() {
		let h = harness(1_000);
		h.jvm.script(&[TransactionStatus::Pending]);
		let owner = h.engine.keychain().primary().address();

		let mut executable = h
			.engine
			.estimate(&cross_to(local_platform_chain_id(), owner))
			.await
			.unwrap()
			.into_executable();
		let status = h.engine.execute(&mut executable).await.unwrap();

		assert_eq!(status, OperationStatus::Timeout);
		assert_eq!(executable.status(), OperationStatus::Timeout);
		assert_eq!(executable.receipts().len(), 1);
		assert_eq!(
			executable.receipts()[0].transaction_status,
			Some(TransactionStatus::Pending)
		);
		assert!(h.platform.submitted().is_empty());
	}

	#[tokio::test]
	async fn test_cross_zero_amount_never_submits() {
		let h = harness(1_000);
		let op = Operation::Cross(CrossOperation {
			source: local_jvm_chain_id(),
			destination: local_platform_chain_id(),
			asset_id: local_fee_asset(),
			amount: 0,
			recipient: Address::new([9; 20]),
		});

		let err = h.engine.estimate(&op).await.unwrap_err();
		assert_eq!(err.to_string(), "Invalid input: amount must be greater than 0");
		assert!(h.jvm.submitted().is_empty());
	}

	#[tokio::test]
	async fn test_delegate_below_minimum_fails_execution() {
		let h = harness(1_000);
		let start_time = current_timestamp() + 3_600;
		let op = Operation::Delegate(DelegateOperation {
			node_id: NodeId::new([5; 20]),
			amount: 1_000,
			start_time,
			end_time: start_time + 30 * DAY,
		});

		let mut executable = ExecutableOperation::new(op);
		let err = h.engine.execute(&mut executable).await.unwrap_err();

		assert!(matches!(
			err,
			EngineError::Input(InputError::StakeBelowMinimum {
				amount: 1_000,
				minimum: 1_000_000_000
			})
		));
		let message = err.to_string();
		assert!(message.contains("1000") && message.contains("1000000000"));
		assert_eq!(executable.status(), OperationStatus::Error);
		assert!(h.platform.submitted().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn test_delegate_from_created_operation() {
		let h = harness(1_000);
		let start_time = current_timestamp() + 3_600;
		let op = Operation::Delegate(DelegateOperation {
			node_id: NodeId::new([5; 20]),
			amount: 1_000_000_000,
			start_time,
			end_time: start_time + 30 * DAY,
		});

		let mut executable = ExecutableOperation::new(op);
		let status = h.engine.execute(&mut executable).await.unwrap();
		assert_eq!(status, OperationStatus::Done);
		assert_eq!(executable.legs().len(), 1);
		assert_eq!(h.platform.submitted().len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_unfinished_plan_ends_in_error() {
		let h = harness(1_000);
		let op = Operation::Send(SendOperation {
			chain: local_jvm_chain_id(),
			asset_id: local_fee_asset(),
			amount: 500_000,
			recipient: Address::new([9; 20]),
		});
		let leg = h.engine.estimate(&op).await.unwrap().legs[0].clone();
		// Planned two legs but a send only ever runs one.
		let mut executable = ExecutableOperation::estimated(op, vec![leg.clone(), leg]).unwrap();

		let err = h.engine.execute(&mut executable).await.unwrap_err();
		assert!(matches!(
			err,
			EngineError::State(StateError::Incomplete {
				accepted: 1,
				planned: 2
			})
		));
		assert_eq!(executable.status(), OperationStatus::Error);
		assert!(executable.status().is_terminal());
		assert_eq!(h.jvm.submitted().len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_status_errors_until_deadline_fail_the_operation() {
		let h = harness(100);
		h.jvm.fail_status_queries("node unavailable");
		let op = Operation::Send(SendOperation {
			chain: local_jvm_chain_id(),
			asset_id: local_fee_asset(),
			amount: 500_000,
			recipient: Address::new([9; 20]),
		});

		let mut executable = h.engine.estimate(&op).await.unwrap().into_executable();
		let err = h.engine.execute(&mut executable).await.unwrap_err();

		assert!(matches!(err, EngineError::Delivery(DeliveryError::Network(_))));
		assert!(err.to_string().contains("node unavailable"));
		assert_eq!(executable.status(), OperationStatus::Error);
		assert!(h.jvm.status_queries() > 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_wrap_and_unwrap_call_wrapped_contract() {
		let h = harness(1_000);
		for op in [
			Operation::Wrap(WrapOperation {
				chain: local_evm_chain_id(),
				amount: 1_000_000_000,
			}),
			Operation::Unwrap(UnwrapOperation {
				chain: local_evm_chain_id(),
				amount: 1_000_000_000,
			}),
		] {
			let mut executable = h.engine.estimate(&op).await.unwrap().into_executable();
			assert_eq!(
				h.engine.execute(&mut executable).await.unwrap(),
				OperationStatus::Done
			);
		}

		let submitted = h.evm.submitted();
		assert_eq!(submitted.len(), 2);
		match (&submitted[0], &submitted[1]) {
			(TransactionPayload::Evm(wrap), TransactionPayload::Evm(unwrap)) => {
				assert_eq!(wrap.to, local_wrapped_contract());
				assert_eq!(wrap.value, 1_000_000_000);
				assert_eq!(
					wrap.data,
					juneo_builder::evm::wrap(local_wrapped_contract(), 1).data
				);
				assert_eq!(unwrap.value, 0);
				assert_eq!(
					unwrap.data,
					juneo_builder::evm::unwrap(local_wrapped_contract(), 1_000_000_000).data
				);
			},
			other => panic!("unexpected payloads: {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_executed_operation_cannot_run_again() {
		let h = harness(1_000);
		let op = Operation::Send(SendOperation {
			chain: local_jvm_chain_id(),
			asset_id: local_fee_asset(),
			amount: 10,
			recipient: Address::new([9; 20]),
		});
		let mut executable = h.engine.estimate(&op).await.unwrap().into_executable();
		h.engine.execute(&mut executable).await.unwrap();

		let err = h.engine.execute(&mut executable).await.unwrap_err();
		assert!(matches!(err, EngineError::State(StateError::InvalidTransition { .. })));
		assert_eq!(executable.status(), OperationStatus::Done);
	}
}
