//! Per-operation leg construction.

use super::{Engine, EngineError, LegResult};
use crate::operation::{
	self, CrossOperation, DelegateOperation, InputError, Leg, SendOperation, UnwrapOperation,
	ValidateOperation, WrapOperation,
};
use crate::state::{ExecutableOperation, StateError};
use juneo_account::verify_signatures;
use juneo_builder::evm::{self, EvmCallData};
use juneo_builder::transactions::{
	build_add_delegator_transaction, build_add_validator_transaction, build_base_transaction,
	build_evm_export_transaction, build_evm_import_transaction, build_export_transaction,
	build_import_transaction,
};
use juneo_builder::{BuildError, FeeData, UtxoContext};
use juneo_config::ChainConfig;
use juneo_delivery::{EvmCall, TransactionPayload};
use juneo_types::{
	current_timestamp, Address, AssetId, OutputOwners, Secp256k1Output, SignedTransaction, Transaction,
	TransferableOutput, UtxoSet, Validator, VmKind,
};
use tokio::time::Instant;
use tracing::debug;

fn leg_fee(legs: &[Leg], index: usize) -> Result<FeeData, EngineError> {
	legs.get(index)
		.map(|leg| leg.fee)
		.ok_or_else(|| StateError::UnknownLeg(index).into())
}

fn evm_payload(call: EvmCallData) -> TransactionPayload {
	TransactionPayload::Evm(EvmCall {
		to: call.to,
		value: call.value,
		data: call.data,
		gas_limit: Some(call.gas_limit),
	})
}

fn owned_output(asset_id: AssetId, amount: u64, owner: Address) -> TransferableOutput {
	TransferableOutput::new(asset_id, Secp256k1Output::new(amount, 0, 1, vec![owner]))
}

impl Engine {
	async fn utxo_snapshot(&self, chain: &ChainConfig) -> Result<UtxoSet, EngineError> {
		let utxos: UtxoSet = self
			.delivery
			.utxos(&chain.id, &self.keychain.addresses())
			.await?
			.into_iter()
			.collect();
		debug!(chain = %chain.alias, utxos = utxos.len(), "Fetched UTXO snapshot");
		Ok(utxos)
	}

	fn utxo_context<'a>(
		&self,
		chain: &ChainConfig,
		utxos: &'a UtxoSet,
		owned: &'a [Address],
	) -> Result<UtxoContext<'a>, EngineError> {
		let vm = chain.vm.utxo_vm().ok_or_else(|| {
			BuildError::Unsupported(format!("Chain {} has no UTXOs", chain.alias))
		})?;
		Ok(UtxoContext {
			vm,
			network_id: self.config.network.id,
			blockchain_id: chain.id,
			utxos,
			owned,
			change_address: self.keychain.primary().address(),
			now: current_timestamp(),
		})
	}

	/// Signs `transaction` and checks every input is authorised.
	async fn sign(&self, transaction: Transaction) -> Result<SignedTransaction, EngineError> {
		let signed = self.keychain.sign(transaction).await?;
		let failing = verify_signatures(&signed)?;
		if !failing.is_empty() {
			return Err(EngineError::UnsignedInputs(failing));
		}
		Ok(signed)
	}

	async fn signed_payload(&self, transaction: Transaction) -> Result<TransactionPayload, EngineError> {
		let signed = self.sign(transaction).await?;
		Ok(TransactionPayload::Raw(signed.signed_bytes()?))
	}

	pub(super) async fn execute_send(
		&self,
		executable: &mut ExecutableOperation,
		send: &SendOperation,
		deadline: Instant,
	) -> Result<LegResult, EngineError> {
		let chain = operation::chain(&self.config, &send.chain)?;
		let payload = match chain.vm {
			VmKind::Evm => evm_payload(evm::transfer(send.recipient, send.amount)),
			VmKind::Platform | VmKind::Jvm => {
				let amount = u64::try_from(send.amount)
					.map_err(|_| InputError::AmountTooLarge(send.amount))?;
				let fee = leg_fee(executable.legs(), 0)?;
				let utxos = self.utxo_snapshot(chain).await?;
				let owned = self.keychain.addresses();
				let ctx = self.utxo_context(chain, &utxos, &owned)?;
				let transaction = build_base_transaction(
					&ctx,
					vec![owned_output(send.asset_id, amount, send.recipient)],
					&fee,
					Vec::new(),
				)?;
				self.signed_payload(transaction).await?
			},
		};
		self.run_leg(executable, chain.id, payload, deadline).await
	}

	pub(super) async fn execute_cross(
		&self,
		executable: &mut ExecutableOperation,
		cross: &CrossOperation,
		deadline: Instant,
	) -> Result<LegResult, EngineError> {
		let route = cross.route(&self.config)?;
		let (source, destination) = (route.source, route.destination);
		let network_id = self.config.network.id;
		let owner = self.keychain.primary().address();
		let owned = self.keychain.addresses();

		let export = match source.vm {
			VmKind::Evm => {
				let from = self.keychain.primary().evm_address();
				let nonce = self.delivery.evm_nonce(&source.id, &from).await?;
				let (asset_id, amount) = route.exported[0];
				build_evm_export_transaction(
					network_id,
					source.id,
					destination.id,
					from,
					nonce,
					asset_id,
					amount,
					&route.export_fee,
					owner,
				)?
			},
			VmKind::Platform | VmKind::Jvm => {
				let utxos = self.utxo_snapshot(source).await?;
				let ctx = self.utxo_context(source, &utxos, &owned)?;
				let exported = route
					.exported
					.iter()
					.map(|(asset_id, amount)| owned_output(*asset_id, *amount, owner))
					.collect();
				build_export_transaction(&ctx, destination.id, exported, &route.export_fee)?
			},
		};
		let export = self.sign(export).await?;
		let payload = TransactionPayload::Raw(export.signed_bytes()?);
		let export_id = match self.run_leg(executable, source.id, payload, deadline).await? {
			LegResult::Accepted(id) => id,
			LegResult::TimedOut => return Ok(LegResult::TimedOut),
		};

		let imported = export.transaction.exported_utxos(&export_id);
		let import = match destination.vm {
			VmKind::Evm => build_evm_import_transaction(
				network_id,
				destination.id,
				source.id,
				&imported,
				&owned,
				current_timestamp(),
				cross.recipient,
				&route.import_fee,
			)?,
			VmKind::Platform | VmKind::Jvm => {
				let utxos = self.utxo_snapshot(destination).await?;
				let ctx = self.utxo_context(destination, &utxos, &owned)?;
				build_import_transaction(
					&ctx,
					source.id,
					&imported,
					cross.recipient,
					&route.import_fee,
				)?
			},
		};
		let payload = self.signed_payload(import).await?;
		self.run_leg(executable, destination.id, payload, deadline).await
	}

	pub(super) async fn execute_wrap(
		&self,
		executable: &mut ExecutableOperation,
		wrap: &WrapOperation,
		deadline: Instant,
	) -> Result<LegResult, EngineError> {
		let chain = operation::chain(&self.config, &wrap.chain)?;
		let contract = operation::wrapped_contract(chain, "wrap")?;
		let payload = evm_payload(evm::wrap(contract, wrap.amount));
		self.run_leg(executable, chain.id, payload, deadline).await
	}

	pub(super) async fn execute_unwrap(
		&self,
		executable: &mut ExecutableOperation,
		unwrap: &UnwrapOperation,
		deadline: Instant,
	) -> Result<LegResult, EngineError> {
		let chain = operation::chain(&self.config, &unwrap.chain)?;
		let contract = operation::wrapped_contract(chain, "unwrap")?;
		let payload = evm_payload(evm::unwrap(contract, unwrap.amount));
		self.run_leg(executable, chain.id, payload, deadline).await
	}

	pub(super) async fn execute_validate(
		&self,
		executable: &mut ExecutableOperation,
		validate: &ValidateOperation,
		deadline: Instant,
	) -> Result<LegResult, EngineError> {
		let platform = operation::platform(&self.config)?;
		let fee = leg_fee(executable.legs(), 0)?;
		let utxos = self.utxo_snapshot(platform).await?;
		let owned = self.keychain.addresses();
		let ctx = self.utxo_context(platform, &utxos, &owned)?;
		let transaction = build_add_validator_transaction(
			&ctx,
			Validator {
				node_id: validate.node_id,
				start_time: validate.start_time,
				end_time: validate.end_time,
				weight: validate.amount,
			},
			platform.fee_asset,
			OutputOwners::single(ctx.change_address),
			validate.delegation_fee,
			&fee,
		)?;
		let payload = self.signed_payload(transaction).await?;
		self.run_leg(executable, platform.id, payload, deadline).await
	}

	pub(super) async fn execute_delegate(
		&self,
		executable: &mut ExecutableOperation,
		delegate: &DelegateOperation,
		deadline: Instant,
	) -> Result<LegResult, EngineError> {
		let platform = operation::platform(&self.config)?;
		let fee = leg_fee(executable.legs(), 0)?;
		let utxos = self.utxo_snapshot(platform).await?;
		let owned = self.keychain.addresses();
		let ctx = self.utxo_context(platform, &utxos, &owned)?;
		let transaction = build_add_delegator_transaction(
			&ctx,
			Validator {
				node_id: delegate.node_id,
				start_time: delegate.start_time,
				end_time: delegate.end_time,
				weight: delegate.amount,
			},
			platform.fee_asset,
			OutputOwners::single(ctx.change_address),
			&fee,
		)?;
		let payload = self.signed_payload(transaction).await?;
		self.run_leg(executable, platform.id, payload, deadline).await
	}
}
