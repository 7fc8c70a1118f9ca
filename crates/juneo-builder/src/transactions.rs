//! Transaction builders, one per kind.
//!
//! Builders select inputs from a UTXO snapshot, add change, and establish
//! canonical order: inputs by the UTXO they spend, outputs by their
//! serialized bytes. The results satisfy the fee invariant: for every asset,
//! consumed equals produced plus the fee, which is non-zero only for the
//! chain's fee asset.

use crate::selector::{Selection, UtxoSelector};
use crate::{BuildError, FeeData};
use juneo_types::utils::constants::MAX_MEMO_LENGTH;
use juneo_types::{
	sort_inputs, sort_outputs, AddDelegatorTransaction, AddSupernetValidatorTransaction,
	AddValidatorTransaction, Address, AssetId, BaseTransaction, BlockchainId,
	CreateChainTransaction, CreateSupernetTransaction, EvmExportTransaction, EvmImportTransaction,
	EvmInput, EvmOutput, ExportTransaction, FxId, ImportTransaction, OutputOwners,
	Secp256k1Output, SupernetAuth, SupernetId, Transaction, TransferableInput,
	TransferableOutput, Utxo, UtxoSet, UtxoVm, Validator, VmId,
};
use std::collections::BTreeMap;

/// Chain and UTXO snapshot a builder draws from.
#[derive(Debug, Clone, Copy)]
pub struct UtxoContext<'a> {
	pub vm: UtxoVm,
	pub network_id: u32,
	pub blockchain_id: BlockchainId,
	pub utxos: &'a UtxoSet,
	/// Addresses whose UTXOs may be spent.
	pub owned: &'a [Address],
	pub change_address: Address,
	/// Unix time used to evaluate locktimes.
	pub now: u64,
}

impl<'a> UtxoContext<'a> {
	fn select(&self, spends: &[(AssetId, u64)], fee: &FeeData) -> Result<Selection, BuildError> {
		UtxoSelector::new(self.utxos, self.owned, self.now, self.change_address).select(spends, fee)
	}

	fn base(
		&self,
		mut outputs: Vec<TransferableOutput>,
		mut inputs: Vec<TransferableInput>,
		memo: Vec<u8>,
	) -> Result<BaseTransaction, BuildError> {
		if memo.len() > MAX_MEMO_LENGTH {
			return Err(BuildError::InvalidParameter(format!(
				"memo is {} bytes, at most {} allowed",
				memo.len(),
				MAX_MEMO_LENGTH
			)));
		}
		sort_outputs(&mut outputs)?;
		sort_inputs(&mut inputs);
		Ok(BaseTransaction {
			vm: self.vm,
			network_id: self.network_id,
			blockchain_id: self.blockchain_id,
			outputs,
			inputs,
			memo,
		})
	}

	fn require_platform(&self, kind: &str) -> Result<(), BuildError> {
		match self.vm {
			UtxoVm::Platform => Ok(()),
			UtxoVm::Jvm => Err(BuildError::Unsupported(format!(
				"{} transactions exist only on the platform chain",
				kind
			))),
		}
	}
}

/// Amount of each asset carried by `outputs`.
fn totals(outputs: &[TransferableOutput]) -> Result<Vec<(AssetId, u64)>, BuildError> {
	let mut totals: BTreeMap<AssetId, u64> = BTreeMap::new();
	for output in outputs {
		let total = totals.entry(output.asset_id).or_insert(0);
		*total = total
			.checked_add(output.amount())
			.ok_or(BuildError::Overflow)?;
	}
	Ok(totals.into_iter().collect())
}

/// Inputs spending UTXOs exported to this chain, and the total per asset.
fn imported_inputs(
	imported: &[Utxo],
	owned: &[Address],
	now: u64,
) -> Result<(Vec<TransferableInput>, BTreeMap<AssetId, u64>), BuildError> {
	if imported.is_empty() {
		return Err(BuildError::InvalidParameter(
			"no UTXOs to import".to_string(),
		));
	}
	let mut inputs = Vec::with_capacity(imported.len());
	let mut totals: BTreeMap<AssetId, u64> = BTreeMap::new();
	for utxo in imported {
		let indices = utxo
			.output
			.owners()
			.spending_indices(owned, now)
			.ok_or_else(|| {
				BuildError::InvalidParameter(format!(
					"imported UTXO {}:{} is not spendable by this account",
					utxo.transaction_id, utxo.output_index
				))
			})?;
		let total = totals.entry(utxo.asset_id).or_insert(0);
		*total = total
			.checked_add(utxo.output.amount())
			.ok_or(BuildError::Overflow)?;
		inputs.push(TransferableInput::from_utxo(utxo, indices));
	}
	sort_inputs(&mut inputs);
	Ok((inputs, totals))
}

/// Transfers `outputs` on the context chain.
pub fn build_base_transaction(
	ctx: &UtxoContext<'_>,
	outputs: Vec<TransferableOutput>,
	fee: &FeeData,
	memo: Vec<u8>,
) -> Result<Transaction, BuildError> {
	let selection = ctx.select(&totals(&outputs)?, fee)?;
	let mut all_outputs = outputs;
	all_outputs.extend(selection.change);
	Ok(Transaction::Base(ctx.base(all_outputs, selection.inputs, memo)?))
}

/// Moves `exported` outputs into the shared memory of `destination_chain`.
pub fn build_export_transaction(
	ctx: &UtxoContext<'_>,
	destination_chain: BlockchainId,
	exported: Vec<TransferableOutput>,
	fee: &FeeData,
) -> Result<Transaction, BuildError> {
	let selection = ctx.select(&totals(&exported)?, fee)?;
	let mut exported_outputs = exported;
	sort_outputs(&mut exported_outputs)?;
	Ok(Transaction::Export(ExportTransaction {
		base: ctx.base(selection.change, selection.inputs, Vec::new())?,
		destination_chain,
		exported_outputs,
	}))
}

/// Spends UTXOs exported from `source_chain`, crediting `recipient`.
///
/// The fee is paid from the imported amount of the fee asset; any shortfall
/// is selected from the context chain's own UTXOs.
pub fn build_import_transaction(
	ctx: &UtxoContext<'_>,
	source_chain: BlockchainId,
	imported: &[Utxo],
	recipient: Address,
	fee: &FeeData,
) -> Result<Transaction, BuildError> {
	let (imported_inputs, mut totals) = imported_inputs(imported, ctx.owned, ctx.now)?;

	let available = totals.get(&fee.asset_id).copied().unwrap_or(0);
	let covered = available.min(fee.amount);
	if covered > 0 {
		totals.insert(fee.asset_id, available - covered);
	}
	let shortfall = FeeData::new(fee.asset_id, fee.amount - covered);
	let local = ctx.select(&[], &shortfall)?;

	let mut outputs: Vec<TransferableOutput> = totals
		.into_iter()
		.filter(|(_, amount)| *amount > 0)
		.map(|(asset_id, amount)| {
			TransferableOutput::new(asset_id, Secp256k1Output::new(amount, 0, 1, vec![recipient]))
		})
		.collect();
	outputs.extend(local.change);

	Ok(Transaction::Import(ImportTransaction {
		base: ctx.base(outputs, local.inputs, Vec::new())?,
		source_chain,
		imported_inputs,
	}))
}

/// Imports UTXOs into the EVM account `recipient`, paying `fee` from them.
#[allow(clippy::too_many_arguments)]
pub fn build_evm_import_transaction(
	network_id: u32,
	blockchain_id: BlockchainId,
	source_chain: BlockchainId,
	imported: &[Utxo],
	owned: &[Address],
	now: u64,
	recipient: Address,
	fee: &FeeData,
) -> Result<Transaction, BuildError> {
	let (imported_inputs, mut totals) = imported_inputs(imported, owned, now)?;

	let available = totals.get(&fee.asset_id).copied().unwrap_or(0);
	if available < fee.amount {
		return Err(BuildError::InsufficientFunds {
			asset_id: fee.asset_id,
			required: fee.amount,
			available,
		});
	}
	totals.insert(fee.asset_id, available - fee.amount);

	let outputs = totals
		.into_iter()
		.filter(|(_, amount)| *amount > 0)
		.map(|(asset_id, amount)| EvmOutput {
			address: recipient,
			amount,
			asset_id,
		})
		.collect();

	Ok(Transaction::EvmImport(EvmImportTransaction {
		network_id,
		blockchain_id,
		source_chain,
		imported_inputs,
		outputs,
	}))
}

/// Debits `amount` of `asset_id` plus `fee` from the EVM account `from` and
/// exports `amount` to `recipient` on `destination_chain`.
#[allow(clippy::too_many_arguments)]
pub fn build_evm_export_transaction(
	network_id: u32,
	blockchain_id: BlockchainId,
	destination_chain: BlockchainId,
	from: Address,
	nonce: u64,
	asset_id: AssetId,
	amount: u64,
	fee: &FeeData,
	recipient: Address,
) -> Result<Transaction, BuildError> {
	let mut debits: BTreeMap<AssetId, u64> = BTreeMap::new();
	debits.insert(asset_id, amount);
	if fee.amount > 0 {
		let total = debits.entry(fee.asset_id).or_insert(0);
		*total = total.checked_add(fee.amount).ok_or(BuildError::Overflow)?;
	}

	let inputs = debits
		.into_iter()
		.map(|(asset_id, amount)| EvmInput {
			address: from,
			amount,
			asset_id,
			nonce,
		})
		.collect();

	Ok(Transaction::EvmExport(EvmExportTransaction {
		network_id,
		blockchain_id,
		destination_chain,
		inputs,
		exported_outputs: vec![TransferableOutput::new(
			asset_id,
			Secp256k1Output::new(amount, 0, 1, vec![recipient]),
		)],
	}))
}

/// Stake outputs of `weight` owned by the change address.
fn stake_outputs(ctx: &UtxoContext<'_>, asset_id: AssetId, weight: u64) -> Vec<TransferableOutput> {
	vec![TransferableOutput::new(
		asset_id,
		Secp256k1Output::new(weight, 0, 1, vec![ctx.change_address]),
	)]
}

/// Registers `validator`, staking its weight of `stake_asset`.
pub fn build_add_validator_transaction(
	ctx: &UtxoContext<'_>,
	validator: Validator,
	stake_asset: AssetId,
	rewards_owner: OutputOwners,
	shares: u32,
	fee: &FeeData,
) -> Result<Transaction, BuildError> {
	ctx.require_platform("add validator")?;
	let selection = ctx.select(&[(stake_asset, validator.weight)], fee)?;
	let stake = stake_outputs(ctx, stake_asset, validator.weight);
	Ok(Transaction::AddValidator(AddValidatorTransaction {
		base: ctx.base(selection.change, selection.inputs, Vec::new())?,
		validator,
		stake,
		rewards_owner,
		shares,
	}))
}

/// Delegates the validator weight of `stake_asset` to an existing validator.
pub fn build_add_delegator_transaction(
	ctx: &UtxoContext<'_>,
	validator: Validator,
	stake_asset: AssetId,
	rewards_owner: OutputOwners,
	fee: &FeeData,
) -> Result<Transaction, BuildError> {
	ctx.require_platform("add delegator")?;
	let selection = ctx.select(&[(stake_asset, validator.weight)], fee)?;
	let stake = stake_outputs(ctx, stake_asset, validator.weight);
	Ok(Transaction::AddDelegator(AddDelegatorTransaction {
		base: ctx.base(selection.change, selection.inputs, Vec::new())?,
		validator,
		stake,
		rewards_owner,
	}))
}

pub fn build_create_supernet_transaction(
	ctx: &UtxoContext<'_>,
	owner: OutputOwners,
	fee: &FeeData,
) -> Result<Transaction, BuildError> {
	ctx.require_platform("create supernet")?;
	let selection = ctx.select(&[], fee)?;
	Ok(Transaction::CreateSupernet(CreateSupernetTransaction {
		base: ctx.base(selection.change, selection.inputs, Vec::new())?,
		owner,
	}))
}

pub fn build_add_supernet_validator_transaction(
	ctx: &UtxoContext<'_>,
	validator: Validator,
	supernet_id: SupernetId,
	supernet_auth: SupernetAuth,
	fee: &FeeData,
) -> Result<Transaction, BuildError> {
	ctx.require_platform("add supernet validator")?;
	let selection = ctx.select(&[], fee)?;
	Ok(Transaction::AddSupernetValidator(AddSupernetValidatorTransaction {
		base: ctx.base(selection.change, selection.inputs, Vec::new())?,
		validator,
		supernet_id,
		supernet_auth,
	}))
}

/// Parameters of a new blockchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
	pub supernet_id: SupernetId,
	pub name: String,
	pub vm_id: VmId,
	pub fx_ids: Vec<FxId>,
	pub genesis: Vec<u8>,
}

pub fn build_create_chain_transaction(
	ctx: &UtxoContext<'_>,
	chain: ChainSpec,
	supernet_auth: SupernetAuth,
	fee: &FeeData,
) -> Result<Transaction, BuildError> {
	ctx.require_platform("create chain")?;
	if chain.name.len() > usize::from(u16::MAX) {
		return Err(BuildError::InvalidParameter(format!(
			"chain name is {} bytes",
			chain.name.len()
		)));
	}
	let selection = ctx.select(&[], fee)?;
	let mut fx_ids = chain.fx_ids;
	fx_ids.sort();
	Ok(Transaction::CreateChain(CreateChainTransaction {
		base: ctx.base(selection.change, selection.inputs, Vec::new())?,
		supernet_id: chain.supernet_id,
		name: chain.name,
		vm_id: chain.vm_id,
		fx_ids,
		genesis: chain.genesis,
		supernet_auth,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use juneo_types::{NodeId, Serializable, TransactionId, TransactionKind};

	fn supernet_auth() -> SupernetAuth {
		SupernetAuth {
			address_indices: vec![0],
			signers: vec![owner()],
		}
	}

	/// Decodes `tx` and checks the unsigned header and that decoding loses
	/// no wire field.
	fn round_trip(tx: &Transaction, type_id: &str) -> Transaction {
		let bytes = tx.serialize().unwrap();
		let hex = bytes.to_hex();
		assert_eq!(&hex[..4], "0000");
		assert_eq!(&hex[4..12], type_id);
		let decoded = Transaction::decode_platform(&bytes).unwrap();
		assert_eq!(decoded.kind(), tx.kind());
		assert_eq!(decoded.serialize().unwrap(), bytes);
		decoded
	}

	const NOW: u64 = 1_000;

	fn owner() -> Address {
		Address::new([7; 20])
	}

	fn fee_asset() -> AssetId {
		AssetId::new([0xaa; 32])
	}

	fn other_asset() -> AssetId {
		AssetId::new([0xbb; 32])
	}

	fn utxo(tx: u8, index: u32, amount: u64, asset_id: AssetId) -> Utxo {
		Utxo {
			transaction_id: TransactionId::new([tx; 32]),
			output_index: index,
			asset_id,
			output: Secp256k1Output::new(amount, 0, 1, vec![owner()]).into(),
		}
	}

	fn snapshot() -> UtxoSet {
		vec![
			utxo(1, 0, 500, fee_asset()),
			utxo(2, 0, 700, fee_asset()),
			utxo(3, 1, 300, other_asset()),
		]
		.into_iter()
		.collect()
	}

	fn ctx<'a>(vm: UtxoVm, utxos: &'a UtxoSet, owned: &'a [Address]) -> UtxoContext<'a> {
		UtxoContext {
			vm,
			network_id: 12345,
			blockchain_id: BlockchainId::new([0x0b; 32]),
			utxos,
			owned,
			change_address: owner(),
			now: NOW,
		}
	}

	fn fee(amount: u64) -> FeeData {
		FeeData::new(fee_asset(), amount)
	}

	fn send(asset_id: AssetId, amount: u64) -> TransferableOutput {
		TransferableOutput::new(
			asset_id,
			Secp256k1Output::new(amount, 0, 1, vec![Address::new([9; 20])]),
		)
	}

	#[test]
	fn test_base_transaction_fee_invariant() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Jvm, &utxos, &owned);

		let tx = build_base_transaction(
			&ctx,
			vec![send(fee_asset(), 600), send(other_asset(), 100)],
			&fee(10),
			b"hello".to_vec(),
		)
		.unwrap();

		assert_eq!(tx.kind(), TransactionKind::Base);
		assert_eq!(tx.burned(&fee_asset()), Some(10));
		assert_eq!(tx.burned(&other_asset()), Some(0));
		let base = tx.base().unwrap();
		assert_eq!(base.inputs.len(), 3);
		// Two sends plus change for each asset.
		assert_eq!(base.outputs.len(), 4);
	}

	#[test]
	fn test_base_transaction_is_deterministic() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Jvm, &utxos, &owned);
		let build = || {
			build_base_transaction(&ctx, vec![send(fee_asset(), 100)], &fee(10), vec![])
				.unwrap()
				.serialize()
				.unwrap()
		};
		assert_eq!(build(), build());
	}

	#[test]
	fn test_memo_too_long() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Jvm, &utxos, &owned);
		let result =
			build_base_transaction(&ctx, vec![send(fee_asset(), 1)], &fee(1), vec![0; 257]);
		assert!(matches!(result, Err(BuildError::InvalidParameter(_))));
	}

	#[test]
	fn test_export_then_import_moves_exported_outputs() {
		let utxos = snapshot();
		let owned = [owner()];
		let source = ctx(UtxoVm::Jvm, &utxos, &owned);
		let destination_chain = BlockchainId::default();

		let export = build_export_transaction(
			&source,
			destination_chain,
			vec![TransferableOutput::new(
				fee_asset(),
				Secp256k1Output::new(110, 0, 1, vec![owner()]),
			)],
			&fee(10),
		)
		.unwrap();
		assert_eq!(export.burned(&fee_asset()), Some(10));

		let export_id = TransactionId::new([0x42; 32]);
		let exported = export.exported_utxos(&export_id);
		assert_eq!(exported.len(), 1);
		assert_eq!(exported[0].output_index, 1);

		let empty = UtxoSet::new();
		let destination = UtxoContext {
			blockchain_id: destination_chain,
			..ctx(UtxoVm::Platform, &empty, &owned)
		};
		let import =
			build_import_transaction(&destination, source.blockchain_id, &exported, owner(), &fee(10))
				.unwrap();
		assert_eq!(import.kind(), TransactionKind::Import);
		assert_eq!(import.burned(&fee_asset()), Some(10));
		assert_eq!(import.produced(&fee_asset()), 100);
		assert!(import.base().unwrap().inputs.is_empty());
	}

	#[test]
	fn test_import_fee_shortfall_uses_local_utxos() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Jvm, &utxos, &owned);
		let imported = vec![utxo(9, 0, 50, other_asset())];

		let import =
			build_import_transaction(&ctx, BlockchainId::default(), &imported, owner(), &fee(10))
				.unwrap();
		assert_eq!(import.burned(&fee_asset()), Some(10));
		assert_eq!(import.produced(&other_asset()), 50);
		assert_eq!(import.base().unwrap().inputs.len(), 1);
	}

	#[test]
	fn test_evm_import_requires_fee_coverage() {
		let owned = [owner()];
		let imported = vec![utxo(9, 0, 5, fee_asset())];
		let result = build_evm_import_transaction(
			1,
			BlockchainId::new([0x0e; 32]),
			BlockchainId::default(),
			&imported,
			&owned,
			NOW,
			Address::new([3; 20]),
			&fee(10),
		);
		assert!(matches!(
			result,
			Err(BuildError::InsufficientFunds {
				required: 10,
				available: 5,
				..
			})
		));
	}

	#[test]
	fn test_evm_export_debits_amount_and_fee() {
		let tx = build_evm_export_transaction(
			1,
			BlockchainId::new([0x0e; 32]),
			BlockchainId::default(),
			Address::new([3; 20]),
			4,
			fee_asset(),
			1_000,
			&fee(25),
			owner(),
		)
		.unwrap();
		assert_eq!(tx.consumed(&fee_asset()), 1_025);
		assert_eq!(tx.burned(&fee_asset()), Some(25));
		assert_eq!(tx.credential_signers(), vec![vec![Address::new([3; 20])]]);
	}

	#[test]
	fn test_delegation_stakes_weight() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Platform, &utxos, &owned);
		let validator = Validator {
			node_id: NodeId::new([5; 20]),
			start_time: NOW + 60,
			end_time: NOW + 60 + 86_400,
			weight: 1_000,
		};

		let tx = build_add_delegator_transaction(
			&ctx,
			validator,
			fee_asset(),
			OutputOwners::single(owner()),
			&fee(10),
		)
		.unwrap();
		assert_eq!(tx.burned(&fee_asset()), Some(10));
		match &tx {
			Transaction::AddDelegator(delegation) => {
				assert_eq!(delegation.stake[0].amount(), 1_000);
				assert_eq!(delegation.base.outputs[0].amount(), 190);
			},
			other => panic!("unexpected kind {}", other.kind()),
		}
	}

	#[test]
	fn test_create_supernet_round_trip() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Platform, &utxos, &owned);
		let supernet_owner = OutputOwners {
			locktime: 0,
			threshold: 1,
			addresses: vec![owner(), Address::new([8; 20])],
		};

		let tx = build_create_supernet_transaction(&ctx, supernet_owner.clone(), &fee(10)).unwrap();
		assert_eq!(tx.burned(&fee_asset()), Some(10));
		match round_trip(&tx, "00000010") {
			Transaction::CreateSupernet(decoded) => {
				assert_eq!(decoded.owner, supernet_owner);
				assert_eq!(decoded.base.network_id, 12345);
				assert_eq!(decoded.base.blockchain_id, BlockchainId::new([0x0b; 32]));
			},
			other => panic!("unexpected kind {}", other.kind()),
		}
	}

	#[test]
	fn test_add_supernet_validator_round_trip() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Platform, &utxos, &owned);
		let validator = Validator {
			node_id: NodeId::new([5; 20]),
			start_time: NOW + 60,
			end_time: NOW + 60 + 86_400,
			weight: 20,
		};
		let supernet_id = SupernetId::new([0x5e; 32]);

		let tx = build_add_supernet_validator_transaction(
			&ctx,
			validator.clone(),
			supernet_id,
			supernet_auth(),
			&fee(10),
		)
		.unwrap();
		// No stake moves: only the fee is burned.
		assert_eq!(tx.burned(&fee_asset()), Some(10));
		assert_eq!(tx.credential_signers().last(), Some(&vec![owner()]));
		match round_trip(&tx, "0000000d") {
			Transaction::AddSupernetValidator(decoded) => {
				assert_eq!(decoded.validator, validator);
				assert_eq!(decoded.supernet_id, supernet_id);
				assert_eq!(decoded.supernet_auth.address_indices, vec![0]);
			},
			other => panic!("unexpected kind {}", other.kind()),
		}
	}

	#[test]
	fn test_create_chain_round_trip() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Platform, &utxos, &owned);
		let chain = ChainSpec {
			supernet_id: SupernetId::new([0x5e; 32]),
			name: "juneo-test".to_string(),
			vm_id: VmId::new([0x76; 32]),
			fx_ids: vec![FxId::new([2; 32]), FxId::new([1; 32])],
			genesis: b"{\"alloc\":{}}".to_vec(),
		};

		let tx = build_create_chain_transaction(&ctx, chain.clone(), supernet_auth(), &fee(10))
			.unwrap();
		assert_eq!(tx.burned(&fee_asset()), Some(10));
		match round_trip(&tx, "0000000f") {
			Transaction::CreateChain(decoded) => {
				assert_eq!(decoded.name, chain.name);
				assert_eq!(decoded.vm_id, chain.vm_id);
				assert_eq!(decoded.supernet_id, chain.supernet_id);
				// Fx ids are stored sorted.
				assert_eq!(decoded.fx_ids, vec![FxId::new([1; 32]), FxId::new([2; 32])]);
				assert_eq!(decoded.genesis, chain.genesis);
				assert_eq!(decoded.supernet_auth.address_indices, vec![0]);
			},
			other => panic!("unexpected kind {}", other.kind()),
		}
	}

	#[test]
	fn test_staking_requires_platform_chain() {
		let utxos = snapshot();
		let owned = [owner()];
		let ctx = ctx(UtxoVm::Jvm, &utxos, &owned);
		let result = build_create_supernet_transaction(&ctx, OutputOwners::single(owner()), &fee(1));
		assert!(matches!(result, Err(BuildError::Unsupported(_))));
	}
}
