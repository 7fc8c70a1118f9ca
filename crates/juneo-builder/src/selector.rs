//! UTXO selection.
//!
//! Spendable UTXOs are scanned in UTXO-set key order, so a given set and
//! request always produce the same inputs, change and fee.

use crate::{BuildError, FeeData};
use juneo_types::{
	sort_inputs, Address, AssetId, Secp256k1Output, TransferableInput, TransferableOutput, UtxoSet,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Inputs covering a request, plus one change output per asset with excess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
	pub inputs: Vec<TransferableInput>,
	pub change: Vec<TransferableOutput>,
}

impl Selection {
	/// Total input amount of `asset_id`.
	pub fn consumed(&self, asset_id: &AssetId) -> u64 {
		self.inputs
			.iter()
			.filter(|input| input.asset_id == *asset_id)
			.fold(0u64, |total, input| total.saturating_add(input.amount()))
	}
}

/// Selects UTXOs of an owner set.
pub struct UtxoSelector<'a> {
	utxos: &'a UtxoSet,
	owned: &'a [Address],
	now: u64,
	change_address: Address,
}

impl<'a> UtxoSelector<'a> {
	pub fn new(utxos: &'a UtxoSet, owned: &'a [Address], now: u64, change_address: Address) -> Self {
		Self {
			utxos,
			owned,
			now,
			change_address,
		}
	}

	/// Selects inputs covering every `(asset, amount)` in `spends` plus `fee`.
	///
	/// Requirements of the same asset are summed; the fee is added to its
	/// asset's requirement. Each asset is covered independently.
	pub fn select(&self, spends: &[(AssetId, u64)], fee: &FeeData) -> Result<Selection, BuildError> {
		let mut required: BTreeMap<AssetId, u64> = BTreeMap::new();
		for (asset_id, amount) in spends
			.iter()
			.copied()
			.chain(std::iter::once((fee.asset_id, fee.amount)))
		{
			if amount == 0 {
				continue;
			}
			let total = required.entry(asset_id).or_insert(0);
			*total = total.checked_add(amount).ok_or(BuildError::Overflow)?;
		}

		let mut selection = Selection::default();
		for (asset_id, target) in required {
			let mut accumulated: u64 = 0;
			for (utxo, indices) in self.utxos.spendable(&asset_id, self.owned, self.now) {
				if accumulated >= target {
					break;
				}
				accumulated = accumulated
					.checked_add(utxo.output.amount())
					.ok_or(BuildError::Overflow)?;
				selection
					.inputs
					.push(TransferableInput::from_utxo(utxo, indices));
			}

			if accumulated < target {
				return Err(BuildError::InsufficientFunds {
					asset_id,
					required: target,
					available: accumulated,
				});
			}

			let change = accumulated - target;
			if change > 0 {
				selection.change.push(TransferableOutput::new(
					asset_id,
					Secp256k1Output::new(change, 0, 1, vec![self.change_address]),
				));
			}
			debug!(asset = %asset_id, required = target, accumulated, change, "Selected UTXOs");
		}

		sort_inputs(&mut selection.inputs);
		Ok(selection)
	}
}

/// Selects UTXOs covering `target` of `asset_id` plus `fee`.
pub fn select_utxos(
	utxos: &UtxoSet,
	owned: &[Address],
	now: u64,
	target: u64,
	asset_id: AssetId,
	fee: &FeeData,
	change_address: Address,
) -> Result<Selection, BuildError> {
	UtxoSelector::new(utxos, owned, now, change_address).select(&[(asset_id, target)], fee)
}

#[cfg(test)]
mod tests {
	use super::*;
	use juneo_types::{TransactionId, Utxo};

	const NOW: u64 = 1_000;

	fn owner() -> Address {
		Address::new([7; 20])
	}

	fn asset(byte: u8) -> AssetId {
		AssetId::new([byte; 32])
	}

	fn utxo(tx: u8, amount: u64, asset_byte: u8) -> Utxo {
		Utxo {
			transaction_id: TransactionId::new([tx; 32]),
			output_index: 0,
			asset_id: asset(asset_byte),
			output: Secp256k1Output::new(amount, 0, 1, vec![owner()]).into(),
		}
	}

	fn set(utxos: Vec<Utxo>) -> UtxoSet {
		utxos.into_iter().collect()
	}

	#[test]
	fn test_same_asset_covers_target_and_fee() {
		let utxos = set(vec![utxo(1, 40, 1), utxo(2, 40, 1), utxo(3, 40, 1)]);
		let fee = FeeData::new(asset(1), 5);
		let owned = [owner()];

		let selection = select_utxos(&utxos, &owned, NOW, 60, asset(1), &fee, owner()).unwrap();
		assert_eq!(selection.inputs.len(), 2);
		assert_eq!(selection.consumed(&asset(1)), 80);
		assert_eq!(selection.change.len(), 1);
		assert_eq!(selection.change[0].amount(), 15);
	}

	#[test]
	fn test_distinct_fee_asset_gets_second_pass() {
		let utxos = set(vec![utxo(1, 100, 1), utxo(2, 10, 2), utxo(3, 10, 2)]);
		let fee = FeeData::new(asset(2), 12);
		let owned = [owner()];

		let selection = select_utxos(&utxos, &owned, NOW, 100, asset(1), &fee, owner()).unwrap();
		assert_eq!(selection.consumed(&asset(1)), 100);
		assert_eq!(selection.consumed(&asset(2)), 20);
		// Exact match on the target asset leaves no change for it.
		assert_eq!(selection.change.len(), 1);
		assert_eq!(selection.change[0].asset_id, asset(2));
		assert_eq!(selection.change[0].amount(), 8);
	}

	#[test]
	fn test_insufficient_funds_names_amounts() {
		let utxos = set(vec![utxo(1, 30, 1), utxo(2, 30, 1)]);
		let fee = FeeData::new(asset(1), 1);
		let owned = [owner()];

		let err = select_utxos(&utxos, &owned, NOW, 60, asset(1), &fee, owner()).unwrap_err();
		match err {
			BuildError::InsufficientFunds {
				asset_id,
				required,
				available,
			} => {
				assert_eq!(asset_id, asset(1));
				assert_eq!(required, 61);
				assert_eq!(available, 60);
			},
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_selection_is_deterministic_and_sorted() {
		let utxos = set(vec![utxo(9, 10, 1), utxo(3, 10, 1), utxo(5, 10, 1)]);
		let fee = FeeData::new(asset(1), 0);
		let owned = [owner()];

		let first = select_utxos(&utxos, &owned, NOW, 15, asset(1), &fee, owner()).unwrap();
		let second = select_utxos(&utxos, &owned, NOW, 15, asset(1), &fee, owner()).unwrap();
		assert_eq!(first, second);
		assert_eq!(first.inputs[0].transaction_id, TransactionId::new([3; 32]));
		assert_eq!(first.inputs[1].transaction_id, TransactionId::new([5; 32]));
	}

	#[test]
	fn test_foreign_and_locked_utxos_are_skipped() {
		let mut locked = utxo(1, 100, 1);
		locked.output = Secp256k1Output::new(100, NOW + 1, 1, vec![owner()]).into();
		let mut foreign = utxo(2, 100, 1);
		foreign.output = Secp256k1Output::new(100, 0, 1, vec![Address::new([8; 20])]).into();
		let utxos = set(vec![locked, foreign, utxo(3, 10, 1)]);
		let owned = [owner()];

		let err = select_utxos(
			&utxos,
			&owned,
			NOW,
			20,
			asset(1),
			&FeeData::new(asset(1), 0),
			owner(),
		)
		.unwrap_err();
		assert!(matches!(err, BuildError::InsufficientFunds { available: 10, .. }));
	}
}
