//! Unspent outputs and keyed UTXO sets.

use crate::buffer::{BufferReader, BufferWriter, CodecError, Deserializable, Serializable};
use crate::ids::{Address, AssetId, TransactionId};
use crate::transaction::input::TransferableInput;
use crate::transaction::output::Output;
use crate::utils::constants::CODEC_VERSION;
use std::collections::BTreeMap;

/// An unspent output `(transaction_id, output_index)` carrying `asset_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utxo {
	pub transaction_id: TransactionId,
	pub output_index: u32,
	pub asset_id: AssetId,
	pub output: Output,
}

impl Utxo {
	pub fn key(&self) -> UtxoKey {
		UtxoKey {
			transaction_id: self.transaction_id,
			output_index: self.output_index,
		}
	}
}

impl Serializable for Utxo {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u16(CODEC_VERSION)?;
		self.transaction_id.write_to(writer)?;
		writer.write_u32(self.output_index)?;
		self.asset_id.write_to(writer)?;
		self.output.write_to(writer)
	}
}

impl Deserializable for Utxo {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		let version = reader.read_u16()?;
		if version != CODEC_VERSION {
			return Err(CodecError::InvalidData(format!(
				"unsupported codec version {}",
				version
			)));
		}
		Ok(Self {
			transaction_id: TransactionId::read_from(reader)?,
			output_index: reader.read_u32()?,
			asset_id: AssetId::read_from(reader)?,
			output: Output::read_from(reader)?,
		})
	}
}

/// Key of a UTXO within a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtxoKey {
	pub transaction_id: TransactionId,
	pub output_index: u32,
}

/// Point-in-time snapshot of UTXOs, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoSet {
	utxos: BTreeMap<UtxoKey, Utxo>,
}

impl UtxoSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a UTXO, replacing any previous entry with the same key.
	pub fn insert(&mut self, utxo: Utxo) {
		self.utxos.insert(utxo.key(), utxo);
	}

	pub fn get(&self, key: &UtxoKey) -> Option<&Utxo> {
		self.utxos.get(key)
	}

	pub fn remove(&mut self, key: &UtxoKey) -> Option<Utxo> {
		self.utxos.remove(key)
	}

	/// Removes every UTXO spent by `inputs`.
	pub fn consume(&mut self, inputs: &[TransferableInput]) {
		for input in inputs {
			self.utxos.remove(&UtxoKey {
				transaction_id: input.transaction_id,
				output_index: input.output_index,
			});
		}
	}

	pub fn len(&self) -> usize {
		self.utxos.len()
	}

	pub fn is_empty(&self) -> bool {
		self.utxos.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Utxo> {
		self.utxos.values()
	}

	/// UTXOs of `asset_id` that `owned` can spend at `now`, with the owner
	/// indices that authorise each spend.
	pub fn spendable<'a>(
		&'a self,
		asset_id: &'a AssetId,
		owned: &'a [Address],
		now: u64,
	) -> impl Iterator<Item = (&'a Utxo, Vec<u32>)> + 'a {
		self.utxos
			.values()
			.filter(move |utxo| utxo.asset_id == *asset_id)
			.filter(move |utxo| utxo.output.stakeable_locktime() <= now)
			.filter_map(move |utxo| {
				utxo.output
					.owners()
					.spending_indices(owned, now)
					.map(|indices| (utxo, indices))
			})
	}

	/// Total spendable amount of `asset_id`.
	pub fn balance(&self, asset_id: &AssetId, owned: &[Address], now: u64) -> u64 {
		self.spendable(asset_id, owned, now)
			.fold(0u64, |total, (utxo, _)| total.saturating_add(utxo.output.amount()))
	}
}

impl FromIterator<Utxo> for UtxoSet {
	fn from_iter<I: IntoIterator<Item = Utxo>>(iter: I) -> Self {
		let mut set = Self::new();
		for utxo in iter {
			set.insert(utxo);
		}
		set
	}
}
