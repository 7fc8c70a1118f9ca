//! Inputs: references to UTXOs and account-model debits.

use crate::buffer::{BufferReader, BufferWriter, CodecError, Deserializable, Serializable};
use crate::ids::{Address, AssetId, TransactionId};
use crate::transaction::output::{expect_type_id, Output};
use crate::utils::constants::{
	SECP256K1_INPUT_TYPE_ID, STAKEABLE_LOCKED_INPUT_TYPE_ID, SUPERNET_AUTH_TYPE_ID,
};
use crate::utxo::Utxo;

/// Spends a secp256k1 output with the owners at `address_indices`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Secp256k1Input {
	pub amount: u64,
	pub address_indices: Vec<u32>,
}

impl Secp256k1Input {
	pub fn new(amount: u64, address_indices: Vec<u32>) -> Self {
		Self {
			amount,
			address_indices,
		}
	}
}

impl Serializable for Secp256k1Input {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(SECP256K1_INPUT_TYPE_ID)?;
		writer.write_u64(self.amount)?;
		writer.write_len(self.address_indices.len())?;
		for index in &self.address_indices {
			writer.write_u32(*index)?;
		}
		Ok(())
	}
}

impl Deserializable for Secp256k1Input {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		expect_type_id(reader, SECP256K1_INPUT_TYPE_ID, "secp256k1 input")?;
		Self::read_fields(reader)
	}
}

impl Secp256k1Input {
	fn read_fields(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		let amount = reader.read_u64()?;
		Ok(Self::new(amount, read_indices(reader)?))
	}
}

fn read_indices(reader: &mut BufferReader<'_>) -> Result<Vec<u32>, CodecError> {
	let indices = reader.read_list::<AddressIndex>()?;
	Ok(indices.into_iter().map(|i| i.0).collect())
}

struct AddressIndex(u32);

impl Deserializable for AddressIndex {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		reader.read_u32().map(AddressIndex)
	}
}

/// Spends a stakeable locked output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StakeableLockedInput {
	pub locktime: u64,
	pub input: Secp256k1Input,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Input {
	Secp256k1(Secp256k1Input),
	StakeableLocked(StakeableLockedInput),
}

impl Input {
	pub fn amount(&self) -> u64 {
		match self {
			Input::Secp256k1(input) => input.amount,
			Input::StakeableLocked(locked) => locked.input.amount,
		}
	}

	pub fn address_indices(&self) -> &[u32] {
		match self {
			Input::Secp256k1(input) => &input.address_indices,
			Input::StakeableLocked(locked) => &locked.input.address_indices,
		}
	}
}

impl Deserializable for Input {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		let type_id = reader.read_u32()?;
		match type_id {
			SECP256K1_INPUT_TYPE_ID => Ok(Input::Secp256k1(Secp256k1Input::read_fields(reader)?)),
			STAKEABLE_LOCKED_INPUT_TYPE_ID => Ok(Input::StakeableLocked(StakeableLockedInput {
				locktime: reader.read_u64()?,
				input: Secp256k1Input::read_from(reader)?,
			})),
			_ => Err(CodecError::UnknownTypeId {
				type_id,
				context: "input",
			}),
		}
	}
}

impl Serializable for Input {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		match self {
			Input::Secp256k1(input) => input.write_to(writer),
			Input::StakeableLocked(locked) => {
				writer.write_u32(STAKEABLE_LOCKED_INPUT_TYPE_ID)?;
				writer.write_u64(locked.locktime)?;
				locked.input.write_to(writer)
			}
		}
	}
}

/// An input spending the UTXO `(transaction_id, output_index)`.
///
/// `signers` lists the owner addresses that must sign, in credential order.
/// It is derived from the spent output and is not part of the wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferableInput {
	pub transaction_id: TransactionId,
	pub output_index: u32,
	pub asset_id: AssetId,
	pub input: Input,
	pub signers: Vec<Address>,
}

impl TransferableInput {
	/// Spends `utxo` with the owners at `address_indices`.
	pub fn from_utxo(utxo: &Utxo, address_indices: Vec<u32>) -> Self {
		let owners = &utxo.output.owners().addresses;
		let signers = address_indices
			.iter()
			.filter_map(|i| owners.get(*i as usize).copied())
			.collect();
		let spend = Secp256k1Input::new(utxo.output.amount(), address_indices);
		let input = match &utxo.output {
			Output::Secp256k1(_) => Input::Secp256k1(spend),
			Output::StakeableLocked(locked) => Input::StakeableLocked(StakeableLockedInput {
				locktime: locked.locktime,
				input: spend,
			}),
		};
		Self {
			transaction_id: utxo.transaction_id,
			output_index: utxo.output_index,
			asset_id: utxo.asset_id,
			input,
			signers,
		}
	}

	pub fn amount(&self) -> u64 {
		self.input.amount()
	}
}

impl Serializable for TransferableInput {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.transaction_id.write_to(writer)?;
		writer.write_u32(self.output_index)?;
		self.asset_id.write_to(writer)?;
		self.input.write_to(writer)
	}
}

/// Decoded inputs have no `signers`; the spent outputs are not on the wire.
impl Deserializable for TransferableInput {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		Ok(Self {
			transaction_id: TransactionId::read_from(reader)?,
			output_index: reader.read_u32()?,
			asset_id: AssetId::read_from(reader)?,
			input: Input::read_from(reader)?,
			signers: Vec::new(),
		})
	}
}

/// Sorts inputs by the UTXO they spend.
pub fn sort_inputs(inputs: &mut [TransferableInput]) {
	inputs.sort_by(|a, b| {
		(a.transaction_id, a.output_index).cmp(&(b.transaction_id, b.output_index))
	});
}

/// Account-model debit on an EVM chain, authorised by `address`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvmInput {
	pub address: Address,
	pub amount: u64,
	pub asset_id: AssetId,
	pub nonce: u64,
}

impl Serializable for EvmInput {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.address.write_to(writer)?;
		writer.write_u64(self.amount)?;
		self.asset_id.write_to(writer)?;
		writer.write_u64(self.nonce)
	}
}

/// Account-model credit on an EVM chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvmOutput {
	pub address: Address,
	pub amount: u64,
	pub asset_id: AssetId,
}

impl Serializable for EvmOutput {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.address.write_to(writer)?;
		writer.write_u64(self.amount)?;
		self.asset_id.write_to(writer)
	}
}

/// Authorisation for supernet-owner actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SupernetAuth {
	pub address_indices: Vec<u32>,
	/// Owner addresses at `address_indices`, in signing order.
	pub signers: Vec<Address>,
}

impl Serializable for SupernetAuth {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(SUPERNET_AUTH_TYPE_ID)?;
		writer.write_len(self.address_indices.len())?;
		for index in &self.address_indices {
			writer.write_u32(*index)?;
		}
		Ok(())
	}
}

impl Deserializable for SupernetAuth {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		expect_type_id(reader, SUPERNET_AUTH_TYPE_ID, "supernet auth")?;
		Ok(Self {
			address_indices: read_indices(reader)?,
			signers: Vec::new(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transaction::output::Secp256k1Output;

	#[test]
	fn test_secp256k1_input_wire_format() {
		let input = Secp256k1Input::new(100, vec![1, 2]);
		assert_eq!(
			input.serialize().unwrap().to_hex(),
			"000000050000000000000064000000020000000100000002"
		);
		let decoded = Secp256k1Input::deserialize(&input.serialize().unwrap()).unwrap();
		assert_eq!(decoded, input);
	}

	#[test]
	fn test_from_utxo_maps_indices_to_signers() {
		let owners = vec![Address::new([1; 20]), Address::new([2; 20]), Address::new([3; 20])];
		let utxo = Utxo {
			transaction_id: TransactionId::new([4; 32]),
			output_index: 3,
			asset_id: AssetId::new([5; 32]),
			output: Secp256k1Output::new(50, 0, 2, owners.clone()).into(),
		};
		let input = TransferableInput::from_utxo(&utxo, vec![0, 2]);
		assert_eq!(input.signers, vec![owners[0], owners[2]]);
		assert_eq!(input.amount(), 50);
		assert_eq!(input.output_index, 3);
		assert!(matches!(input.input, Input::Secp256k1(_)));
	}

	#[test]
	fn test_sort_inputs_by_utxo_id() {
		let utxo = |tx: u8, index: u32| Utxo {
			transaction_id: TransactionId::new([tx; 32]),
			output_index: index,
			asset_id: AssetId::default(),
			output: Secp256k1Output::new(1, 0, 1, vec![Address::default()]).into(),
		};
		let mut inputs = vec![
			TransferableInput::from_utxo(&utxo(2, 0), vec![0]),
			TransferableInput::from_utxo(&utxo(1, 1), vec![0]),
			TransferableInput::from_utxo(&utxo(1, 0), vec![0]),
		];
		sort_inputs(&mut inputs);
		let order: Vec<_> = inputs.iter().map(|i| (i.transaction_id.as_bytes()[0], i.output_index)).collect();
		assert_eq!(order, vec![(1, 0), (1, 1), (2, 0)]);
	}
}
