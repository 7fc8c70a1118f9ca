//! Output payloads carried by UTXOs and transactions.

use crate::buffer::{BufferReader, BufferWriter, CodecError, Deserializable, Serializable};
use crate::ids::{Address, AssetId};
use crate::utils::constants::{
	OUTPUT_OWNERS_TYPE_ID, SECP256K1_OUTPUT_TYPE_ID, STAKEABLE_LOCKED_OUTPUT_TYPE_ID,
};

/// Addresses, threshold and locktime that control spending of an output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputOwners {
	pub locktime: u64,
	pub threshold: u32,
	pub addresses: Vec<Address>,
}

impl OutputOwners {
	/// Single-owner set with no locktime.
	pub fn single(address: Address) -> Self {
		Self {
			locktime: 0,
			threshold: 1,
			addresses: vec![address],
		}
	}

	/// Indices of the first `threshold` owner positions held in `owned`,
	/// provided the locktime has passed at `now`.
	pub fn spending_indices(&self, owned: &[Address], now: u64) -> Option<Vec<u32>> {
		if self.locktime > now {
			return None;
		}
		let indices: Vec<u32> = self
			.addresses
			.iter()
			.enumerate()
			.filter(|(_, address)| owned.contains(address))
			.map(|(i, _)| i as u32)
			.take(self.threshold as usize)
			.collect();
		(indices.len() == self.threshold as usize).then_some(indices)
	}

	fn write_fields(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u64(self.locktime)?;
		writer.write_u32(self.threshold)?;
		writer.write_list(&self.addresses)
	}

	fn read_fields(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		Ok(Self {
			locktime: reader.read_u64()?,
			threshold: reader.read_u32()?,
			addresses: reader.read_list()?,
		})
	}
}

/// Standalone owners record (rewards owner, supernet owner).
impl Serializable for OutputOwners {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(OUTPUT_OWNERS_TYPE_ID)?;
		self.write_fields(writer)
	}
}

impl Deserializable for OutputOwners {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		expect_type_id(reader, OUTPUT_OWNERS_TYPE_ID, "output owners")?;
		Self::read_fields(reader)
	}
}

/// Secp256k1 transfer output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Secp256k1Output {
	pub amount: u64,
	pub owners: OutputOwners,
}

impl Secp256k1Output {
	pub fn new(amount: u64, locktime: u64, threshold: u32, addresses: Vec<Address>) -> Self {
		Self {
			amount,
			owners: OutputOwners {
				locktime,
				threshold,
				addresses,
			},
		}
	}
}

impl Serializable for Secp256k1Output {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(SECP256K1_OUTPUT_TYPE_ID)?;
		writer.write_u64(self.amount)?;
		self.owners.write_fields(writer)
	}
}

impl Deserializable for Secp256k1Output {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		expect_type_id(reader, SECP256K1_OUTPUT_TYPE_ID, "secp256k1 output")?;
		Ok(Self {
			amount: reader.read_u64()?,
			owners: OutputOwners::read_fields(reader)?,
		})
	}
}

/// Platform-chain output that can be staked but not spent before `locktime`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StakeableLockedOutput {
	pub locktime: u64,
	pub output: Secp256k1Output,
}

impl Serializable for StakeableLockedOutput {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(STAKEABLE_LOCKED_OUTPUT_TYPE_ID)?;
		writer.write_u64(self.locktime)?;
		self.output.write_to(writer)
	}
}

/// Output payload: a closed set of the kinds this client understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Output {
	Secp256k1(Secp256k1Output),
	StakeableLocked(StakeableLockedOutput),
}

impl Output {
	pub fn amount(&self) -> u64 {
		match self {
			Output::Secp256k1(output) => output.amount,
			Output::StakeableLocked(locked) => locked.output.amount,
		}
	}

	pub fn owners(&self) -> &OutputOwners {
		match self {
			Output::Secp256k1(output) => &output.owners,
			Output::StakeableLocked(locked) => &locked.output.owners,
		}
	}

	/// Stakeable locktime, zero for plain transfer outputs.
	pub fn stakeable_locktime(&self) -> u64 {
		match self {
			Output::Secp256k1(_) => 0,
			Output::StakeableLocked(locked) => locked.locktime,
		}
	}
}

impl Serializable for Output {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		match self {
			Output::Secp256k1(output) => output.write_to(writer),
			Output::StakeableLocked(locked) => locked.write_to(writer),
		}
	}
}

impl Deserializable for Output {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		let type_id = reader.read_u32()?;
		match type_id {
			SECP256K1_OUTPUT_TYPE_ID => Ok(Output::Secp256k1(Secp256k1Output {
				amount: reader.read_u64()?,
				owners: OutputOwners::read_fields(reader)?,
			})),
			STAKEABLE_LOCKED_OUTPUT_TYPE_ID => Ok(Output::StakeableLocked(StakeableLockedOutput {
				locktime: reader.read_u64()?,
				output: Secp256k1Output::read_from(reader)?,
			})),
			_ => Err(CodecError::UnknownTypeId {
				type_id,
				context: "output",
			}),
		}
	}
}

impl From<Secp256k1Output> for Output {
	fn from(output: Secp256k1Output) -> Self {
		Output::Secp256k1(output)
	}
}

/// An output tagged with the asset it carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferableOutput {
	pub asset_id: AssetId,
	pub output: Output,
}

impl TransferableOutput {
	pub fn new(asset_id: AssetId, output: impl Into<Output>) -> Self {
		Self {
			asset_id,
			output: output.into(),
		}
	}

	pub fn amount(&self) -> u64 {
		self.output.amount()
	}
}

impl Serializable for TransferableOutput {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.asset_id.write_to(writer)?;
		self.output.write_to(writer)
	}
}

impl Deserializable for TransferableOutput {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		Ok(Self {
			asset_id: AssetId::read_from(reader)?,
			output: Output::read_from(reader)?,
		})
	}
}

/// Sorts outputs by their serialized bytes, the canonical order on chain.
pub fn sort_outputs(outputs: &mut Vec<TransferableOutput>) -> Result<(), CodecError> {
	let mut keyed = outputs
		.drain(..)
		.map(|output| Ok((output.serialize()?, output)))
		.collect::<Result<Vec<_>, CodecError>>()?;
	keyed.sort_by(|a, b| a.0.cmp(&b.0));
	outputs.extend(keyed.into_iter().map(|(_, output)| output));
	Ok(())
}

pub(crate) fn expect_type_id(
	reader: &mut BufferReader<'_>,
	expected: u32,
	context: &'static str,
) -> Result<(), CodecError> {
	let type_id = reader.read_u32()?;
	if type_id != expected {
		return Err(CodecError::UnknownTypeId { type_id, context });
	}
	Ok(())
}
