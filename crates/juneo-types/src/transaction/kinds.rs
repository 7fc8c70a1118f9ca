//! Transaction bodies, one struct per kind.
//!
//! Each body writes its fields after the codec version and type id, which
//! are written by [`Transaction`](super::Transaction). Platform bodies can
//! also be read back; see [`Transaction::decode_platform`](super::Transaction::decode_platform).

use crate::buffer::{BufferReader, BufferWriter, CodecError, Deserializable, Serializable};
use crate::chain::UtxoVm;
use crate::ids::{BlockchainId, FxId, NodeId, SupernetId, VmId};
use crate::transaction::input::{EvmInput, EvmOutput, SupernetAuth, TransferableInput};
use crate::transaction::output::{OutputOwners, TransferableOutput};

/// Fields shared by every UTXO-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTransaction {
	pub vm: UtxoVm,
	pub network_id: u32,
	pub blockchain_id: BlockchainId,
	pub outputs: Vec<TransferableOutput>,
	pub inputs: Vec<TransferableInput>,
	pub memo: Vec<u8>,
}

impl Serializable for BaseTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(self.network_id)?;
		self.blockchain_id.write_to(writer)?;
		writer.write_list(&self.outputs)?;
		writer.write_list(&self.inputs)?;
		writer.write_sized_bytes(&self.memo)
	}
}

impl BaseTransaction {
	pub(crate) fn read_fields(reader: &mut BufferReader<'_>, vm: UtxoVm) -> Result<Self, CodecError> {
		Ok(Self {
			vm,
			network_id: reader.read_u32()?,
			blockchain_id: BlockchainId::read_from(reader)?,
			outputs: reader.read_list()?,
			inputs: reader.read_list()?,
			memo: reader.read_sized_bytes()?.to_vec(),
		})
	}
}

/// Imports UTXOs exported to this chain by `source_chain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTransaction {
	pub base: BaseTransaction,
	pub source_chain: BlockchainId,
	pub imported_inputs: Vec<TransferableInput>,
}

impl Serializable for ImportTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.base.write_to(writer)?;
		self.source_chain.write_to(writer)?;
		writer.write_list(&self.imported_inputs)
	}
}

impl ImportTransaction {
	pub(crate) fn read_fields(reader: &mut BufferReader<'_>, vm: UtxoVm) -> Result<Self, CodecError> {
		Ok(Self {
			base: BaseTransaction::read_fields(reader, vm)?,
			source_chain: BlockchainId::read_from(reader)?,
			imported_inputs: reader.read_list()?,
		})
	}
}

/// Moves `exported_outputs` into the shared memory of `destination_chain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTransaction {
	pub base: BaseTransaction,
	pub destination_chain: BlockchainId,
	pub exported_outputs: Vec<TransferableOutput>,
}

impl Serializable for ExportTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.base.write_to(writer)?;
		self.destination_chain.write_to(writer)?;
		writer.write_list(&self.exported_outputs)
	}
}

impl ExportTransaction {
	pub(crate) fn read_fields(reader: &mut BufferReader<'_>, vm: UtxoVm) -> Result<Self, CodecError> {
		Ok(Self {
			base: BaseTransaction::read_fields(reader, vm)?,
			destination_chain: BlockchainId::read_from(reader)?,
			exported_outputs: reader.read_list()?,
		})
	}
}

/// Staking period and weight of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
	pub node_id: NodeId,
	pub start_time: u64,
	pub end_time: u64,
	pub weight: u64,
}

impl Validator {
	pub fn stake_period(&self) -> u64 {
		self.end_time.saturating_sub(self.start_time)
	}
}

impl Serializable for Validator {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.node_id.write_to(writer)?;
		writer.write_u64(self.start_time)?;
		writer.write_u64(self.end_time)?;
		writer.write_u64(self.weight)
	}
}

impl Deserializable for Validator {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		Ok(Self {
			node_id: NodeId::read_from(reader)?,
			start_time: reader.read_u64()?,
			end_time: reader.read_u64()?,
			weight: reader.read_u64()?,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddValidatorTransaction {
	pub base: BaseTransaction,
	pub validator: Validator,
	pub stake: Vec<TransferableOutput>,
	pub rewards_owner: OutputOwners,
	/// Delegation fee in millionths.
	pub shares: u32,
}

impl Serializable for AddValidatorTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.base.write_to(writer)?;
		self.validator.write_to(writer)?;
		writer.write_list(&self.stake)?;
		self.rewards_owner.write_to(writer)?;
		writer.write_u32(self.shares)
	}
}

impl Deserializable for AddValidatorTransaction {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		Ok(Self {
			base: BaseTransaction::read_fields(reader, UtxoVm::Platform)?,
			validator: Validator::read_from(reader)?,
			stake: reader.read_list()?,
			rewards_owner: OutputOwners::read_from(reader)?,
			shares: reader.read_u32()?,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDelegatorTransaction {
	pub base: BaseTransaction,
	pub validator: Validator,
	pub stake: Vec<TransferableOutput>,
	pub rewards_owner: OutputOwners,
}

impl Serializable for AddDelegatorTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.base.write_to(writer)?;
		self.validator.write_to(writer)?;
		writer.write_list(&self.stake)?;
		self.rewards_owner.write_to(writer)
	}
}

impl Deserializable for AddDelegatorTransaction {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		Ok(Self {
			base: BaseTransaction::read_fields(reader, UtxoVm::Platform)?,
			validator: Validator::read_from(reader)?,
			stake: reader.read_list()?,
			rewards_owner: OutputOwners::read_from(reader)?,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSupernetValidatorTransaction {
	pub base: BaseTransaction,
	pub validator: Validator,
	pub supernet_id: SupernetId,
	pub supernet_auth: SupernetAuth,
}

impl Serializable for AddSupernetValidatorTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.base.write_to(writer)?;
		self.validator.write_to(writer)?;
		self.supernet_id.write_to(writer)?;
		self.supernet_auth.write_to(writer)
	}
}

impl Deserializable for AddSupernetValidatorTransaction {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		Ok(Self {
			base: BaseTransaction::read_fields(reader, UtxoVm::Platform)?,
			validator: Validator::read_from(reader)?,
			supernet_id: SupernetId::read_from(reader)?,
			supernet_auth: SupernetAuth::read_from(reader)?,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSupernetTransaction {
	pub base: BaseTransaction,
	pub owner: OutputOwners,
}

impl Serializable for CreateSupernetTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.base.write_to(writer)?;
		self.owner.write_to(writer)
	}
}

impl Deserializable for CreateSupernetTransaction {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		Ok(Self {
			base: BaseTransaction::read_fields(reader, UtxoVm::Platform)?,
			owner: OutputOwners::read_from(reader)?,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChainTransaction {
	pub base: BaseTransaction,
	pub supernet_id: SupernetId,
	pub name: String,
	pub vm_id: VmId,
	pub fx_ids: Vec<FxId>,
	pub genesis: Vec<u8>,
	pub supernet_auth: SupernetAuth,
}

impl Serializable for CreateChainTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		self.base.write_to(writer)?;
		self.supernet_id.write_to(writer)?;
		let name_length = u16::try_from(self.name.len())
			.map_err(|_| CodecError::InvalidLength(self.name.len()))?;
		writer.write_u16(name_length)?;
		writer.write_bytes(self.name.as_bytes())?;
		self.vm_id.write_to(writer)?;
		writer.write_list(&self.fx_ids)?;
		writer.write_sized_bytes(&self.genesis)?;
		self.supernet_auth.write_to(writer)
	}
}

impl Deserializable for CreateChainTransaction {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError> {
		let base = BaseTransaction::read_fields(reader, UtxoVm::Platform)?;
		let supernet_id = SupernetId::read_from(reader)?;
		let name_length = usize::from(reader.read_u16()?);
		let name = String::from_utf8(reader.read_bytes(name_length)?.to_vec())
			.map_err(|e| CodecError::InvalidData(format!("chain name: {}", e)))?;
		Ok(Self {
			base,
			supernet_id,
			name,
			vm_id: VmId::read_from(reader)?,
			fx_ids: reader.read_list()?,
			genesis: reader.read_sized_bytes()?.to_vec(),
			supernet_auth: SupernetAuth::read_from(reader)?,
		})
	}
}

/// Atomic import into an EVM chain, crediting EVM balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmImportTransaction {
	pub network_id: u32,
	pub blockchain_id: BlockchainId,
	pub source_chain: BlockchainId,
	pub imported_inputs: Vec<TransferableInput>,
	pub outputs: Vec<EvmOutput>,
}

impl Serializable for EvmImportTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(self.network_id)?;
		self.blockchain_id.write_to(writer)?;
		self.source_chain.write_to(writer)?;
		writer.write_list(&self.imported_inputs)?;
		writer.write_list(&self.outputs)
	}
}

/// Atomic export out of an EVM chain, debiting EVM balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmExportTransaction {
	pub network_id: u32,
	pub blockchain_id: BlockchainId,
	pub destination_chain: BlockchainId,
	pub inputs: Vec<EvmInput>,
	pub exported_outputs: Vec<TransferableOutput>,
}

impl Serializable for EvmExportTransaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u32(self.network_id)?;
		self.blockchain_id.write_to(writer)?;
		self.destination_chain.write_to(writer)?;
		writer.write_list(&self.inputs)?;
		writer.write_list(&self.exported_outputs)
	}
}
