//! Transaction model and wire format.
//!
//! `Transaction` is a closed sum over every kind this client builds. Its
//! serialization is the exact byte string that is hashed for signing and,
//! followed by credentials, submitted to the chain. Inputs and outputs are
//! written in the order they are stored; builders sort them beforehand.

pub mod input;
pub mod kinds;
pub mod output;
pub mod signed;

use crate::buffer::{
	BufferReader, BufferWriter, CodecError, Deserializable, JuneoBuffer, Serializable,
};
use crate::chain::UtxoVm;
use crate::encoding::sha256;
use crate::ids::{Address, AssetId, BlockchainId, TransactionId};
use crate::utils::constants::*;
use crate::utxo::Utxo;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use input::{
	sort_inputs, EvmInput, EvmOutput, Input, Secp256k1Input, StakeableLockedInput, SupernetAuth,
	TransferableInput,
};
pub use kinds::*;
pub use output::{
	sort_outputs, Output, OutputOwners, Secp256k1Output, StakeableLockedOutput,
	TransferableOutput,
};
pub use signed::{Credential, Signature, SignedTransaction};

/// Transaction kinds, used to key fee schedules and label legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
	Base,
	Import,
	Export,
	AddValidator,
	AddDelegator,
	AddSupernetValidator,
	CreateSupernet,
	CreateChain,
	EvmImport,
	EvmExport,
}

impl fmt::Display for TransactionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			TransactionKind::Base => "base",
			TransactionKind::Import => "import",
			TransactionKind::Export => "export",
			TransactionKind::AddValidator => "add_validator",
			TransactionKind::AddDelegator => "add_delegator",
			TransactionKind::AddSupernetValidator => "add_supernet_validator",
			TransactionKind::CreateSupernet => "create_supernet",
			TransactionKind::CreateChain => "create_chain",
			TransactionKind::EvmImport => "evm_import",
			TransactionKind::EvmExport => "evm_export",
		};
		f.write_str(name)
	}
}

/// An unsigned transaction of any supported kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
	Base(BaseTransaction),
	Import(ImportTransaction),
	Export(ExportTransaction),
	AddValidator(AddValidatorTransaction),
	AddDelegator(AddDelegatorTransaction),
	AddSupernetValidator(AddSupernetValidatorTransaction),
	CreateSupernet(CreateSupernetTransaction),
	CreateChain(CreateChainTransaction),
	EvmImport(EvmImportTransaction),
	EvmExport(EvmExportTransaction),
}

impl Transaction {
	pub fn kind(&self) -> TransactionKind {
		match self {
			Transaction::Base(_) => TransactionKind::Base,
			Transaction::Import(_) => TransactionKind::Import,
			Transaction::Export(_) => TransactionKind::Export,
			Transaction::AddValidator(_) => TransactionKind::AddValidator,
			Transaction::AddDelegator(_) => TransactionKind::AddDelegator,
			Transaction::AddSupernetValidator(_) => TransactionKind::AddSupernetValidator,
			Transaction::CreateSupernet(_) => TransactionKind::CreateSupernet,
			Transaction::CreateChain(_) => TransactionKind::CreateChain,
			Transaction::EvmImport(_) => TransactionKind::EvmImport,
			Transaction::EvmExport(_) => TransactionKind::EvmExport,
		}
	}

	/// Wire type id, which depends on the hosting VM for base/import/export.
	pub fn type_id(&self) -> u32 {
		match self {
			Transaction::Base(tx) => match tx.vm {
				UtxoVm::Jvm => JVM_BASE_TX_TYPE_ID,
				UtxoVm::Platform => PLATFORM_BASE_TX_TYPE_ID,
			},
			Transaction::Import(tx) => match tx.base.vm {
				UtxoVm::Jvm => JVM_IMPORT_TX_TYPE_ID,
				UtxoVm::Platform => PLATFORM_IMPORT_TX_TYPE_ID,
			},
			Transaction::Export(tx) => match tx.base.vm {
				UtxoVm::Jvm => JVM_EXPORT_TX_TYPE_ID,
				UtxoVm::Platform => PLATFORM_EXPORT_TX_TYPE_ID,
			},
			Transaction::AddValidator(_) => ADD_VALIDATOR_TX_TYPE_ID,
			Transaction::AddDelegator(_) => ADD_DELEGATOR_TX_TYPE_ID,
			Transaction::AddSupernetValidator(_) => ADD_SUPERNET_VALIDATOR_TX_TYPE_ID,
			Transaction::CreateSupernet(_) => CREATE_SUPERNET_TX_TYPE_ID,
			Transaction::CreateChain(_) => CREATE_CHAIN_TX_TYPE_ID,
			Transaction::EvmImport(_) => EVM_IMPORT_TX_TYPE_ID,
			Transaction::EvmExport(_) => EVM_EXPORT_TX_TYPE_ID,
		}
	}

	/// Base fields, for every kind except the EVM atomic ones.
	pub fn base(&self) -> Option<&BaseTransaction> {
		match self {
			Transaction::Base(tx) => Some(tx),
			Transaction::Import(tx) => Some(&tx.base),
			Transaction::Export(tx) => Some(&tx.base),
			Transaction::AddValidator(tx) => Some(&tx.base),
			Transaction::AddDelegator(tx) => Some(&tx.base),
			Transaction::AddSupernetValidator(tx) => Some(&tx.base),
			Transaction::CreateSupernet(tx) => Some(&tx.base),
			Transaction::CreateChain(tx) => Some(&tx.base),
			Transaction::EvmImport(_) | Transaction::EvmExport(_) => None,
		}
	}

	pub fn network_id(&self) -> u32 {
		match self {
			Transaction::EvmImport(tx) => tx.network_id,
			Transaction::EvmExport(tx) => tx.network_id,
			other => other.base().map(|base| base.network_id).unwrap_or_default(),
		}
	}

	pub fn blockchain_id(&self) -> BlockchainId {
		match self {
			Transaction::EvmImport(tx) => tx.blockchain_id,
			Transaction::EvmExport(tx) => tx.blockchain_id,
			other => other.base().map(|base| base.blockchain_id).unwrap_or_default(),
		}
	}

	/// UTXO-spending inputs in credential order: base inputs, then imported.
	pub fn transferable_inputs(&self) -> Vec<&TransferableInput> {
		let mut inputs: Vec<&TransferableInput> = self
			.base()
			.map(|base| base.inputs.iter().collect())
			.unwrap_or_default();
		match self {
			Transaction::Import(tx) => inputs.extend(tx.imported_inputs.iter()),
			Transaction::EvmImport(tx) => inputs.extend(tx.imported_inputs.iter()),
			_ => {}
		}
		inputs
	}

	/// Outputs created on this chain or exported, including staked outputs.
	pub fn produced_outputs(&self) -> Vec<&TransferableOutput> {
		let mut outputs: Vec<&TransferableOutput> = self
			.base()
			.map(|base| base.outputs.iter().collect())
			.unwrap_or_default();
		match self {
			Transaction::Export(tx) => outputs.extend(tx.exported_outputs.iter()),
			Transaction::EvmExport(tx) => outputs.extend(tx.exported_outputs.iter()),
			Transaction::AddValidator(tx) => outputs.extend(tx.stake.iter()),
			Transaction::AddDelegator(tx) => outputs.extend(tx.stake.iter()),
			_ => {}
		}
		outputs
	}

	/// Required signers of each credential, in credential order.
	///
	/// One credential per UTXO input, one per EVM input, and a final one for
	/// the supernet authorisation where present.
	pub fn credential_signers(&self) -> Vec<Vec<Address>> {
		let mut signers: Vec<Vec<Address>> = self
			.transferable_inputs()
			.into_iter()
			.map(|input| input.signers.clone())
			.collect();
		match self {
			Transaction::EvmExport(tx) => {
				signers.extend(tx.inputs.iter().map(|input| vec![input.address]));
			}
			Transaction::AddSupernetValidator(tx) => signers.push(tx.supernet_auth.signers.clone()),
			Transaction::CreateChain(tx) => signers.push(tx.supernet_auth.signers.clone()),
			_ => {}
		}
		signers
	}

	/// Total amount of `asset_id` consumed by the inputs.
	pub fn consumed(&self, asset_id: &AssetId) -> u128 {
		let utxo: u128 = self
			.transferable_inputs()
			.into_iter()
			.filter(|input| input.asset_id == *asset_id)
			.map(|input| u128::from(input.amount()))
			.sum();
		let account: u128 = match self {
			Transaction::EvmExport(tx) => tx
				.inputs
				.iter()
				.filter(|input| input.asset_id == *asset_id)
				.map(|input| u128::from(input.amount))
				.sum(),
			_ => 0,
		};
		utxo + account
	}

	/// Total amount of `asset_id` produced by outputs, exports and stake.
	pub fn produced(&self, asset_id: &AssetId) -> u128 {
		let utxo: u128 = self
			.produced_outputs()
			.into_iter()
			.filter(|output| output.asset_id == *asset_id)
			.map(|output| u128::from(output.amount()))
			.sum();
		let account: u128 = match self {
			Transaction::EvmImport(tx) => tx
				.outputs
				.iter()
				.filter(|output| output.asset_id == *asset_id)
				.map(|output| u128::from(output.amount))
				.sum(),
			_ => 0,
		};
		utxo + account
	}

	/// Amount of `asset_id` burned as fee, or `None` if outputs exceed inputs.
	pub fn burned(&self, asset_id: &AssetId) -> Option<u128> {
		self.consumed(asset_id).checked_sub(self.produced(asset_id))
	}

	/// UTXOs this transaction creates in the destination chain's shared memory.
	///
	/// Exported outputs are indexed after the base outputs.
	pub fn exported_utxos(&self, transaction_id: &TransactionId) -> Vec<Utxo> {
		let (offset, exported) = match self {
			Transaction::Export(tx) => (tx.base.outputs.len(), &tx.exported_outputs),
			Transaction::EvmExport(tx) => (0, &tx.exported_outputs),
			_ => return Vec::new(),
		};
		exported
			.iter()
			.enumerate()
			.map(|(i, output)| Utxo {
				transaction_id: *transaction_id,
				output_index: (offset + i) as u32,
				asset_id: output.asset_id,
				output: output.output.clone(),
			})
			.collect()
	}

	/// Decodes the unsigned bytes of a platform chain transaction.
	///
	/// Decoded inputs carry no signers, so only the wire fields compare equal
	/// to the transaction that was serialized.
	pub fn decode_platform(buffer: &JuneoBuffer) -> Result<Self, CodecError> {
		let mut reader = BufferReader::new(buffer);
		let version = reader.read_u16()?;
		if version != CODEC_VERSION {
			return Err(CodecError::InvalidData(format!(
				"unsupported codec version {}",
				version
			)));
		}
		let type_id = reader.read_u32()?;
		let r = &mut reader;
		let transaction = match type_id {
			PLATFORM_BASE_TX_TYPE_ID => {
				Transaction::Base(BaseTransaction::read_fields(r, UtxoVm::Platform)?)
			},
			PLATFORM_IMPORT_TX_TYPE_ID => {
				Transaction::Import(ImportTransaction::read_fields(r, UtxoVm::Platform)?)
			},
			PLATFORM_EXPORT_TX_TYPE_ID => {
				Transaction::Export(ExportTransaction::read_fields(r, UtxoVm::Platform)?)
			},
			ADD_VALIDATOR_TX_TYPE_ID => Transaction::AddValidator(AddValidatorTransaction::read_from(r)?),
			ADD_DELEGATOR_TX_TYPE_ID => Transaction::AddDelegator(AddDelegatorTransaction::read_from(r)?),
			ADD_SUPERNET_VALIDATOR_TX_TYPE_ID => {
				Transaction::AddSupernetValidator(AddSupernetValidatorTransaction::read_from(r)?)
			},
			CREATE_SUPERNET_TX_TYPE_ID => {
				Transaction::CreateSupernet(CreateSupernetTransaction::read_from(r)?)
			},
			CREATE_CHAIN_TX_TYPE_ID => Transaction::CreateChain(CreateChainTransaction::read_from(r)?),
			_ => {
				return Err(CodecError::UnknownTypeId {
					type_id,
					context: "platform transaction",
				})
			},
		};
		if reader.remaining() != 0 {
			return Err(CodecError::InvalidData(format!(
				"{} trailing bytes",
				reader.remaining()
			)));
		}
		Ok(transaction)
	}

	/// SHA-256 of the unsigned bytes; the message every credential signs.
	pub fn signing_hash(&self) -> Result<[u8; 32], CodecError> {
		Ok(sha256(self.serialize()?.as_bytes()))
	}
}

impl Serializable for Transaction {
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError> {
		writer.write_u16(CODEC_VERSION)?;
		writer.write_u32(self.type_id())?;
		match self {
			Transaction::Base(tx) => tx.write_to(writer),
			Transaction::Import(tx) => tx.write_to(writer),
			Transaction::Export(tx) => tx.write_to(writer),
			Transaction::AddValidator(tx) => tx.write_to(writer),
			Transaction::AddDelegator(tx) => tx.write_to(writer),
			Transaction::AddSupernetValidator(tx) => tx.write_to(writer),
			Transaction::CreateSupernet(tx) => tx.write_to(writer),
			Transaction::CreateChain(tx) => tx.write_to(writer),
			Transaction::EvmImport(tx) => tx.write_to(writer),
			Transaction::EvmExport(tx) => tx.write_to(writer),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ids::NodeId;

	fn owner() -> Address {
		Address::new([0x11; 20])
	}

	fn asset() -> AssetId {
		AssetId::new([0xAA; 32])
	}

	fn spend(tx: u8, amount: u64) -> TransferableInput {
		let utxo = Utxo {
			transaction_id: TransactionId::new([tx; 32]),
			output_index: 0,
			asset_id: asset(),
			output: Secp256k1Output::new(amount, 0, 1, vec![owner()]).into(),
		};
		TransferableInput::from_utxo(&utxo, vec![0])
	}

	fn pay(amount: u64) -> TransferableOutput {
		TransferableOutput::new(asset(), Secp256k1Output::new(amount, 0, 1, vec![owner()]))
	}

	fn base(vm: UtxoVm) -> BaseTransaction {
		BaseTransaction {
			vm,
			network_id: 5,
			blockchain_id: BlockchainId::new([0xBB; 32]),
			outputs: vec![pay(60)],
			inputs: vec![spend(1, 100)],
			memo: b"hi".to_vec(),
		}
	}

	#[test]
	fn test_base_transaction_layout() {
		let tx = Transaction::Base(base(UtxoVm::Jvm));
		let hex = tx.serialize().unwrap().to_hex();
		// codec version, type id, network id, blockchain id
		assert_eq!(&hex[..4], "0000");
		assert_eq!(&hex[4..12], "00000000");
		assert_eq!(&hex[12..20], "00000005");
		assert_eq!(&hex[20..84], "bb".repeat(32));
		// one output follows
		assert_eq!(&hex[84..92], "00000001");
		assert!(hex.ends_with("000000026869"));

		let platform = Transaction::Base(base(UtxoVm::Platform));
		assert_eq!(&platform.serialize().unwrap().to_hex()[4..12], "00000022");
	}

	#[test]
	fn test_serialization_is_deterministic() {
		let tx = Transaction::AddDelegator(AddDelegatorTransaction {
			base: base(UtxoVm::Platform),
			validator: Validator {
				node_id: NodeId::new([3; 20]),
				start_time: 10,
				end_time: 20,
				weight: 30,
			},
			stake: vec![pay(30)],
			rewards_owner: OutputOwners::single(owner()),
		});
		assert_eq!(tx.serialize().unwrap(), tx.serialize().unwrap());
		assert_eq!(tx.type_id(), ADD_DELEGATOR_TX_TYPE_ID);
		assert_eq!(tx.burned(&asset()), Some(10));
	}

	#[test]
	fn test_fee_accounting_and_exported_utxos() {
		let export = Transaction::Export(ExportTransaction {
			base: base(UtxoVm::Jvm),
			destination_chain: BlockchainId::new([0xCC; 32]),
			exported_outputs: vec![pay(30)],
		});
		assert_eq!(export.consumed(&asset()), 100);
		assert_eq!(export.produced(&asset()), 90);
		assert_eq!(export.burned(&asset()), Some(10));
		assert_eq!(export.burned(&AssetId::new([1; 32])), Some(0));

		let id = TransactionId::new([9; 32]);
		let utxos = export.exported_utxos(&id);
		assert_eq!(utxos.len(), 1);
		assert_eq!(utxos[0].output_index, 1);
		assert_eq!(utxos[0].transaction_id, id);
		assert_eq!(utxos[0].output.amount(), 30);
	}

	#[test]
	fn test_credential_signers_order() {
		let import = Transaction::Import(ImportTransaction {
			base: base(UtxoVm::Platform),
			source_chain: BlockchainId::new([0xCC; 32]),
			imported_inputs: vec![spend(2, 5)],
		});
		assert_eq!(import.credential_signers(), vec![vec![owner()], vec![owner()]]);

		let evm_export = Transaction::EvmExport(EvmExportTransaction {
			network_id: 5,
			blockchain_id: BlockchainId::new([0xDD; 32]),
			destination_chain: BlockchainId::new([0xBB; 32]),
			inputs: vec![EvmInput {
				address: Address::new([0x22; 20]),
				amount: 50,
				asset_id: asset(),
				nonce: 0,
			}],
			exported_outputs: vec![pay(40)],
		});
		assert_eq!(evm_export.credential_signers(), vec![vec![Address::new([0x22; 20])]]);
		assert_eq!(evm_export.burned(&asset()), Some(10));
		assert_eq!(evm_export.exported_utxos(&TransactionId::default())[0].output_index, 0);
		assert_eq!(&evm_export.serialize().unwrap().to_hex()[4..12], "00000001");
	}

	#[test]
	fn test_decode_platform_keeps_wire_fields() {
		let tx = Transaction::AddDelegator(AddDelegatorTransaction {
			base: base(UtxoVm::Platform),
			validator: Validator {
				node_id: NodeId::new([3; 20]),
				start_time: 10,
				end_time: 20,
				weight: 30,
			},
			stake: vec![pay(30)],
			rewards_owner: OutputOwners::single(owner()),
		});
		let bytes = tx.serialize().unwrap();
		let decoded = Transaction::decode_platform(&bytes).unwrap();

		assert_eq!(decoded.kind(), TransactionKind::AddDelegator);
		assert_eq!(decoded.serialize().unwrap(), bytes);
		assert!(decoded.base().unwrap().inputs[0].signers.is_empty());
		assert_eq!(decoded.burned(&asset()), Some(10));
	}

	#[test]
	fn test_decode_platform_rejects_other_chains_and_trailing_bytes() {
		let jvm = Transaction::Base(base(UtxoVm::Jvm)).serialize().unwrap();
		assert!(matches!(
			Transaction::decode_platform(&jvm),
			Err(CodecError::UnknownTypeId { type_id: 0, .. })
		));

		let mut bytes = Transaction::Base(base(UtxoVm::Platform))
			.serialize()
			.unwrap()
			.as_bytes()
			.to_vec();
		bytes.push(0);
		assert!(matches!(
			Transaction::decode_platform(&JuneoBuffer::from_bytes(bytes)),
			Err(CodecError::InvalidData(_))
		));
	}
}
