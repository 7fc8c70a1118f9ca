//! Virtual machine kinds hosted by the network.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The virtual machine a chain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmKind {
	/// The platform chain: staking, supernets and chain creation.
	Platform,
	/// UTXO asset chain.
	Jvm,
	/// Account-model EVM chain.
	Evm,
}

impl VmKind {
	/// Returns the UTXO flavour of this VM, if it has one.
	pub fn utxo_vm(&self) -> Option<UtxoVm> {
		match self {
			VmKind::Platform => Some(UtxoVm::Platform),
			VmKind::Jvm => Some(UtxoVm::Jvm),
			VmKind::Evm => None,
		}
	}
}

impl fmt::Display for VmKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			VmKind::Platform => "platform",
			VmKind::Jvm => "jvm",
			VmKind::Evm => "evm",
		};
		f.write_str(name)
	}
}

/// VMs whose transactions spend UTXOs; selects the base/import/export type ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtxoVm {
	Platform,
	Jvm,
}

impl From<UtxoVm> for VmKind {
	fn from(vm: UtxoVm) -> Self {
		match vm {
			UtxoVm::Platform => VmKind::Platform,
			UtxoVm::Jvm => VmKind::Jvm,
		}
	}
}
