//! Per-chain transaction status and operation receipts.

use crate::ids::{BlockchainId, TransactionId};
use serde::{Deserialize, Serialize};

/// Status of a submitted transaction as reported by its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
	Pending,
	Accepted,
	Rejected,
	Unknown,
}

impl TransactionStatus {
	/// Accepted and rejected are irreversible.
	pub fn is_final(&self) -> bool {
		matches!(self, TransactionStatus::Accepted | TransactionStatus::Rejected)
	}
}

/// Observable record of one leg of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
	pub chain_id: BlockchainId,
	pub transaction_id: Option<TransactionId>,
	pub transaction_status: Option<TransactionStatus>,
}

impl Receipt {
	pub fn new(chain_id: BlockchainId) -> Self {
		Self {
			chain_id,
			transaction_id: None,
			transaction_status: None,
		}
	}

	pub fn is_accepted(&self) -> bool {
		self.transaction_status == Some(TransactionStatus::Accepted)
	}
}
