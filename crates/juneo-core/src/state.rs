//! Executable operation state machine.
//!
//! An `ExecutableOperation` moves through
//! Created -> Estimated -> Executing -> {Done | Error | Timeout}. Transitions
//! are checked against a static table, receipts form an append-only log with
//! one entry per leg, and every mutation is published to watchers.

use crate::operation::{Leg, Operation};
use juneo_types::{BlockchainId, Receipt, TransactionId, TransactionStatus};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// Errors raised by invalid state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition {
		from: OperationStatus,
		to: OperationStatus,
	},
	#[error("Operation is {0} and accepts no more receipts")]
	Terminal(OperationStatus),
	#[error("No receipt for leg {0}")]
	UnknownLeg(usize),
	#[error("Cannot complete: {accepted} of {planned} legs accepted")]
	Incomplete { accepted: usize, planned: usize },
}

/// Lifecycle status of an executable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationStatus {
	Created,
	Estimated,
	Executing,
	Done,
	Error,
	Timeout,
}

impl OperationStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			OperationStatus::Done | OperationStatus::Error | OperationStatus::Timeout
		)
	}
}

impl fmt::Display for OperationStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			OperationStatus::Created => "created",
			OperationStatus::Estimated => "estimated",
			OperationStatus::Executing => "executing",
			OperationStatus::Done => "done",
			OperationStatus::Error => "error",
			OperationStatus::Timeout => "timeout",
		};
		f.write_str(name)
	}
}

// Static transition table - each state maps to allowed next states
static TRANSITIONS: Lazy<HashMap<OperationStatus, HashSet<OperationStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OperationStatus::Created,
		HashSet::from([OperationStatus::Estimated, OperationStatus::Error]),
	);
	m.insert(
		OperationStatus::Estimated,
		HashSet::from([OperationStatus::Executing, OperationStatus::Error]),
	);
	m.insert(
		OperationStatus::Executing,
		HashSet::from([
			OperationStatus::Done,
			OperationStatus::Error,
			OperationStatus::Timeout,
		]),
	);
	m.insert(OperationStatus::Done, HashSet::new()); // terminal
	m.insert(OperationStatus::Error, HashSet::new()); // terminal
	m.insert(OperationStatus::Timeout, HashSet::new()); // terminal
	m
});

fn is_valid_transition(from: OperationStatus, to: OperationStatus) -> bool {
	TRANSITIONS
		.get(&from)
		.is_some_and(|allowed| allowed.contains(&to))
}

/// Point-in-time view of an operation, as published to watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSnapshot {
	pub id: Uuid,
	pub status: OperationStatus,
	pub receipts: Vec<Receipt>,
}

/// Runtime state of one operation: status, planned legs and receipts.
///
/// Owned by the caller; only the engine mutates it while executing.
/// Observers follow progress through [`ExecutableOperation::subscribe`].
#[derive(Debug)]
pub struct ExecutableOperation {
	id: Uuid,
	operation: Operation,
	legs: Vec<Leg>,
	status: OperationStatus,
	receipts: Vec<Receipt>,
	sender: watch::Sender<OperationSnapshot>,
}

impl ExecutableOperation {
	/// Creates an operation in `Created` with no planned legs.
	pub fn new(operation: Operation) -> Self {
		let id = Uuid::new_v4();
		let (sender, _) = watch::channel(OperationSnapshot {
			id,
			status: OperationStatus::Created,
			receipts: Vec::new(),
		});
		Self {
			id,
			operation,
			legs: Vec::new(),
			status: OperationStatus::Created,
			receipts: Vec::new(),
			sender,
		}
	}

	/// Creates an operation in `Estimated` with its legs planned.
	pub(crate) fn estimated(operation: Operation, legs: Vec<Leg>) -> Result<Self, StateError> {
		let mut executable = Self::new(operation);
		executable.plan(legs)?;
		Ok(executable)
	}

	pub fn id(&self) -> Uuid {
		self.id
	}

	pub fn operation(&self) -> &Operation {
		&self.operation
	}

	pub fn status(&self) -> OperationStatus {
		self.status
	}

	/// Legs planned at estimation, in execution order.
	pub fn legs(&self) -> &[Leg] {
		&self.legs
	}

	/// Receipts of the legs started so far, in execution order.
	pub fn receipts(&self) -> &[Receipt] {
		&self.receipts
	}

	pub fn snapshot(&self) -> OperationSnapshot {
		OperationSnapshot {
			id: self.id,
			status: self.status,
			receipts: self.receipts.clone(),
		}
	}

	/// Watches status and receipt changes.
	pub fn subscribe(&self) -> watch::Receiver<OperationSnapshot> {
		self.sender.subscribe()
	}

	fn publish(&self) {
		self.sender.send_replace(self.snapshot());
	}

	/// Records the planned legs and moves to `Estimated`.
	pub(crate) fn plan(&mut self, legs: Vec<Leg>) -> Result<(), StateError> {
		self.legs = legs;
		self.transition(OperationStatus::Estimated)
	}

	/// Moves to `to` if the transition table allows it.
	///
	/// `Done` additionally requires every planned leg to be accepted.
	pub(crate) fn transition(&mut self, to: OperationStatus) -> Result<(), StateError> {
		if !is_valid_transition(self.status, to) {
			return Err(StateError::InvalidTransition {
				from: self.status,
				to,
			});
		}
		if to == OperationStatus::Done {
			let accepted = self.receipts.iter().filter(|r| r.is_accepted()).count();
			if accepted != self.legs.len() || accepted != self.receipts.len() {
				return Err(StateError::Incomplete {
					accepted,
					planned: self.legs.len(),
				});
			}
		}
		info!(operation_id = %self.id, from = %self.status, to = %to, "Operation status changed");
		self.status = to;
		self.publish();
		Ok(())
	}

	/// Appends the receipt of a new leg on `chain_id`, returning its index.
	pub(crate) fn start_leg(&mut self, chain_id: BlockchainId) -> Result<usize, StateError> {
		if self.status.is_terminal() {
			return Err(StateError::Terminal(self.status));
		}
		self.receipts.push(Receipt::new(chain_id));
		self.publish();
		Ok(self.receipts.len() - 1)
	}

	fn receipt_mut(&mut self, leg: usize) -> Result<&mut Receipt, StateError> {
		if self.status.is_terminal() {
			return Err(StateError::Terminal(self.status));
		}
		self.receipts.get_mut(leg).ok_or(StateError::UnknownLeg(leg))
	}

	pub(crate) fn set_transaction_id(
		&mut self,
		leg: usize,
		transaction_id: TransactionId,
	) -> Result<(), StateError> {
		self.receipt_mut(leg)?.transaction_id = Some(transaction_id);
		self.publish();
		Ok(())
	}

	pub(crate) fn set_transaction_status(
		&mut self,
		leg: usize,
		status: TransactionStatus,
	) -> Result<(), StateError> {
		let receipt = self.receipt_mut(leg)?;
		if receipt.transaction_status == Some(status) {
			return Ok(());
		}
		receipt.transaction_status = Some(status);
		self.publish();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::operation::{LegKind, WrapOperation};
	use juneo_builder::FeeData;
	use juneo_types::AssetId;

	fn operation() -> Operation {
		Operation::Wrap(WrapOperation {
			chain: BlockchainId::new([0x0e; 32]),
			amount: 1,
		})
	}

	fn leg() -> Leg {
		Leg {
			chain_id: BlockchainId::new([0x0e; 32]),
			kind: LegKind::EvmCall,
			fee: FeeData::new(AssetId::default(), 1),
		}
	}

	#[test]
	fn test_transition_table() {
		use OperationStatus::*;
		assert!(is_valid_transition(Created, Estimated));
		assert!(is_valid_transition(Estimated, Executing));
		assert!(is_valid_transition(Executing, Timeout));
		assert!(!is_valid_transition(Created, Executing));
		assert!(!is_valid_transition(Executing, Executing));
		for terminal in [Done, Error, Timeout] {
			for to in [Created, Estimated, Executing, Done, Error, Timeout] {
				assert!(!is_valid_transition(terminal, to));
			}
		}
	}

	#[test]
	fn test_executing_entered_once() {
		let mut op = ExecutableOperation::estimated(operation(), vec![leg()]).unwrap();
		op.transition(OperationStatus::Executing).unwrap();
		assert_eq!(
			op.transition(OperationStatus::Executing),
			Err(StateError::InvalidTransition {
				from: OperationStatus::Executing,
				to: OperationStatus::Executing,
			})
		);
	}

	#[test]
	fn test_done_requires_every_leg_accepted() {
		let mut op = ExecutableOperation::estimated(operation(), vec![leg()]).unwrap();
		op.transition(OperationStatus::Executing).unwrap();
		assert!(matches!(
			op.transition(OperationStatus::Done),
			Err(StateError::Incomplete { accepted: 0, planned: 1 })
		));

		let index = op.start_leg(leg().chain_id).unwrap();
		op.set_transaction_status(index, TransactionStatus::Accepted)
			.unwrap();
		op.transition(OperationStatus::Done).unwrap();
		assert_eq!(op.status(), OperationStatus::Done);
	}

	#[test]
	fn test_terminal_rejects_receipts() {
		let mut op = ExecutableOperation::estimated(operation(), vec![leg()]).unwrap();
		op.transition(OperationStatus::Executing).unwrap();
		let index = op.start_leg(leg().chain_id).unwrap();
		op.transition(OperationStatus::Timeout).unwrap();

		assert_eq!(
			op.start_leg(leg().chain_id),
			Err(StateError::Terminal(OperationStatus::Timeout))
		);
		assert_eq!(
			op.set_transaction_status(index, TransactionStatus::Accepted),
			Err(StateError::Terminal(OperationStatus::Timeout))
		);
		assert_eq!(op.receipts().len(), 1);
	}

	#[test]
	fn test_watchers_see_updates() {
		let mut op = ExecutableOperation::new(operation());
		let receiver = op.subscribe();
		assert_eq!(receiver.borrow().status, OperationStatus::Created);

		op.plan(vec![leg()]).unwrap();
		op.transition(OperationStatus::Executing).unwrap();
		let index = op.start_leg(leg().chain_id).unwrap();
		op.set_transaction_id(index, TransactionId::new([1; 32]))
			.unwrap();

		let snapshot = receiver.borrow().clone();
		assert_eq!(snapshot.id, op.id());
		assert_eq!(snapshot.status, OperationStatus::Executing);
		assert_eq!(
			snapshot.receipts[0].transaction_id,
			Some(TransactionId::new([1; 32]))
		);
	}
}
