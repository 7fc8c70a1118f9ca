//! EVM call encoding for gas-token transfers and the wrapped gas token.

use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};
use juneo_types::Address;

// Solidity interface of the wrapped gas token contract.
sol! {
	interface IWrappedGasToken {
		function deposit() external payable;
		function withdraw(uint256 amount) external;
	}
}

/// Gas limit of a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
/// Gas limit for wrapping and unwrapping.
pub const WRAPPED_GAS_LIMIT: u64 = 60_000;

/// Unsigned EVM call: target, value in wei and calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmCallData {
	pub to: Address,
	pub value: u128,
	pub data: Vec<u8>,
	pub gas_limit: u64,
}

/// Sends `value` wei to `recipient`.
pub fn transfer(recipient: Address, value: u128) -> EvmCallData {
	EvmCallData {
		to: recipient,
		value,
		data: Vec::new(),
		gas_limit: TRANSFER_GAS_LIMIT,
	}
}

/// Deposits `value` wei into the wrapped gas token contract.
pub fn wrap(contract: Address, value: u128) -> EvmCallData {
	EvmCallData {
		to: contract,
		value,
		data: IWrappedGasToken::depositCall {}.abi_encode(),
		gas_limit: WRAPPED_GAS_LIMIT,
	}
}

/// Withdraws `amount` wei of gas token from the wrapped contract.
pub fn unwrap(contract: Address, amount: u128) -> EvmCallData {
	EvmCallData {
		to: contract,
		value: 0,
		data: IWrappedGasToken::withdrawCall {
			amount: U256::from(amount),
		}
		.abi_encode(),
		gas_limit: WRAPPED_GAS_LIMIT,
	}
}
