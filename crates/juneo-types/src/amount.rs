//! Asset amounts with a fixed number of decimals.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest supported decimals; `10^19` is the largest power of ten in a `u64`.
pub const MAX_DECIMALS: u8 = 19;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
	#[error("Invalid amount '{0}'")]
	InvalidFormat(String),
	#[error("Amount '{0}' does not fit in 64 bits")]
	Overflow(String),
	#[error("Unsupported decimals: {0}")]
	InvalidDecimals(u8),
}

/// An integer amount in an asset's smallest unit, with its decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetValue {
	value: u64,
	decimals: u8,
}

impl AssetValue {
	pub fn new(value: u64, decimals: u8) -> Result<Self, AmountError> {
		if decimals > MAX_DECIMALS {
			return Err(AmountError::InvalidDecimals(decimals));
		}
		Ok(Self { value, decimals })
	}

	/// Parses a decimal string such as `"12.5"`.
	///
	/// Fraction digits beyond `decimals` are truncated, never rounded.
	pub fn from_decimal_str(text: &str, decimals: u8) -> Result<Self, AmountError> {
		if decimals > MAX_DECIMALS {
			return Err(AmountError::InvalidDecimals(decimals));
		}
		let invalid = || AmountError::InvalidFormat(text.to_string());
		let (integer, fraction) = text.split_once('.').unwrap_or((text, ""));
		if integer.is_empty() && fraction.is_empty() {
			return Err(invalid());
		}
		if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
			return Err(invalid());
		}

		let kept = &fraction[..fraction.len().min(decimals as usize)];
		let digits = format!("{}{:0<width$}", integer, kept, width = decimals as usize);
		let digits = digits.trim_start_matches('0');
		let value = if digits.is_empty() {
			0
		} else {
			digits
				.parse::<u64>()
				.map_err(|_| AmountError::Overflow(text.to_string()))?
		};
		Ok(Self { value, decimals })
	}

	pub fn value(&self) -> u64 {
		self.value
	}

	pub fn decimals(&self) -> u8 {
		self.decimals
	}

	/// Decimal representation without trailing fraction zeros.
	pub fn to_decimal_string(&self) -> String {
		let digits = self.value.to_string();
		let places = self.decimals as usize;
		if places == 0 {
			return digits;
		}
		let padded = format!("{:0>width$}", digits, width = places + 1);
		let (integer, fraction) = padded.split_at(padded.len() - places);
		let fraction = fraction.trim_end_matches('0');
		if fraction.is_empty() {
			integer.to_string()
		} else {
			format!("{}.{}", integer, fraction)
		}
	}
}

impl fmt::Display for AssetValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_decimal_string())
	}
}
