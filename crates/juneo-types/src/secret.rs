//! Zeroizing holder for private key material read from configuration.
//!
//! The key text is wiped from memory on drop and is redacted in `Debug`,
//! `Display` and serialized output.

use crate::encoding::{self, DecodingError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const PRIVATE_KEY_PREFIX: &str = "PrivateKey-";
const PRIVATE_KEY_LENGTH: usize = 32;
const REDACTED: &str = "***REDACTED***";

/// A secp256k1 private key in text form: `0x`-prefixed hex or
/// `PrivateKey-<cb58>`.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
	pub fn new(text: impl Into<String>) -> Self {
		Self(Zeroizing::new(text.into()))
	}

	/// Exposes the key text. Never log the returned value.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Decodes the 32 key bytes into zeroizing storage.
	pub fn to_bytes(&self) -> Result<Zeroizing<[u8; PRIVATE_KEY_LENGTH]>, DecodingError> {
		let text = self.0.trim();
		let decoded = Zeroizing::new(match text.strip_prefix(PRIVATE_KEY_PREFIX) {
			Some(cb58) => encoding::decode_cb58(cb58)?,
			None => encoding::decode_hex(text)?,
		});
		if decoded.len() != PRIVATE_KEY_LENGTH {
			return Err(DecodingError::Length {
				expected: PRIVATE_KEY_LENGTH,
				actual: decoded.len(),
			});
		}
		let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
		bytes.copy_from_slice(&decoded);
		Ok(bytes)
	}
}

impl fmt::Debug for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretKey({})", REDACTED)
	}
}

impl fmt::Display for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl PartialEq for SecretKey {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretKey {}

impl Serialize for SecretKey {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretKey {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		String::deserialize(deserializer).map(SecretKey::new)
	}
}
