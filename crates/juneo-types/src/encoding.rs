//! Text encodings used by the network: hex, base58, CB58 and bech32.
//!
//! CB58 is base58 over the payload followed by the last four bytes of its
//! SHA-256 digest. Bech32 is used by node APIs for chain-prefixed addresses
//! such as `P-socotra1...`.

use sha2::{Digest, Sha256};
use thiserror::Error;

const CHECKSUM_LENGTH: usize = 4;
const BECH32_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const BECH32_GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
const BECH32_CHECKSUM_LENGTH: usize = 6;

/// Errors raised while decoding text into bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodingError {
	#[error("Invalid hex: {0}")]
	Hex(String),
	#[error("Invalid base58: {0}")]
	Base58(String),
	#[error("Invalid checksum")]
	Checksum,
	#[error("Encoded value too short: {0} bytes")]
	TooShort(usize),
	#[error("Invalid bech32: {0}")]
	Bech32(String),
	#[error("Invalid length: expected {expected} bytes, got {actual}")]
	Length { expected: usize, actual: usize },
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
	Sha256::digest(data).into()
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LENGTH] {
	let digest = sha256(data);
	let mut checksum = [0u8; CHECKSUM_LENGTH];
	checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_LENGTH..]);
	checksum
}

/// Lowercase hex without prefix.
pub fn encode_hex(data: &[u8]) -> String {
	hex::encode(data)
}

/// Decodes hex with or without a `0x` prefix.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, DecodingError> {
	let stripped = crate::utils::without_0x_prefix(text);
	hex::decode(stripped).map_err(|e| DecodingError::Hex(e.to_string()))
}

pub fn encode_base58(data: &[u8]) -> String {
	bs58::encode(data).into_string()
}

pub fn decode_base58(text: &str) -> Result<Vec<u8>, DecodingError> {
	bs58::decode(text)
		.into_vec()
		.map_err(|e| DecodingError::Base58(e.to_string()))
}

pub fn encode_cb58(data: &[u8]) -> String {
	let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LENGTH);
	payload.extend_from_slice(data);
	payload.extend_from_slice(&checksum(data));
	encode_base58(&payload)
}

/// Decodes CB58 and verifies the trailing checksum.
pub fn decode_cb58(text: &str) -> Result<Vec<u8>, DecodingError> {
	let mut decoded = decode_base58(text)?;
	if decoded.len() < CHECKSUM_LENGTH {
		return Err(DecodingError::TooShort(decoded.len()));
	}
	let split = decoded.len() - CHECKSUM_LENGTH;
	if checksum(&decoded[..split]) != decoded[split..] {
		return Err(DecodingError::Checksum);
	}
	decoded.truncate(split);
	Ok(decoded)
}

fn bech32_polymod(values: &[u8]) -> u32 {
	let mut checksum: u32 = 1;
	for value in values {
		let top = checksum >> 25;
		checksum = ((checksum & 0x01ff_ffff) << 5) ^ u32::from(*value);
		for (i, generator) in BECH32_GENERATOR.iter().enumerate() {
			if (top >> i) & 1 == 1 {
				checksum ^= generator;
			}
		}
	}
	checksum
}

fn bech32_hrp_expand(hrp: &str) -> Vec<u8> {
	let bytes = hrp.as_bytes();
	let mut expanded = Vec::with_capacity(bytes.len() * 2 + 1);
	expanded.extend(bytes.iter().map(|b| b >> 5));
	expanded.push(0);
	expanded.extend(bytes.iter().map(|b| b & 0x1f));
	expanded
}

fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, DecodingError> {
	let mut accumulator: u32 = 0;
	let mut bits: u32 = 0;
	let max_value: u32 = (1 << to) - 1;
	let mut result = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
	for value in data {
		let value = u32::from(*value);
		if value >> from != 0 {
			return Err(DecodingError::Bech32(format!("value {} out of range", value)));
		}
		accumulator = (accumulator << from) | value;
		bits += from;
		while bits >= to {
			bits -= to;
			result.push(((accumulator >> bits) & max_value) as u8);
		}
	}
	if pad {
		if bits > 0 {
			result.push(((accumulator << (to - bits)) & max_value) as u8);
		}
	} else if bits >= from || (accumulator << (to - bits)) & max_value != 0 {
		return Err(DecodingError::Bech32("invalid padding".to_string()));
	}
	Ok(result)
}

/// Encodes `data` as bech32 with the given human-readable part.
pub fn encode_bech32(hrp: &str, data: &[u8]) -> Result<String, DecodingError> {
	if hrp.is_empty() || !hrp.bytes().all(|b| (33..=126).contains(&b)) {
		return Err(DecodingError::Bech32(format!("invalid human-readable part '{}'", hrp)));
	}
	let hrp = hrp.to_lowercase();
	let words = convert_bits(data, 8, 5, true)?;

	let mut values = bech32_hrp_expand(&hrp);
	values.extend_from_slice(&words);
	values.extend_from_slice(&[0u8; BECH32_CHECKSUM_LENGTH]);
	let polymod = bech32_polymod(&values) ^ 1;

	let mut encoded = String::with_capacity(hrp.len() + 1 + words.len() + BECH32_CHECKSUM_LENGTH);
	encoded.push_str(&hrp);
	encoded.push('1');
	for word in &words {
		encoded.push(BECH32_CHARSET[*word as usize] as char);
	}
	for i in 0..BECH32_CHECKSUM_LENGTH {
		let word = (polymod >> (5 * (5 - i))) & 0x1f;
		encoded.push(BECH32_CHARSET[word as usize] as char);
	}
	Ok(encoded)
}

/// Decodes bech32 text into its human-readable part and payload bytes.
pub fn decode_bech32(text: &str) -> Result<(String, Vec<u8>), DecodingError> {
	let has_lower = text.bytes().any(|b| b.is_ascii_lowercase());
	let has_upper = text.bytes().any(|b| b.is_ascii_uppercase());
	if has_lower && has_upper {
		return Err(DecodingError::Bech32("mixed case".to_string()));
	}
	let text = text.to_lowercase();
	let separator = text
		.rfind('1')
		.ok_or_else(|| DecodingError::Bech32("missing separator".to_string()))?;
	let (hrp, data) = (&text[..separator], &text[separator + 1..]);
	if hrp.is_empty() || data.len() < BECH32_CHECKSUM_LENGTH {
		return Err(DecodingError::Bech32(format!("malformed value '{}'", text)));
	}

	let words = data
		.bytes()
		.map(|c| {
			BECH32_CHARSET
				.iter()
				.position(|x| *x == c)
				.map(|p| p as u8)
				.ok_or_else(|| DecodingError::Bech32(format!("invalid character '{}'", c as char)))
		})
		.collect::<Result<Vec<u8>, _>>()?;

	let mut values = bech32_hrp_expand(hrp);
	values.extend_from_slice(&words);
	if bech32_polymod(&values) != 1 {
		return Err(DecodingError::Checksum);
	}

	let payload = convert_bits(&words[..words.len() - BECH32_CHECKSUM_LENGTH], 5, 8, false)?;
	Ok((hrp.to_string(), payload))
}
