//! Wire constants: codec version and type ids.

/// Codec version prefixed to every serialized transaction and UTXO.
pub const CODEC_VERSION: u16 = 0;

// Components shared by every UTXO chain.
pub const SECP256K1_INPUT_TYPE_ID: u32 = 0x05;
pub const SECP256K1_OUTPUT_TYPE_ID: u32 = 0x07;
pub const SECP256K1_CREDENTIAL_TYPE_ID: u32 = 0x09;
pub const SUPERNET_AUTH_TYPE_ID: u32 = 0x0a;
pub const OUTPUT_OWNERS_TYPE_ID: u32 = 0x0b;
pub const STAKEABLE_LOCKED_INPUT_TYPE_ID: u32 = 0x15;
pub const STAKEABLE_LOCKED_OUTPUT_TYPE_ID: u32 = 0x16;

// JVM (asset chain) transactions.
pub const JVM_BASE_TX_TYPE_ID: u32 = 0x00;
pub const JVM_IMPORT_TX_TYPE_ID: u32 = 0x03;
pub const JVM_EXPORT_TX_TYPE_ID: u32 = 0x04;

// Platform chain transactions.
pub const ADD_VALIDATOR_TX_TYPE_ID: u32 = 0x0c;
pub const ADD_SUPERNET_VALIDATOR_TX_TYPE_ID: u32 = 0x0d;
pub const ADD_DELEGATOR_TX_TYPE_ID: u32 = 0x0e;
pub const CREATE_CHAIN_TX_TYPE_ID: u32 = 0x0f;
pub const CREATE_SUPERNET_TX_TYPE_ID: u32 = 0x10;
pub const PLATFORM_IMPORT_TX_TYPE_ID: u32 = 0x11;
pub const PLATFORM_EXPORT_TX_TYPE_ID: u32 = 0x12;
pub const PLATFORM_BASE_TX_TYPE_ID: u32 = 0x22;

// EVM atomic transactions.
pub const EVM_IMPORT_TX_TYPE_ID: u32 = 0x00;
pub const EVM_EXPORT_TX_TYPE_ID: u32 = 0x01;

/// Maximum length of a transaction memo.
pub const MAX_MEMO_LENGTH: usize = 256;

/// Length of a recoverable secp256k1 signature (`r || s || v`).
pub const SIGNATURE_LENGTH: usize = 65;
