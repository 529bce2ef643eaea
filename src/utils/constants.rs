/// Maximum serialized redeem script size for a single chunk.
pub const MAX_REDEEM_SCRIPT_SIZE: usize = 10_000;

/// DER signature (max) + SIGHASH_ALL byte, used by the fee estimator.
pub const ECDSA_SIG_MAX_SIZE: usize = 72 + 1;

/// Compressed secp256k1 public key size.
pub const COMPRESSED_PUBKEY_SIZE: usize = 33;
