//! Base58Check Dogecoin addresses, Hash160, and the legacy script
//! templates.
//!
//! `bitcoin::Address` isn't used here: its Base58 version bytes are
//! hardcoded per `bitcoin::Network` variant, and Dogecoin has no such
//! variant. Hashing reuses `bitcoin::hashes` (the same re-export of
//! `bitcoin_hashes` the signer uses for sighashing) so the whole crate
//! agrees on one hash implementation; Base58Check itself is `bs58`'s
//! `check` feature rather than a hand-rolled checksum.

use bitcoin::hashes::{hash160, sha256d, Hash};
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160};
use bitcoin::script::Builder as ScriptBuilder;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{Script, ScriptBuf};

use crate::network::NetworkParams;
use crate::{Error, Result};

/// RIPEMD160(SHA256(bytes)).
pub fn hash160(bytes: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(bytes).to_byte_array()
}

/// SHA256(SHA256(bytes)).
pub fn double_sha256(bytes: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(bytes).to_byte_array()
}

/// Compressed secp256k1 public key bytes (`02||X` or `03||X` by Y parity).
pub fn compressed_pubkey(pubkey: &PublicKey) -> [u8; 33] {
    pubkey.serialize()
}

/// Which legacy template a decoded address resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    P2pkh,
    P2sh,
}

/// Base58Check-encode `version || payload || checksum`.
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut buf = Vec::with_capacity(1 + payload.len());
    buf.push(version);
    buf.extend_from_slice(payload);
    bs58::encode(buf).with_check().into_string()
}

/// Decode and verify a Base58Check string, returning `(version, payload)`.
pub fn base58check_decode(address: &str) -> Result<(u8, Vec<u8>)> {
    let decoded = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| Error::BadAddress(format!("checksum or encoding error: {e}")))?;
    let (version, payload) = decoded
        .split_first()
        .ok_or_else(|| Error::BadAddress("empty payload".to_string()))?;
    Ok((*version, payload.to_vec()))
}

/// Decode a Base58Check address against a specific network's version
/// bytes, returning the 20-byte Hash160 and whether it's a P2PKH or P2SH
/// destination.
pub fn decode_address(address: &str, network: &NetworkParams) -> Result<([u8; 20], AddressKind)> {
    let (version, payload) = base58check_decode(address)?;
    if payload.len() != 20 {
        return Err(Error::BadAddress(format!(
            "expected a 20-byte hash, got {}",
            payload.len()
        )));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload);

    if version == network.p2pkh_version {
        Ok((hash, AddressKind::P2pkh))
    } else if version == network.p2sh_version {
        Ok((hash, AddressKind::P2sh))
    } else {
        Err(Error::BadAddress(format!(
            "version byte 0x{version:02x} matches neither this network's P2PKH (0x{:02x}) nor P2SH (0x{:02x})",
            network.p2pkh_version, network.p2sh_version
        )))
    }
}

/// `OP_DUP OP_HASH160 <push20> OP_EQUALVERIFY OP_CHECKSIG`.
pub fn p2pkh_script(hash: &[u8; 20]) -> ScriptBuf {
    ScriptBuilder::new()
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(hash)
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// `OP_HASH160 <push20> OP_EQUAL`.
pub fn p2sh_script_from_hash(hash: &[u8; 20]) -> ScriptBuf {
    ScriptBuilder::new()
        .push_opcode(OP_HASH160)
        .push_slice(hash)
        .push_opcode(OP_EQUAL)
        .into_script()
}

/// P2SH script for a redeem script (hashes it first).
pub fn p2sh_script(redeem_script: &Script) -> ScriptBuf {
    p2sh_script_from_hash(&hash160(redeem_script.as_bytes()))
}

/// P2PKH address string for a public key.
pub fn p2pkh_address(pubkey: &PublicKey, network: &NetworkParams) -> String {
    let hash = hash160(&compressed_pubkey(pubkey));
    base58check_encode(network.p2pkh_version, &hash)
}

/// P2SH address string for a redeem script.
pub fn p2sh_address(redeem_script: &Script, network: &NetworkParams) -> String {
    let hash = hash160(redeem_script.as_bytes());
    base58check_encode(network.p2sh_version, &hash)
}

/// Resolve an address string to the pk-script a funding output must carry
/// to be spendable by it — used when a caller passes an output or change
/// address rather than a raw script.
pub fn script_pubkey_for_address(address: &str, network: &NetworkParams) -> Result<ScriptBuf> {
    let (hash, kind) = decode_address(address, network)?;
    Ok(match kind {
        AddressKind::P2pkh => p2pkh_script(&hash),
        AddressKind::P2sh => p2sh_script_from_hash(&hash),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::Secp256k1;

    #[test]
    fn hash160_matches_known_vector() {
        // RIPEMD160(SHA256("hello world"))
        let got = hash160(b"hello world");
        assert_eq!(hex::encode(got), "d7d5ee7824ff93f94c3055af9382c86c68b5ca92");
    }

    #[test]
    fn base58check_round_trips() {
        let encoded = base58check_encode(0x1e, &[1u8; 20]);
        let (version, payload) = base58check_decode(&encoded).unwrap();
        assert_eq!(version, 0x1e);
        assert_eq!(payload, vec![1u8; 20]);
    }

    #[test]
    fn base58check_rejects_tampered_checksum() {
        let mut encoded = base58check_encode(0x1e, &[1u8; 20]);
        encoded.push('1');
        assert!(base58check_decode(&encoded).is_err());
    }

    #[test]
    fn decode_address_rejects_wrong_network_version() {
        let encoded = base58check_encode(0x00, &[1u8; 20]); // bitcoin mainnet P2PKH
        let err = decode_address(&encoded, &NetworkParams::DOGECOIN_MAINNET).unwrap_err();
        assert!(matches!(err, Error::BadAddress(_)));
    }

    #[test]
    fn p2pkh_address_round_trips_through_script_pubkey() {
        let secp = Secp256k1::new();
        let sk = bitcoin::secp256k1::SecretKey::from_slice(&[7u8; 32]).unwrap();
        let pubkey = PublicKey::from_secret_key(&secp, &sk);
        let address = p2pkh_address(&pubkey, &NetworkParams::DOGECOIN_MAINNET);
        let script = script_pubkey_for_address(&address, &NetworkParams::DOGECOIN_MAINNET).unwrap();
        assert_eq!(script, p2pkh_script(&hash160(&compressed_pubkey(&pubkey))));
    }

    #[test]
    fn p2sh_script_matches_fixed_template() {
        let redeem = ScriptBuf::from(vec![0x51]); // OP_1
        let script = p2sh_script(&redeem);
        let bytes = script.as_bytes();
        assert_eq!(bytes[0], OP_HASH160.to_u8());
        assert_eq!(bytes[1], 0x14);
        assert_eq!(bytes.len(), 2 + 20 + 1);
        assert_eq!(*bytes.last().unwrap(), OP_EQUAL.to_u8());
    }
}
