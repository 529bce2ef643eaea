//! Funding UTXOs and their consensus-level provenance.

use bitcoin::{PrivateKey, ScriptBuf, Txid};
use zeroize::ZeroizeOnDrop;

/// The scheme used to sign a given input. Only `Legacy` (P2PKH) is
/// implemented; the variant is kept open-ended (`#[non_exhaustive]`) so a
/// future `P2wpkh`/`Taproot` variant can be added without breaking
/// downstream matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignMode {
    Legacy,
}

/// An unspent transaction output usable as a funding input.
///
/// Invariant: `pk_script` must decode to a P2PKH script matching the
/// public key derived from `private_key`, and `amount_sat` must exceed
/// the selector's dust threshold. Neither is enforced at construction —
/// the selector and signer surface `BadPrivateKey`/`BadAddress` if it
/// doesn't hold.
#[derive(Debug, Clone)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub pk_script: ScriptBuf,
    pub amount_sat: u64,
    pub private_key: PrivateKey,
    pub sign_mode: SignMode,
}

/// Dust handling for change outputs.
#[derive(Debug, Clone, Copy)]
pub struct DustPolicy {
    pub threshold_sat: u64,
}

impl Default for DustPolicy {
    fn default() -> Self {
        // Matches Dogecoin Core's conventional soft-dust floor. Callers on
        // a different network should supply their own.
        Self {
            threshold_sat: 1_000_000,
        }
    }
}

/// Best-effort zeroization wrapper for a private key's raw scalar.
///
/// `bitcoin::PrivateKey` itself doesn't implement `Zeroize`, so the raw
/// 32-byte secret is copied out and wrapped here instead — used for the
/// ephemeral P2SH keypair, which must not outlive the reveal-tx assembly
/// it signs for.
#[derive(ZeroizeOnDrop)]
pub(crate) struct SealedSecretBytes(pub [u8; 32]);
