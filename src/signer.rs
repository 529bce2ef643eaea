//! Legacy (non-SegWit) ECDSA signing.
//!
//! A trait abstracting "sign this digest" plus a local-key
//! implementation; the core is synchronous and non-blocking, so there's
//! no async trait here, and there's one flat `PrivateKey` per UTXO (no HD
//! derivation tree) and no Schnorr branch (no Taproot, so no schnorr
//! signatures at all). Attaching the produced signature to the right
//! input is `build_p2pkh_sig_script`/`build_p2sh_sig_script`, writing into
//! `script_sig` rather than a segwit `Witness`.

use bitcoin::ecdsa::Signature as EcdsaSignature;
use bitcoin::script::Builder as ScriptBuilder;
use bitcoin::secp256k1::{self, Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::sighash::SighashCache;
use bitcoin::{EcdsaSighashType, PrivateKey, Script, ScriptBuf, Transaction};

use crate::utils::script;
use crate::Result;

/// Digest-signing abstraction. `LocalSigner` is the only implementation
/// shipped, but the trait seam lets a caller substitute a remote signer
/// (HSM, hardware wallet) without touching the assembler.
pub trait LegacySigner {
    fn public_key(&self) -> PublicKey;
    fn sign_ecdsa(&self, digest: [u8; 32]) -> Result<EcdsaSignature>;
}

/// Signs with an in-process `bitcoin::PrivateKey`.
pub struct LocalSigner {
    secret_key: SecretKey,
    public_key: PublicKey,
    secp: Secp256k1<secp256k1::All>,
}

impl LocalSigner {
    pub fn new(private_key: &PrivateKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = private_key.public_key(&secp);
        Self {
            secret_key: private_key.inner,
            public_key,
            secp,
        }
    }
}

impl LegacySigner for LocalSigner {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn sign_ecdsa(&self, digest: [u8; 32]) -> Result<EcdsaSignature> {
        let message = Message::from_digest(digest);
        // secp256k1's sign_ecdsa already produces a low-S signature, so
        // the low-S invariant holds without extra normalization.
        let sig = self.secp.sign_ecdsa(&message, &self.secret_key);
        Ok(EcdsaSignature::sighash_all(sig))
    }
}

/// The legacy (pre-segwit) sighash digest for `input_index`, computed
/// against `subscript` (the spent pkScript for a plain P2PKH input, or the
/// inscription redeem script for the P2SH reveal input). Uses `bitcoin`'s
/// own legacy sighash implementation rather than a hand-rolled
/// modified-tx digest.
pub fn sighash_legacy(tx: &Transaction, input_index: usize, subscript: &Script) -> Result<[u8; 32]> {
    let mut cache = SighashCache::new(tx);
    let sighash = cache.legacy_signature_hash(input_index, subscript, EcdsaSighashType::All.to_u32())?;
    Ok(sighash.to_byte_array())
}

/// `<push sig+SIGHASH_ALL> <push compressed pubkey>` — spends a P2PKH
/// output.
pub fn build_p2pkh_sig_script(sig: &EcdsaSignature, pubkey: &PublicKey) -> Result<ScriptBuf> {
    Ok(ScriptBuilder::new()
        .push_slice(script::push_bytes(&sig.to_vec())?)
        .push_slice(script::push_bytes(&pubkey.serialize())?)
        .into_script())
}

/// `<push sig+SIGHASH_ALL> <push compressed pubkey> <push redeem_script>` —
/// spends the P2SH inscription output, re-exposing the redeem script for
/// the parser to later extract.
pub fn build_p2sh_sig_script(
    sig: &EcdsaSignature,
    pubkey: &PublicKey,
    redeem_script: &Script,
) -> Result<ScriptBuf> {
    Ok(ScriptBuilder::new()
        .push_slice(script::push_bytes(&sig.to_vec())?)
        .push_slice(script::push_bytes(&pubkey.serialize())?)
        .push_slice(script::push_bytes(redeem_script.as_bytes())?)
        .into_script())
}
