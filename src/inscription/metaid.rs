//! MetaID envelope: six fixed-position fields, signed over their own
//! push prefix.
//!
//! The MetaID layout is positional pushes terminated by a DROP-guard —
//! see `parser::match_metaid_tail` for the inverse.

use bitcoin::script::Builder as ScriptBuilder;
use bitcoin::ScriptBuf;

use crate::signer::LegacySigner;
use crate::utils::address::double_sha256;
use crate::utils::constants::{COMPRESSED_PUBKEY_SIZE, ECDSA_SIG_MAX_SIZE};
use crate::utils::script;
use crate::Result;

/// Default value for the `operation` field: the crate only ever builds
/// create-style inscriptions (no update/transfer operation is exposed at
/// the `build()` boundary).
pub const DEFAULT_OPERATION: &str = "create";
/// Default value for the `encryption` field: payloads are opaque bytes
/// and never encrypted by this crate.
pub const DEFAULT_ENCRYPTION: &str = "0";
/// Default value for the `version` field: this crate's MetaID schema
/// version, as opposed to a pre-existing fixture's version being parsed
/// rather than built.
pub const DEFAULT_VERSION: &str = "5.0.1";

/// Number of OP_DROPs closing the MetaID tail: the six field pushes plus
/// the temp pubkey push, once OP_CHECKSIGVERIFY has consumed signature
/// and pubkey.
const TAIL_DROPS: usize = 7;

/// The six positional MetaID fields. An empty field is pushed as OP_0 —
/// `bitcoin::script::Builder::push_slice` on an empty `PushBytesBuf`
/// already emits OP_0, so no special-casing is needed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaId {
    pub operation: String,
    pub path: String,
    pub encryption: String,
    pub version: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl MetaId {
    /// The six field pushes, in positional order, with no signature or
    /// tail yet. Hashed to produce the digest the ephemeral key signs —
    /// see [`Self::build_redeem_script`]'s doc comment for why the
    /// envelope signs its own content rather than a transaction sighash.
    fn field_prefix(&self) -> Result<ScriptBuf> {
        let mut builder = ScriptBuilder::new();
        for field in [
            self.operation.as_bytes(),
            self.path.as_bytes(),
            self.encryption.as_bytes(),
            self.version.as_bytes(),
            self.content_type.as_bytes(),
            self.data.as_slice(),
        ] {
            builder = builder.push_slice(script::push_bytes(field)?);
        }
        Ok(builder.into_script())
    }

    /// Builds the full redeem script: the six field pushes, then
    /// `push(sig||0x01) push(tempPubkey) OP_CHECKSIGVERIFY` and seven
    /// `OP_DROP`s terminated by `OP_1`.
    ///
    /// The signature is produced over the double-SHA256 of the
    /// field-push prefix itself, not a transaction sighash: at this
    /// point neither the commit nor the reveal transaction exists yet,
    /// so signing against a not-yet-built reveal tx's digest would make
    /// the commit tx's own P2SH address depend on a transaction that in
    /// turn references that same address — a real circularity. Signing
    /// the envelope's own content instead breaks that cycle while
    /// preserving the exact byte layout the format specifies. This
    /// redeem script is a self-contained opaque blob, never re-verified
    /// against a transaction sighash — consensus spendability isn't a
    /// property this crate claims or tests (see DESIGN.md); bit-exact
    /// round-tripping through `parser::parse_envelope` is.
    /// `signer::sighash_legacy` is reserved for what it unambiguously
    /// signs elsewhere: real P2PKH funding inputs and the reveal tx's
    /// outer P2SH-spending signature, both of which have a real
    /// transaction to sign against.
    pub fn build_redeem_script(&self, signer: &dyn LegacySigner) -> Result<ScriptBuf> {
        let prefix = self.field_prefix()?;
        let digest = double_sha256(prefix.as_bytes());
        let sig = signer.sign_ecdsa(digest)?;
        let pubkey = signer.public_key();

        let mut builder = ScriptBuilder::new()
            .push_slice(script::push_bytes(&sig.to_vec())?)
            .push_slice(script::push_bytes(&pubkey.serialize())?)
            .push_opcode(script::op_checksigverify());
        for _ in 0..TAIL_DROPS {
            builder = builder.push_opcode(script::op_drop());
        }
        builder = builder.push_opcode(script::encode_small_int(1).expect("1 is a valid small int"));

        let mut bytes = prefix.into_bytes();
        bytes.extend_from_slice(builder.into_script().as_bytes());
        let redeem_script = ScriptBuf::from(bytes);
        script::check_script_size(&redeem_script)?;
        Ok(redeem_script)
    }

    /// The redeem script length a `MetaId` with these field lengths
    /// would produce, without actually building or signing one — used
    /// by `estimate_fee`, which has no signer/rng to produce a real
    /// signature. Assumes the maximal 73-byte ECDSA
    /// signature and a 33-byte compressed pubkey, matching
    /// `utils::fees`'s own worst-case sizing.
    pub fn estimate_redeem_script_len(
        operation_len: usize,
        path_len: usize,
        encryption_len: usize,
        version_len: usize,
        content_type_len: usize,
        data_len: usize,
    ) -> usize {
        push_len(operation_len)
            + push_len(path_len)
            + push_len(encryption_len)
            + push_len(version_len)
            + push_len(content_type_len)
            + push_len(data_len)
            + push_len(ECDSA_SIG_MAX_SIZE)
            + push_len(COMPRESSED_PUBKEY_SIZE)
            + 1 // OP_CHECKSIGVERIFY
            + TAIL_DROPS
            + 1 // OP_1
    }
}

/// Serialized size of a single push of `n` bytes, mirroring the
/// OP_PUSHDATA1/2 selection rule in `utils::script`.
fn push_len(n: usize) -> usize {
    match n {
        0 => 1,
        1..=75 => 1 + n,
        76..=255 => 2 + n,
        256..=65535 => 3 + n,
        _ => 5 + n,
    }
}
