//! Doginal envelope: magic tag, part index, content-type and one data
//! chunk.

use bitcoin::opcodes::OP_0;
use bitcoin::script::Builder as ScriptBuilder;
use bitcoin::ScriptBuf;

use crate::signer::LegacySigner;
use crate::utils::address::double_sha256;
use crate::utils::constants::MAX_REDEEM_SCRIPT_SIZE;
use crate::utils::script;
use crate::{Error, Result};

/// Number of OP_DROPs closing the Doginal tail.
const TAIL_DROPS: usize = 5;

/// Magic tag prefixing every Doginal redeem script.
pub const MAGIC: &[u8] = b"ord";

/// One chunk of a (possibly multi-part) Doginal inscription.
///
/// `part_index` is 0-based; the redeem script embeds it as a 1-based
/// `OP_N`/literal-byte push (`part_index + 1`) — each chunk carries an
/// OP_N push where N equals its 1-based index. The format also carries
/// what looks like a "parts count" at this same script slot; the two
/// only coincide for single-chunk payloads (N=1 either way). A lone
/// redeem script carries no separate out-of-band total, so
/// `parser::match_doginal_tail` reports `parts_count` as the same
/// decoded value as `index + 1` — see that function's doc comment for
/// the full resolution, recorded in DESIGN.md. `parts_count` here is
/// kept purely for the assembler's own chunk-chain bookkeeping and is
/// not itself written into the script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doginal {
    pub part_index: u8,
    pub parts_count: u8,
    pub content_type: String,
    pub chunk: Vec<u8>,
}

impl Doginal {
    fn field_prefix(&self) -> Result<ScriptBuf> {
        let one_based = self.part_index.checked_add(1).ok_or_else(|| {
            Error::EnvelopeMismatch("part_index 255 has no representable 1-based OP_N".to_string())
        })?;

        let mut builder = ScriptBuilder::new().push_slice(script::push_bytes(MAGIC)?);
        builder = match script::encode_small_int(one_based) {
            Some(op) => builder.push_opcode(op),
            None => builder.push_slice(script::push_bytes(&[one_based])?),
        };
        builder = builder
            .push_slice(script::push_bytes(self.content_type.as_bytes())?)
            .push_opcode(OP_0)
            .push_slice(script::push_bytes(&self.chunk)?);
        Ok(builder.into_script())
    }

    /// Builds the full redeem script for this chunk: the field prefix,
    /// then `push(sig||0x01) push(tempPubkey) OP_CHECKSIGVERIFY` and five
    /// `OP_DROP`s terminated by `OP_1`. Signed the same
    /// way as [`crate::inscription::MetaId::build_redeem_script`] — see
    /// that doc comment for why the embedded signature covers the field
    /// prefix rather than a transaction sighash.
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

    /// A conservative (generously rounded down) upper bound on chunk
    /// payload bytes that still fit a single redeem script under the
    /// 10,000-byte ceiling, given a content-type string — used by the
    /// assembler to size Doginal chunk splits. Actual construction
    /// still re-checks via `utils::script::check_script_size`.
    pub fn max_chunk_len(content_type: &str) -> usize {
        // "ord"(4) + part-index(<=3) + content-type prefix(<=3) + OP_0(1)
        // + data push prefix(<=3) + sig(<=75) + pubkey(34) +
        // OP_CHECKSIGVERIFY(1) + 5xOP_DROP(5) + OP_1(1), plus slack.
        let overhead = 4 + 3 + 3 + content_type.len() + 1 + 3 + 75 + 34 + 1 + TAIL_DROPS + 1 + 16;
        MAX_REDEEM_SCRIPT_SIZE.saturating_sub(overhead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::SecretKey;

    use crate::inscription::{parser, ParsedInscription};
    use crate::signer::LocalSigner;
    use crate::utils::script::tokenize;

    fn signer() -> LocalSigner {
        let sk = SecretKey::from_slice(&[13u8; 32]).unwrap();
        let private_key = bitcoin::PrivateKey::new(sk, bitcoin::Network::Bitcoin);
        LocalSigner::new(&private_key)
    }

    #[test]
    fn single_chunk_round_trips_through_parser() {
        let doginal = Doginal {
            part_index: 0,
            parts_count: 1,
            content_type: "text/plain".into(),
            chunk: b"Hello, Dogecoin Inscription!".to_vec(),
        };
        let signer = signer();
        let script = doginal.build_redeem_script(&signer).unwrap();
        let tokens = tokenize(&script).unwrap();

        match parser::match_doginal_tail(&tokens).unwrap() {
            ParsedInscription::Doginal {
                parts_count,
                index,
                content_type,
                data,
            } => {
                assert_eq!(parts_count, 1);
                assert_eq!(index, 0);
                assert_eq!(content_type, "text/plain");
                assert_eq!(data, b"Hello, Dogecoin Inscription!");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn multi_chunk_part_index_becomes_one_based_op_n() {
        for part_index in 0u8..16 {
            let doginal = Doginal {
                part_index,
                parts_count: 16,
                content_type: "text/plain".into(),
                chunk: b"x".to_vec(),
            };
            let script = doginal.build_redeem_script(&signer()).unwrap();
            let tokens = tokenize(&script).unwrap();
            match parser::match_doginal_tail(&tokens).unwrap() {
                ParsedInscription::Doginal { index, .. } => assert_eq!(index, part_index),
                other => panic!("unexpected variant: {other:?}"),
            }
        }
    }

    #[test]
    fn part_index_beyond_16_uses_literal_byte_push() {
        let doginal = Doginal {
            part_index: 19, // one_based = 20, outside the 1..=16 small-int range
            parts_count: 30,
            content_type: "text/plain".into(),
            chunk: b"y".to_vec(),
        };
        let script = doginal.build_redeem_script(&signer()).unwrap();
        let tokens = tokenize(&script).unwrap();
        assert_eq!(tokens[1].as_data(), Some(&[20u8][..]));
    }

    #[test]
    fn max_chunk_len_keeps_built_script_under_the_ceiling() {
        let content_type = "application/octet-stream";
        let len = Doginal::max_chunk_len(content_type);
        let doginal = Doginal {
            part_index: 0,
            parts_count: 1,
            content_type: content_type.into(),
            chunk: vec![0u8; len],
        };
        let script = doginal.build_redeem_script(&signer()).unwrap();
        assert!(script.len() <= MAX_REDEEM_SCRIPT_SIZE);
    }
}
