//! Push-data encoding and a forward-only tokenizer.
//!
//! `bitcoin::script::Builder`/`PushBytesBuf` already implement exactly the
//! OP_PUSHDATA1/2 push-length selection this codec needs, and
//! `Script::instructions()` already implements the forward-only,
//! declared-length-respecting tokenizer. This module is the thin,
//! domain-named layer on top: small-int opcode encode/decode (which the
//! Doginal parts-count field needs and `bitcoin`'s `Builder` doesn't
//! expose directly), a simplified two-variant token type the envelope
//! matchers can pattern-match on, and the 10 KB script-size check.

use bitcoin::opcodes::all as opcodes;
use bitcoin::opcodes::{All as Opcode, OP_0};
use bitcoin::script::{Instruction, PushBytesBuf};
use bitcoin::Script;

use crate::utils::constants::MAX_REDEEM_SCRIPT_SIZE;
use crate::{Error, Result};

/// A single tokenized instruction: either a data push or a bare opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Data(Vec<u8>),
    Op(Opcode),
}

impl Token {
    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Token::Data(d) => Some(d),
            Token::Op(_) => None,
        }
    }

    pub fn is_op(&self, op: Opcode) -> bool {
        matches!(self, Token::Op(o) if *o == op)
    }
}

/// Wrap arbitrary bytes as a `PushBytesBuf`, surfacing `bitcoin`'s own
/// 520-byte-per-push ceiling as our `Error` type. Scripts built from these
/// pushes are further checked against the 10 KB whole-script ceiling by
/// `check_script_size` once assembled.
pub fn push_bytes(bytes: &[u8]) -> Result<PushBytesBuf> {
    let mut buf = PushBytesBuf::with_capacity(bytes.len());
    buf.extend_from_slice(bytes)?;
    Ok(buf)
}

/// Map `1..=16` to `OP_1..OP_16` (single byte `0x50 + n`); `0` to `OP_0`.
/// Values outside `0..=16` have no small-int opcode and must be pushed as
/// a literal byte instead.
pub fn encode_small_int(n: u8) -> Option<Opcode> {
    match n {
        0 => Some(OP_0),
        1..=16 => Some(Opcode::from(0x50 + n)),
        _ => None,
    }
}

/// Inverse of [`encode_small_int`].
pub fn decode_small_int(op: Opcode) -> Option<u8> {
    if op == OP_0 {
        return Some(0);
    }
    let byte = op.to_u8();
    if (0x51..=0x60).contains(&byte) {
        Some(byte - 0x50)
    } else {
        None
    }
}

/// Tokenize a script left-to-right, surfacing `bitcoin`'s own tokenizer
/// errors (truncated push length, etc.) as [`Error::Script`].
pub fn tokenize(script: &Script) -> Result<Vec<Token>> {
    script
        .instructions()
        .map(|instr| {
            Ok(match instr? {
                Instruction::PushBytes(p) => Token::Data(p.as_bytes().to_vec()),
                Instruction::Op(op) => Token::Op(op),
            })
        })
        .collect::<Result<Vec<_>>>()
}

/// Reject a redeem script over the per-chunk ceiling.
pub fn check_script_size(script: &Script) -> Result<()> {
    let actual = script.len();
    if actual > MAX_REDEEM_SCRIPT_SIZE {
        Err(Error::ScriptTooLarge {
            actual,
            limit: MAX_REDEEM_SCRIPT_SIZE,
        })
    } else {
        Ok(())
    }
}

/// OP_CHECKSIGVERIFY, used to close both envelope tails before their
/// respective DROP runs.
pub fn op_checksigverify() -> Opcode {
    opcodes::OP_CHECKSIGVERIFY
}

/// OP_DROP, repeated to build a tail.
pub fn op_drop() -> Opcode {
    opcodes::OP_DROP
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::script::Builder as ScriptBuilder;

    #[test]
    fn small_int_round_trips_for_1_through_16() {
        for n in 1..=16u8 {
            let op = encode_small_int(n).unwrap();
            assert_eq!(decode_small_int(op), Some(n));
        }
    }

    #[test]
    fn small_int_zero_is_op_0() {
        assert_eq!(encode_small_int(0), Some(OP_0));
        assert_eq!(decode_small_int(OP_0), Some(0));
    }

    #[test]
    fn small_int_out_of_range_is_none() {
        assert_eq!(encode_small_int(17), None);
    }

    #[test]
    fn tokenize_round_trips_data_and_ops() {
        let script = ScriptBuilder::new()
            .push_slice(b"ord")
            .push_opcode(OP_0)
            .push_opcode(opcodes::OP_DROP)
            .into_script();
        let tokens = tokenize(&script).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Data(b"ord".to_vec()),
                Token::Op(OP_0),
                Token::Op(opcodes::OP_DROP),
            ]
        );
    }

    #[test]
    fn check_script_size_rejects_oversized_script() {
        let script = bitcoin::ScriptBuf::from(vec![0u8; MAX_REDEEM_SCRIPT_SIZE + 1]);
        assert!(matches!(
            check_script_size(&script),
            Err(Error::ScriptTooLarge { .. })
        ));
    }

    #[test]
    fn check_script_size_accepts_exact_limit() {
        let script = bitcoin::ScriptBuf::from(vec![0u8; MAX_REDEEM_SCRIPT_SIZE]);
        assert!(check_script_size(&script).is_ok());
    }
}
