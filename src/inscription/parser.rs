//! Single-tokenizer, variant-dispatched envelope parser.
//!
//! Runs `utils::script::tokenize` once and dispatches to
//! [`match_metaid_tail`]/[`match_doginal_tail`] by position: tokenize
//! once, then build a typed payload from the resulting token stream
//! rather than re-scanning the script per field.

use bitcoin::opcodes::OP_0;
use bitcoin::{ScriptBuf, Transaction};

use crate::inscription::{doginal, EnvelopeFormat, ParsedInscription};
use crate::utils::script::{self, Token};
use crate::{Error, Result};

/// Tokenizes `redeem_script` once and dispatches to the format-specific
/// tail matcher.
pub fn parse_envelope(redeem_script: &bitcoin::Script, format: EnvelopeFormat) -> Result<ParsedInscription> {
    let tokens = script::tokenize(redeem_script)?;
    match format {
        EnvelopeFormat::MetaId => match_metaid_tail(&tokens),
        EnvelopeFormat::Doginal => match_doginal_tail(&tokens),
    }
}

fn data_at(tokens: &[Token], i: usize) -> Result<Vec<u8>> {
    tokens
        .get(i)
        .and_then(Token::as_data)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| Error::EnvelopeMismatch(format!("expected a data push at position {i}")))
}

fn utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| Error::EnvelopeMismatch(format!("field is not valid utf-8: {e}")))
}

/// `push(operation) push(path) push(encryption) push(version)
/// push(contentType) push(data) push(sig) push(pubkey)
/// OP_CHECKSIGVERIFY (OP_DROP x7) OP_1` — 17 tokens total. Field mapping
/// is purely positional.
pub(crate) fn match_metaid_tail(tokens: &[Token]) -> Result<ParsedInscription> {
    const FIELD_COUNT: usize = 6;
    const TAIL_DROPS: usize = 7;
    let expected_len = FIELD_COUNT + 2 + tail_len(TAIL_DROPS);
    if tokens.len() != expected_len {
        return Err(Error::EnvelopeMismatch(format!(
            "expected {expected_len} tokens for a MetaID envelope, got {}",
            tokens.len()
        )));
    }

    let operation = utf8(data_at(tokens, 0)?)?;
    let path = utf8(data_at(tokens, 1)?)?;
    let encryption = utf8(data_at(tokens, 2)?)?;
    let version = utf8(data_at(tokens, 3)?)?;
    let content_type = utf8(data_at(tokens, 4)?)?;
    let data = data_at(tokens, 5)?;
    // tokens[6] = signature, tokens[7] = temp pubkey: present in the
    // envelope but not part of the caller-facing parsed fields.
    check_tail(&tokens[FIELD_COUNT + 2..], TAIL_DROPS)?;

    Ok(ParsedInscription::MetaId {
        operation,
        path,
        encryption,
        version,
        content_type,
        data,
    })
}

/// `push("ord") <small-int opcode or literal byte> push(contentType)
/// OP_0 push(data) push(sig) push(pubkey) OP_CHECKSIGVERIFY (OP_DROP x5)
/// OP_1`.
///
/// The script carries exactly one `OP_N`/literal-byte slot, which this
/// codec treats as the chunk's 1-based `part_index`, not a separate
/// total-chunk count — the two only coincide for single-chunk payloads.
/// A lone redeem script carries no out-of-band total to report, so
/// `parts_count` here is simply the decoded value itself (`index + 1`);
/// a caller chaining multiple reveal transactions already knows the true
/// total from having built the chain. See DESIGN.md for the full
/// rationale.
pub(crate) fn match_doginal_tail(tokens: &[Token]) -> Result<ParsedInscription> {
    const TAIL_DROPS: usize = 5;
    const PREFIX_LEN: usize = 5; // ord, N, content-type, OP_0, data
    let expected_len = PREFIX_LEN + 2 + tail_len(TAIL_DROPS);
    if tokens.len() != expected_len {
        return Err(Error::EnvelopeMismatch(format!(
            "expected {expected_len} tokens for a Doginal envelope, got {}",
            tokens.len()
        )));
    }

    let magic = data_at(tokens, 0)?;
    if magic != doginal::MAGIC {
        return Err(Error::EnvelopeMismatch(
            "missing \"ord\" magic tag".to_string(),
        ));
    }

    let part_number = match &tokens[1] {
        Token::Op(op) => script::decode_small_int(*op).ok_or_else(|| {
            Error::EnvelopeMismatch("parts-count token is not a small-int opcode".to_string())
        })?,
        Token::Data(bytes) if bytes.len() == 1 => bytes[0],
        _ => {
            return Err(Error::EnvelopeMismatch(
                "parts-count token is neither a small-int opcode nor a single byte".to_string(),
            ))
        }
    };
    if part_number == 0 {
        return Err(Error::EnvelopeMismatch(
            "parts-count/index token must be >= 1".to_string(),
        ));
    }

    let content_type = utf8(data_at(tokens, 2)?)?;
    if !tokens[3].is_op(OP_0) {
        return Err(Error::EnvelopeMismatch(
            "expected OP_0 separator after content-type".to_string(),
        ));
    }
    let data = data_at(tokens, 4)?;
    check_tail(&tokens[PREFIX_LEN + 2..], TAIL_DROPS)?;

    Ok(ParsedInscription::Doginal {
        parts_count: part_number,
        index: part_number - 1,
        content_type,
        data,
    })
}

fn tail_len(drops: usize) -> usize {
    1 + drops + 1 // OP_CHECKSIGVERIFY, drops, OP_1
}

/// `OP_CHECKSIGVERIFY` then `drops` `OP_DROP`s then `OP_1`, common to
/// both envelope tails.
fn check_tail(tail: &[Token], drops: usize) -> Result<()> {
    if tail.len() != tail_len(drops) {
        return Err(Error::EnvelopeMismatch(format!(
            "expected a {drops}-drop tail, got {} tokens",
            tail.len()
        )));
    }
    if !tail[0].is_op(script::op_checksigverify()) {
        return Err(Error::EnvelopeMismatch(
            "expected OP_CHECKSIGVERIFY".to_string(),
        ));
    }
    for op in &tail[1..=drops] {
        if !op.is_op(script::op_drop()) {
            return Err(Error::EnvelopeMismatch("expected OP_DROP".to_string()));
        }
    }
    let terminal = match &tail[drops + 1] {
        Token::Op(op) => script::decode_small_int(*op),
        Token::Data(_) => None,
    };
    if terminal != Some(1) {
        return Err(Error::EnvelopeMismatch("expected terminal OP_1".to_string()));
    }
    Ok(())
}

/// Tokenizes `tx`'s input `input_index` sigScript, discards the leading
/// signature and pubkey pushes, and reparses the last remaining push
/// (the already-serialized redeem script) as a [`ScriptBuf`].
pub fn extract_redeem_script(tx: &Transaction, input_index: usize) -> Result<ScriptBuf> {
    let input = tx
        .input
        .get(input_index)
        .ok_or_else(|| Error::MalformedTx(format!("transaction has no input {input_index}")))?;
    let tokens = script::tokenize(&input.script_sig)?;
    let redeem_bytes = tokens
        .last()
        .and_then(Token::as_data)
        .ok_or_else(|| {
            Error::EnvelopeMismatch("sigScript has no redeem-script push".to_string())
        })?;
    Ok(ScriptBuf::from(redeem_bytes.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::SecretKey;

    use crate::inscription::{Doginal, MetaId};
    use crate::signer::LocalSigner;

    fn signer() -> LocalSigner {
        let sk = SecretKey::from_slice(&[17u8; 32]).unwrap();
        let private_key = bitcoin::PrivateKey::new(sk, bitcoin::Network::Bitcoin);
        LocalSigner::new(&private_key)
    }

    #[test]
    fn metaid_tail_rejects_wrong_token_count() {
        assert!(match_metaid_tail(&[]).is_err());
    }

    #[test]
    fn doginal_tail_rejects_missing_magic() {
        let script = bitcoin::script::Builder::new()
            .push_slice(b"bad")
            .into_script();
        let tokens = script::tokenize(&script).unwrap();
        assert!(match_doginal_tail(&tokens).is_err());
    }

    #[test]
    fn extract_redeem_script_recovers_the_build_time_script() {
        let meta = MetaId {
            operation: "create".into(),
            path: "/info/bio".into(),
            encryption: "0".into(),
            version: "1.0.0".into(),
            content_type: "text/plain".into(),
            data: b"doge".to_vec(),
        };
        let signer = signer();
        let redeem_script = meta.build_redeem_script(&signer).unwrap();

        let outer_sig = signer.sign_ecdsa([7u8; 32]).unwrap();
        let sig_script = crate::signer::build_p2sh_sig_script(
            &outer_sig,
            &signer.public_key(),
            &redeem_script,
        )
        .unwrap();

        let tx = dummy_tx_with_sigscript(sig_script);
        let extracted = extract_redeem_script(&tx, 0).unwrap();
        assert_eq!(extracted, redeem_script);

        let parsed = parse_envelope(&extracted, EnvelopeFormat::MetaId).unwrap();
        assert_eq!(
            parsed,
            ParsedInscription::MetaId {
                operation: "create".into(),
                path: "/info/bio".into(),
                encryption: "0".into(),
                version: "1.0.0".into(),
                content_type: "text/plain".into(),
                data: b"doge".to_vec(),
            }
        );
    }

    #[test]
    fn doginal_chunk_round_trips_via_extract_and_parse() {
        let doginal = Doginal {
            part_index: 0,
            parts_count: 1,
            content_type: "text/plain".into(),
            chunk: b"Hello, Dogecoin Inscription!".to_vec(),
        };
        let signer = signer();
        let redeem_script = doginal.build_redeem_script(&signer).unwrap();
        let outer_sig = signer.sign_ecdsa([9u8; 32]).unwrap();
        let sig_script = crate::signer::build_p2sh_sig_script(
            &outer_sig,
            &signer.public_key(),
            &redeem_script,
        )
        .unwrap();

        let tx = dummy_tx_with_sigscript(sig_script);
        let extracted = extract_redeem_script(&tx, 0).unwrap();
        let parsed = parse_envelope(&extracted, EnvelopeFormat::Doginal).unwrap();
        assert_eq!(
            parsed,
            ParsedInscription::Doginal {
                parts_count: 1,
                index: 0,
                content_type: "text/plain".into(),
                data: b"Hello, Dogecoin Inscription!".to_vec(),
            }
        );
    }

    fn dummy_tx_with_sigscript(sig_script: ScriptBuf) -> Transaction {
        use bitcoin::absolute::LockTime;
        use bitcoin::transaction::Version;
        use bitcoin::{Amount, OutPoint, Sequence, TxIn, TxOut, Witness};

        Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: sig_script,
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(1_000),
                script_pubkey: ScriptBuf::new(),
            }],
        }
    }
}
