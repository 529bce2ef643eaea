//! Transaction assembly: commit/reveal pair construction, UTXO funding,
//! chunk splitting and the top-level `build`/`parse`/`estimate_fee` entry
//! points.
//!
//! Two-stage shape: fund and sign a P2SH-paying commit tx, then spend it
//! with an inscription-carrying reveal tx whose sigScript re-exposes the
//! redeem script. Both legacy P2SH MetaID and Doginal envelopes go
//! through the same state machine; fee sizing comes from the closed-form
//! estimator in `utils::fees`.

use bitcoin::absolute::LockTime;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, OutPoint, PrivateKey, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};

use crate::inscription::{self, Doginal, EnvelopeFormat, MetaId, ParsedInscription};
use crate::network::NetworkParams;
use crate::selector::select_utxos;
use crate::signer::{self, LegacySigner, LocalSigner};
use crate::utils::address;
use crate::utils::constants::MAX_REDEEM_SCRIPT_SIZE;
use crate::utils::fees::{self, FeeRate};
use crate::utxo::{DustPolicy, SealedSecretBytes, Utxo};
use crate::{Error, Result};

/// The transactions produced by [`build`] plus whatever funding UTXOs
/// were left unspent, so a caller chaining several inscriptions can feed
/// `residual` straight back in as the next call's `inputs`, chaining
/// builds without re-scanning the whole wallet for unspent outputs.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Commit tx first, reveal tx(es) in chunk order after it.
    pub transactions: Vec<Transaction>,
    pub residual: Vec<Utxo>,
}

impl BuildResult {
    /// The first transaction in the build, broadcast before any reveal
    /// tx can be valid — the reveal-only-after-commit ordering this crate
    /// doesn't enforce at broadcast time, only at construction order.
    pub fn commit_only(&self) -> &Transaction {
        &self.transactions[0]
    }
}

/// One inscription chunk awaiting its own commit/reveal pair.
enum Chunk {
    MetaId(MetaId),
    Doginal(Doginal),
}

impl Chunk {
    fn build_redeem_script(&self, signer: &dyn LegacySigner) -> Result<ScriptBuf> {
        match self {
            Chunk::MetaId(m) => m.build_redeem_script(signer),
            Chunk::Doginal(d) => d.build_redeem_script(signer),
        }
    }
}

/// Builds a commit/reveal transaction pair for `payload`, funding it from
/// `inputs` and spending any change back to `change_address`. Doginal
/// payloads too large for one redeem script are split into a chain of
/// commit/reveal pairs; MetaID always produces exactly one pair.
///
/// `path` defaults to `content_type` when absent (MetaID's path field has
/// no independent meaning for a freshly built inscription beyond
/// labeling its content type).
#[cfg(feature = "rand")]
#[allow(clippy::too_many_arguments)]
pub fn build(
    network: &NetworkParams,
    payload: &[u8],
    content_type: &str,
    inputs: Vec<Utxo>,
    output_address: &str,
    output_value: u64,
    change_address: &str,
    fee_rate: FeeRate,
    envelope_format: EnvelopeFormat,
    path: Option<&str>,
    rng: &mut (impl rand::RngCore + rand::CryptoRng),
) -> Result<BuildResult> {
    let dust = DustPolicy::default();
    let resolved_path = match path {
        Some(p) => p,
        None => {
            log::debug!("no explicit MetaID path given, falling back to content_type");
            content_type
        }
    };

    let output_script = address::script_pubkey_for_address(output_address, network)?;
    let change_script = address::script_pubkey_for_address(change_address, network)?;

    let chunks = split_into_chunks(payload, content_type, resolved_path, envelope_format)?;
    let last = chunks.len() - 1;

    let mut transactions = Vec::with_capacity(chunks.len() * 2);
    let mut pool = inputs;

    for (i, chunk) in chunks.into_iter().enumerate() {
        let (ephemeral_signer, _sealed) = new_ephemeral_signer(rng);
        let redeem_script = chunk.build_redeem_script(&ephemeral_signer)?;
        let p2sh_script = address::p2sh_script(&redeem_script);

        // The P2SH commit output carries exactly the amount the reveal tx
        // pays out; it does NOT include headroom for the reveal tx's own
        // fee. The reveal tx's sigScript re-pushes the redeem script and
        // so is large enough that the commit output alone usually can't
        // cover both the payout and the fee — `build_reveal` (via
        // `select_extra_for_reveal`) pulls additional P2PKH inputs from
        // the pool to make up the difference.
        let is_last = i == last;
        let (recipient_script, recipient_value) = if is_last {
            (output_script.clone(), output_value)
        } else {
            // Carry-forward amount for an intermediate Doginal chunk:
            // returned to change_address rather than the caller's
            // recipient (only the final chunk pays them; see DESIGN.md's
            // "multi-chunk intermediate outputs" resolution).
            (change_script.clone(), dust.threshold_sat)
        };
        let commit_output_value = recipient_value;

        let (commit_tx, pool_after_commit) = build_commit(
            &pool,
            &p2sh_script,
            commit_output_value,
            &change_script,
            fee_rate,
            &dust,
        )?;
        pool = pool_after_commit;

        let (reveal_tx, pool_after_reveal) = build_reveal(
            &commit_tx,
            &redeem_script,
            &ephemeral_signer,
            &recipient_script,
            recipient_value,
            &change_script,
            pool,
            fee_rate,
            &dust,
        )?;
        pool = pool_after_reveal;

        transactions.push(commit_tx);
        transactions.push(reveal_tx);
    }

    Ok(BuildResult {
        transactions,
        residual: pool,
    })
}

fn split_into_chunks(
    payload: &[u8],
    content_type: &str,
    path: &str,
    format: EnvelopeFormat,
) -> Result<Vec<Chunk>> {
    match format {
        EnvelopeFormat::MetaId => Ok(vec![Chunk::MetaId(MetaId {
            operation: inscription::metaid::DEFAULT_OPERATION.to_string(),
            path: path.to_string(),
            encryption: inscription::metaid::DEFAULT_ENCRYPTION.to_string(),
            version: inscription::metaid::DEFAULT_VERSION.to_string(),
            content_type: content_type.to_string(),
            data: payload.to_vec(),
        })]),
        EnvelopeFormat::Doginal => split_doginal_chunks(payload, content_type),
    }
}

/// Splits `payload` into as many [`Doginal`] chunks as needed to keep
/// each one under [`Doginal::max_chunk_len`].
fn split_doginal_chunks(payload: &[u8], content_type: &str) -> Result<Vec<Chunk>> {
    let max_len = Doginal::max_chunk_len(content_type).max(1);
    let pieces: Vec<&[u8]> = if payload.is_empty() {
        vec![&payload[0..0]]
    } else {
        payload.chunks(max_len).collect()
    };
    let parts_count = u8::try_from(pieces.len()).map_err(|_| Error::ScriptTooLarge {
        actual: pieces.len(),
        limit: usize::from(u8::MAX),
    })?;

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            Chunk::Doginal(Doginal {
                part_index: i as u8,
                parts_count,
                content_type: content_type.to_string(),
                chunk: chunk.to_vec(),
            })
        })
        .collect())
}

/// Fresh secp256k1 keypair for one redeem script's embedded signature.
/// Never persisted; the raw scalar is wrapped in [`SealedSecretBytes`] so
/// it zeroizes when the caller drops it at the end of this chunk's build.
#[cfg(feature = "rand")]
fn new_ephemeral_signer(rng: &mut (impl rand::RngCore + rand::CryptoRng)) -> (LocalSigner, SealedSecretBytes) {
    let secret_key = SecretKey::new(rng);
    let sealed = SealedSecretBytes(secret_key.secret_bytes());
    let private_key = PrivateKey::new(secret_key, bitcoin::Network::Bitcoin);
    (LocalSigner::new(&private_key), sealed)
}

/// Builds and signs the commit tx: selects funding UTXOs from `pool`,
/// pays `p2sh_script` and, if any, a change output back to
/// `change_script`.
fn build_commit(
    pool: &[Utxo],
    p2sh_script: &ScriptBuf,
    commit_output_value: u64,
    change_script: &ScriptBuf,
    fee_rate: FeeRate,
    dust: &DustPolicy,
) -> Result<(Transaction, Vec<Utxo>)> {
    let p2sh_len = p2sh_script.len();
    let change_len = change_script.len();
    let estimator = |n: usize| {
        let size = fees::estimate_commit_tx_size(n, &[p2sh_len, change_len]);
        fees::fee_for_size(size, fee_rate)
    };
    let (selected, change) = select_utxos(pool, commit_output_value, estimator, dust)?;

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(commit_output_value),
        script_pubkey: p2sh_script.clone(),
    }];
    if change > 0 {
        outputs.push(TxOut {
            value: Amount::from_sat(change),
            script_pubkey: change_script.clone(),
        });
    }

    let mut tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: selected
            .iter()
            .map(|u| TxIn {
                previous_output: OutPoint::new(u.txid, u.vout),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output: outputs,
    };

    sign_p2pkh_inputs_from(&mut tx, 0, &selected)?;

    let mut remaining = remove_selected(pool, &selected);
    if change > 0 {
        remaining.push(Utxo {
            txid: tx.txid(),
            vout: (tx.output.len() - 1) as u32,
            pk_script: change_script.clone(),
            amount_sat: change,
            private_key: selected[0].private_key,
            sign_mode: selected[0].sign_mode,
        });
    }

    Ok((tx, remaining))
}

/// Builds and signs the reveal tx spending `commit_tx`'s P2SH output,
/// pulling in extra P2PKH inputs from `pool` if the commit output alone
/// can't cover `recipient_value` plus the reveal fee.
#[allow(clippy::too_many_arguments)]
fn build_reveal(
    commit_tx: &Transaction,
    redeem_script: &ScriptBuf,
    ephemeral_signer: &LocalSigner,
    recipient_script: &ScriptBuf,
    recipient_value: u64,
    change_script: &ScriptBuf,
    pool: Vec<Utxo>,
    fee_rate: FeeRate,
    dust: &DustPolicy,
) -> Result<(Transaction, Vec<Utxo>)> {
    let commit_value = commit_tx.output[0].value.to_sat();
    let (extra_selected, change) = select_extra_for_reveal(
        &pool,
        commit_value,
        recipient_value,
        redeem_script.len(),
        fee_rate,
        dust,
    )?;

    let mut input = vec![TxIn {
        previous_output: OutPoint::new(commit_tx.txid(), 0),
        script_sig: ScriptBuf::new(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
    }];
    input.extend(extra_selected.iter().map(|u| TxIn {
        previous_output: OutPoint::new(u.txid, u.vout),
        script_sig: ScriptBuf::new(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
    }));

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(recipient_value),
        script_pubkey: recipient_script.clone(),
    }];
    if change > 0 {
        outputs.push(TxOut {
            value: Amount::from_sat(change),
            script_pubkey: change_script.clone(),
        });
    }

    let mut tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input,
        output: outputs,
    };

    let digest = signer::sighash_legacy(&tx, 0, redeem_script)?;
    let sig = ephemeral_signer.sign_ecdsa(digest)?;
    tx.input[0].script_sig =
        signer::build_p2sh_sig_script(&sig, &ephemeral_signer.public_key(), redeem_script)?;

    sign_p2pkh_inputs_from(&mut tx, 1, &extra_selected)?;

    let mut remaining = remove_selected(&pool, &extra_selected);

    // An intermediate Doginal chunk's recipient output is itself a
    // carry-forward back to `change_address` (see `build()`'s
    // is_last/recipient_script selection), not a genuine external payout —
    // it must reappear in the pool so the next chunk's `build_commit` can
    // spend it, the same way the secondary change output below does.
    if recipient_script == change_script {
        let carry_key = extra_selected
            .first()
            .or_else(|| pool.first())
            .map(|u| u.private_key)
            .ok_or_else(|| {
                Error::BadPrivateKey(
                    "no funding input available to attribute the carry-forward output to"
                        .to_string(),
                )
            })?;
        let carry_sign_mode = extra_selected
            .first()
            .or_else(|| pool.first())
            .map(|u| u.sign_mode)
            .unwrap_or(crate::utxo::SignMode::Legacy);
        remaining.push(Utxo {
            txid: tx.txid(),
            vout: 0,
            pk_script: recipient_script.clone(),
            amount_sat: recipient_value,
            private_key: carry_key,
            sign_mode: carry_sign_mode,
        });
    }

    if change > 0 {
        let change_key = extra_selected
            .first()
            .or_else(|| pool.first())
            .map(|u| u.private_key)
            .ok_or_else(|| {
                Error::BadPrivateKey(
                    "no funding input available to attribute the reveal change output to"
                        .to_string(),
                )
            })?;
        remaining.push(Utxo {
            txid: tx.txid(),
            vout: (tx.output.len() - 1) as u32,
            pk_script: change_script.clone(),
            amount_sat: change,
            private_key: change_key,
            sign_mode: extra_selected
                .first()
                .or_else(|| pool.first())
                .map(|u| u.sign_mode)
                .unwrap_or(crate::utxo::SignMode::Legacy),
        });
    }

    Ok((tx, remaining))
}

/// Like [`select_utxos`], but the amount already on hand (`base_amount`,
/// the commit output's value) is folded in before any extra UTXO is
/// pulled from `pool` — the reveal tx's first input isn't itself a pool
/// entry, so the ordinary selector can't see it.
fn select_extra_for_reveal(
    pool: &[Utxo],
    base_amount: u64,
    recipient_value: u64,
    redeem_script_len: usize,
    fee_rate: FeeRate,
    dust: &DustPolicy,
) -> Result<(Vec<Utxo>, u64)> {
    let mut selected: Vec<Utxo> = Vec::new();

    let try_settle = |selected: &[Utxo]| -> Option<u64> {
        let extra_in: u64 = selected.iter().map(|u| u.amount_sat).sum();
        let total_in = base_amount + extra_in;
        let size = fees::estimate_reveal_tx_size(redeem_script_len, selected.len(), true);
        let fee = fees::fee_for_size(size, fee_rate);
        let required = recipient_value + fee;
        if total_in < required {
            return None;
        }
        Some(total_in - required)
    };

    if let Some(change) = try_settle(&selected) {
        if change < dust.threshold_sat {
            return Ok((selected, 0));
        }
        return Ok((selected, change));
    }

    for utxo in pool {
        selected.push(utxo.clone());
        if let Some(change) = try_settle(&selected) {
            if change < dust.threshold_sat {
                return Ok((selected, 0));
            }
            return Ok((selected, change));
        }
    }

    let extra_in: u64 = selected.iter().map(|u| u.amount_sat).sum();
    Err(Error::InsufficientFunds {
        available: base_amount + extra_in,
        required: recipient_value
            + fees::fee_for_size(
                fees::estimate_reveal_tx_size(redeem_script_len, selected.len(), true),
                fee_rate,
            ),
    })
}

/// Signs `tx.input[start..]` against `selected`'s P2PKH scripts in order,
/// using legacy SIGHASH_ALL throughout.
fn sign_p2pkh_inputs_from(tx: &mut Transaction, start: usize, selected: &[Utxo]) -> Result<()> {
    let secp = Secp256k1::new();
    for (offset, utxo) in selected.iter().enumerate() {
        let index = start + offset;
        let signer = LocalSigner::new(&utxo.private_key);
        let digest = signer::sighash_legacy(tx, index, &utxo.pk_script)?;
        let sig = signer.sign_ecdsa(digest)?;
        let pubkey: PublicKey = utxo.private_key.public_key(&secp).inner;
        tx.input[index].script_sig = signer::build_p2pkh_sig_script(&sig, &pubkey)?;
    }
    Ok(())
}

/// `pool` minus every outpoint present in `selected`, preserving `pool`'s
/// order.
fn remove_selected(pool: &[Utxo], selected: &[Utxo]) -> Vec<Utxo> {
    use std::collections::HashSet;
    let spent: HashSet<(Txid, u32)> = selected.iter().map(|u| (u.txid, u.vout)).collect();
    pool.iter()
        .filter(|u| !spent.contains(&(u.txid, u.vout)))
        .cloned()
        .collect()
}

/// Worst-case fee estimate for inscribing `payload_len` bytes of
/// `content_type` (optionally under MetaID `path`) at `fee_rate`, without
/// building or signing anything.
///
/// Always sizes against the MetaID envelope even when the caller intends
/// to build a Doginal inscription: MetaID's six fixed fields are a safe
/// upper bound on Doginal's single-chunk overhead, so this stays a
/// conservative estimate either way without needing an envelope-format
/// parameter.
pub fn estimate_fee(
    payload_len: usize,
    path: Option<&str>,
    content_type: &str,
    fee_rate: FeeRate,
) -> Result<u64> {
    let path_len = path.map_or(content_type.len(), str::len);
    let redeem_len = MetaId::estimate_redeem_script_len(
        inscription::metaid::DEFAULT_OPERATION.len(),
        path_len,
        inscription::metaid::DEFAULT_ENCRYPTION.len(),
        inscription::metaid::DEFAULT_VERSION.len(),
        content_type.len(),
        payload_len,
    );
    if redeem_len > MAX_REDEEM_SCRIPT_SIZE {
        return Err(Error::ScriptTooLarge {
            actual: redeem_len,
            limit: MAX_REDEEM_SCRIPT_SIZE,
        });
    }

    let commit_size = fees::estimate_commit_tx_size(
        1,
        &[fees::P2SH_SCRIPT_LEN, fees::P2PKH_SCRIPT_LEN],
    );
    let reveal_size = fees::estimate_reveal_tx_size(redeem_len, 0, true);
    Ok(fees::fee_for_size(commit_size + reveal_size, fee_rate))
}

/// Parses a raw reveal transaction's input 0 redeem script as `format`.
pub fn parse(raw_tx: &[u8], format: EnvelopeFormat) -> Result<ParsedInscription> {
    let tx: Transaction = bitcoin::consensus::deserialize(raw_tx)
        .map_err(|e| Error::MalformedTx(e.to_string()))?;
    let redeem_script = inscription::extract_redeem_script(&tx, 0)?;
    inscription::parse_envelope(&redeem_script, format)
}

/// `parse`, accepting a hex-encoded transaction.
pub fn parse_hex(raw_tx_hex: &str, format: EnvelopeFormat) -> Result<ParsedInscription> {
    let bytes = hex::decode(raw_tx_hex)?;
    parse(&bytes, format)
}
