//! Deterministic, order-preserving UTXO selection.
//!
//! Walks `available` in caller order, adding one UTXO at a time and
//! re-estimating the fee after each addition, rather than sorting by
//! value (largest/smallest-first) the way a wallet optimizing for input
//! count typically would. This keeps selection reproducible given the
//! same input list with no hidden tie-breaking — the caller's own
//! ordering is the tie-break.

use crate::utils::fees::sum_amounts;
use crate::utxo::{DustPolicy, Utxo};
use crate::{Error, Result};

/// Selects a prefix (in `available`'s order) of UTXOs sufficient to cover
/// `required_output_total` plus a fee that itself depends on how many
/// inputs end up selected — `fee_estimator` is called with a candidate
/// input count and returns the fee that count would incur at the
/// caller's chosen rate, re-estimated every time a UTXO is added.
///
/// Returns the selected UTXOs and the leftover change amount. Change
/// below `dust.threshold_sat` is folded into the fee instead of creating
/// a sub-dust output, reported as `0` change.
pub fn select_utxos(
    available: &[Utxo],
    required_output_total: u64,
    fee_estimator: impl Fn(usize) -> u64,
    dust: &DustPolicy,
) -> Result<(Vec<Utxo>, u64)> {
    let mut selected: Vec<Utxo> = Vec::new();

    for utxo in available {
        selected.push(utxo.clone());
        let fee = fee_estimator(selected.len());
        let total_in = sum_amounts(&selected);
        let required = required_output_total.saturating_add(fee);
        if total_in < required {
            continue;
        }
        let change = total_in - required;
        if change < dust.threshold_sat {
            return Ok((selected, 0));
        }
        return Ok((selected, change));
    }

    let fee = fee_estimator(selected.len());
    Err(Error::InsufficientFunds {
        available: sum_amounts(&selected),
        required: required_output_total.saturating_add(fee),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::secp256k1::SecretKey;
    use bitcoin::{PrivateKey, ScriptBuf, Txid};

    use crate::utxo::SignMode;

    fn utxo(vout: u32, amount_sat: u64) -> Utxo {
        let sk = SecretKey::from_slice(&[vout as u8 + 1; 32]).unwrap();
        Utxo {
            txid: Txid::from_byte_array([vout as u8 + 1; 32]),
            vout,
            pk_script: ScriptBuf::new(),
            amount_sat,
            private_key: PrivateKey::new(sk, bitcoin::Network::Bitcoin),
            sign_mode: SignMode::Legacy,
        }
    }

    #[test]
    fn selects_minimal_prefix_covering_required_plus_fee() {
        let pool = vec![utxo(0, 1_000_000), utxo(1, 1_000_000), utxo(2, 50_000_000)];
        let (selected, change) =
            select_utxos(&pool, 500_000, |_n| 1_000, &DustPolicy::default()).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].vout, 0);
        // change = 1_000_000 - 500_000 - 1_000 = 499_000, below default dust
        assert_eq!(change, 0);
    }

    #[test]
    fn keeps_adding_inputs_until_the_total_covers_fee_and_output() {
        let pool = vec![utxo(0, 100_000), utxo(1, 100_000), utxo(2, 5_000_000)];
        let (selected, change) =
            select_utxos(&pool, 150_000, |n| n as u64 * 500, &DustPolicy::default()).unwrap();
        assert_eq!(selected.len(), 3);
        let total_in: u64 = selected.iter().map(|u| u.amount_sat).sum();
        assert_eq!(change, total_in - 150_000 - 1_500);
    }

    #[test]
    fn errors_when_the_whole_pool_is_insufficient() {
        let pool = vec![utxo(0, 1_000), utxo(1, 2_000)];
        let err = select_utxos(&pool, 1_000_000, |_n| 100, &DustPolicy::default()).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
    }

    #[test]
    fn selection_order_follows_caller_supplied_order_not_value() {
        let pool = vec![utxo(0, 5_000_000), utxo(1, 1_000_000)];
        let (selected, _) =
            select_utxos(&pool, 500_000, |_n| 1_000, &DustPolicy::default()).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].vout, 0);
    }
}
