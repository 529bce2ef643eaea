//! Fee estimation by closed-form byte accounting.
//!
//! Legacy sigScript bytes carry full weight — there's no segwit discount
//! to let `bitcoin::Transaction::vsize()` compute this for free — so
//! rather than building a dummy tx with a placeholder witness and asking
//! `vsize()` for the answer, the byte count is accumulated directly as a
//! closed-form sum.

use crate::utxo::Utxo;

/// Previous-outpoint (32 + 4) and sequence (4) bytes, common to every
/// input regardless of signing mode.
const INPUT_FIXED_OVERHEAD: usize = 32 + 4 + 4;

/// A signed P2PKH sigScript: push(sig+sighash byte, <=73) + push(pubkey, 33).
const P2PKH_SIG_SCRIPT_SIZE: usize = 1 + 73 + 1 + 33;

/// value (8) + varint(pkScript len), the pkScript itself added by callers.
const OUTPUT_FIXED_OVERHEAD: usize = 8;

/// version (4) + locktime (4); vin/vout counts are varint-encoded on top.
const TX_FIXED_OVERHEAD: usize = 4 + 4;

/// A standard P2PKH or P2SH pkScript is 25 or 23 bytes; used when the
/// caller hasn't supplied the actual output script yet (size-estimation
/// call sites before the address is resolved).
pub const P2PKH_SCRIPT_LEN: usize = 25;
pub const P2SH_SCRIPT_LEN: usize = 23;

/// Satoshi-denominated fee rate, resolving the sat/1024B-vs-sat/B unit
/// ambiguity explicitly instead of leaving it implicit in a bare `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeRate {
    /// Satoshi per 1024 bytes — the Dogecoin-native convention.
    PerKb(u64),
    /// Satoshi per byte, converted to `PerKb` internally.
    PerByte(u64),
}

impl FeeRate {
    fn per_kb(self) -> u64 {
        match self {
            FeeRate::PerKb(r) => r,
            FeeRate::PerByte(r) => r.saturating_mul(1024),
        }
    }
}

/// Bitcoin-style compact size (varint) encoded length.
fn varint_len(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Estimate a commit tx's serialized size: `input_count` P2PKH inputs,
/// outputs with the given pkScript lengths (recipient P2SH, change
/// P2PKH/P2SH — whichever the caller is actually paying to).
pub fn estimate_commit_tx_size(input_count: usize, output_script_lens: &[usize]) -> usize {
    let inputs = input_count * (INPUT_FIXED_OVERHEAD + P2PKH_SIG_SCRIPT_SIZE);
    let outputs: usize = output_script_lens
        .iter()
        .map(|len| OUTPUT_FIXED_OVERHEAD + varint_len(*len as u64) + len)
        .sum();
    TX_FIXED_OVERHEAD
        + varint_len(input_count as u64)
        + varint_len(output_script_lens.len() as u64)
        + inputs
        + outputs
}

/// Estimate a reveal tx's serialized size. Input 0 spends the P2SH
/// inscription output, whose sigScript re-pushes `sig`, `pubkey`, and the
/// full `redeem_script`; `extra_p2pkh_inputs` are any further funding
/// inputs appended to cover the reveal fee; `has_change` controls whether
/// a second, change output is counted.
pub fn estimate_reveal_tx_size(
    redeem_script_len: usize,
    extra_p2pkh_inputs: usize,
    has_change: bool,
) -> usize {
    let reveal_sig_script_size =
        P2PKH_SIG_SCRIPT_SIZE + varint_len(redeem_script_len as u64) + redeem_script_len;
    let inputs = (INPUT_FIXED_OVERHEAD + reveal_sig_script_size)
        + extra_p2pkh_inputs * (INPUT_FIXED_OVERHEAD + P2PKH_SIG_SCRIPT_SIZE);

    let mut output_lens = vec![P2PKH_SCRIPT_LEN];
    if has_change {
        output_lens.push(P2PKH_SCRIPT_LEN);
    }
    let outputs: usize = output_lens
        .iter()
        .map(|len| OUTPUT_FIXED_OVERHEAD + varint_len(*len as u64) + len)
        .sum();

    TX_FIXED_OVERHEAD
        + varint_len(1 + extra_p2pkh_inputs as u64)
        + varint_len(output_lens.len() as u64)
        + inputs
        + outputs
}

/// `estimatedSize × feeRate / 1024`.
pub fn fee_for_size(size: usize, rate: FeeRate) -> u64 {
    (size as u64 * rate.per_kb()) / 1024
}

/// Sum of `amount_sat` across a UTXO slice.
pub fn sum_amounts(utxos: &[Utxo]) -> u64 {
    utxos.iter().map(|u| u.amount_sat).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_byte_converts_to_per_kb() {
        assert_eq!(FeeRate::PerByte(1).per_kb(), 1024);
        assert_eq!(FeeRate::PerKb(1024).per_kb(), 1024);
    }

    #[test]
    fn varint_len_matches_compact_size_boundaries() {
        assert_eq!(varint_len(0), 1);
        assert_eq!(varint_len(0xfc), 1);
        assert_eq!(varint_len(0xfd), 3);
        assert_eq!(varint_len(0xffff), 3);
        assert_eq!(varint_len(0x1_0000), 5);
    }

    #[test]
    fn commit_tx_size_grows_with_input_count() {
        let one = estimate_commit_tx_size(1, &[P2SH_SCRIPT_LEN, P2PKH_SCRIPT_LEN]);
        let two = estimate_commit_tx_size(2, &[P2SH_SCRIPT_LEN, P2PKH_SCRIPT_LEN]);
        assert!(two > one);
        assert_eq!(two - one, INPUT_FIXED_OVERHEAD + P2PKH_SIG_SCRIPT_SIZE);
    }

    #[test]
    fn reveal_tx_size_accounts_for_redeem_script_push() {
        let small = estimate_reveal_tx_size(100, 0, false);
        let large = estimate_reveal_tx_size(1000, 0, false);
        assert!(large > small);
    }

    #[test]
    fn reveal_tx_size_drops_change_output_when_absent() {
        let with_change = estimate_reveal_tx_size(100, 0, true);
        let without_change = estimate_reveal_tx_size(100, 0, false);
        assert_eq!(
            with_change - without_change,
            OUTPUT_FIXED_OVERHEAD + varint_len(P2PKH_SCRIPT_LEN as u64) + P2PKH_SCRIPT_LEN
        );
    }

    #[test]
    fn fee_for_size_matches_rate_per_kb() {
        // 2048 bytes at 1 sat/KB = 2 sat.
        assert_eq!(fee_for_size(2048, FeeRate::PerKb(1)), 2);
    }
}
