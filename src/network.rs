//! Network parameters for Base58Check address derivation.
//!
//! `bitcoin::Address` ties its version bytes to the closed `bitcoin::Network`
//! enum, which has no Dogecoin variant, so the core takes these as an
//! explicit, caller-supplied struct instead of reading process-wide
//! configuration.

/// Base58Check version bytes for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Version byte for P2PKH addresses.
    pub p2pkh_version: u8,
    /// Version byte for P2SH addresses.
    pub p2sh_version: u8,
    /// Version byte for WIF-encoded private keys.
    pub wif_version: u8,
}

impl NetworkParams {
    /// Dogecoin mainnet.
    pub const DOGECOIN_MAINNET: NetworkParams = NetworkParams {
        p2pkh_version: 0x1e,
        p2sh_version: 0x16,
        wif_version: 0x9e,
    };

    /// Dogecoin testnet.
    pub const DOGECOIN_TESTNET: NetworkParams = NetworkParams {
        p2pkh_version: 0x71,
        p2sh_version: 0xc4,
        wif_version: 0xf1,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_matches_published_dogecoin_version_bytes() {
        assert_eq!(NetworkParams::DOGECOIN_MAINNET.p2pkh_version, 0x1e);
        assert_eq!(NetworkParams::DOGECOIN_MAINNET.p2sh_version, 0x16);
    }
}
