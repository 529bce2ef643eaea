use thiserror::Error;

/// Error taxonomy for the inscription builder and parser.
///
/// Every fatal condition the core can hit surfaces as one of these
/// variants; nothing is retried internally (see the crate's top-level
/// docs for the retry/broadcast policy, which belongs to the caller).
#[derive(Error, Debug)]
pub enum Error {
    #[error("redeem script would exceed the {limit}-byte limit ({actual} bytes)")]
    ScriptTooLarge { actual: usize, limit: usize },
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: u64, required: u64 },
    #[error("bad address: {0}")]
    BadAddress(String),
    #[error("bad private key: {0}")]
    BadPrivateKey(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("envelope mismatch: {0}")]
    EnvelopeMismatch(String),
    #[error("malformed transaction: {0}")]
    MalformedTx(String),
    #[error("script error: {0}")]
    Script(#[from] bitcoin::script::Error),
    #[error("push-bytes error: {0}")]
    PushBytes(#[from] bitcoin::script::PushBytesError),
    #[error("sighash error: {0}")]
    Sighash(#[from] bitcoin::sighash::Error),
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}
