//! # doginal-rs
//!
//! Builds and parses Dogecoin-style MetaID and Doginal inscription
//! transactions: legacy (pre-SegWit) P2SH commit/reveal pairs carrying a
//! self-contained redeem-script envelope, deterministic UTXO selection,
//! and closed-form fee estimation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use doginal_rs::{build, EnvelopeFormat, FeeRate, NetworkParams, Utxo};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let inputs: Vec<Utxo> = vec![];
//! let mut rng = rand::thread_rng();
//! let result = build(
//!     &NetworkParams::DOGECOIN_MAINNET,
//!     b"Hello, Dogecoin Inscription!",
//!     "text/plain",
//!     inputs,
//!     "D8fQ4dGhBPAvgxKqtPpAo1gwyZmFbbLY3o",
//!     100_000,
//!     "D8fQ4dGhBPAvgxKqtPpAo1gwyZmFbbLY3o",
//!     FeeRate::PerKb(600_000),
//!     EnvelopeFormat::Doginal,
//!     None,
//!     &mut rng,
//! )?;
//! let _commit = result.commit_only();
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

mod error;
mod result;

pub mod builder;
pub mod inscription;
pub mod network;
pub mod selector;
pub mod signer;
pub mod utils;
pub mod utxo;

pub use bitcoin;

#[cfg(feature = "rand")]
pub use builder::build;
pub use builder::{estimate_fee, parse, parse_hex, BuildResult};
pub use error::Error;
pub use inscription::{Doginal, EnvelopeFormat, MetaId, ParsedInscription};
pub use network::NetworkParams;
pub use result::Result;
pub use signer::{LegacySigner, LocalSigner};
pub use utils::fees::FeeRate;
pub use utxo::{DustPolicy, SignMode, Utxo};
