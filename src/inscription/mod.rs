//! Inscription envelope encoding/decoding.
//!
//! Two on-chain formats share one tokenizer but diverge in field
//! layout and DROP-guard tail: [`MetaId`] has six fixed-position fields,
//! [`Doginal`] carries a magic tag, a part index, a content-type and one
//! data chunk. Both produce a P2SH redeem script; [`parser`] inverts
//! either back into its structured fields by tokenizing once and
//! dispatching to a variant-specific tail matcher.

pub mod doginal;
pub mod metaid;
pub mod parser;

pub use doginal::Doginal;
pub use metaid::MetaId;
pub use parser::{extract_redeem_script, parse_envelope};

/// Which envelope layout a redeem script follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeFormat {
    MetaId,
    Doginal,
}

/// The structured fields recovered from a redeem script by
/// [`parser::parse_envelope`] — one variant per envelope format instead
/// of one struct with fields that are only meaningful for one format or
/// the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ParsedInscription {
    MetaId {
        operation: String,
        path: String,
        encryption: String,
        version: String,
        content_type: String,
        data: Vec<u8>,
    },
    Doginal {
        parts_count: u8,
        index: u8,
        content_type: String,
        data: Vec<u8>,
    },
}
