//! # Error Types
//!
//! Error taxonomy for address parsing, value encoding/decoding and device I/O.
//!
//! | Error | Raised by | Handling |
//! |-------|-----------|----------|
//! | [`ParseError`] | address parser | fatal to the tag being constructed |
//! | [`EncodeError`] | codec / conversion on write | caller error, never coerced |
//! | [`DecodeError`] | codec on read-back | fails the read, cached value kept |
//! | [`PlcError::Transport`] | PLC client result code | retried, then logged |

use thiserror::Error;

use crate::address::LogicalType;
use crate::result::result_text;

/// Address string could not be resolved into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input does not match `DB<n>,<TYPE><offset>[.<suffix>]`, or a required
    /// suffix is missing.
    #[error("Malformed address '{address}': {reason}")]
    MalformedAddress { address: String, reason: String },

    /// Type token is well-formed but not one of X, B, INT, DINT, DT, STRING.
    #[error("Unsupported data type '{token}' in address '{address}'")]
    UnsupportedType { address: String, token: String },
}

impl ParseError {
    pub(crate) fn malformed(address: &str, reason: impl Into<String>) -> Self {
        Self::MalformedAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(address: &str, token: &str) -> Self {
        Self::UnsupportedType {
            address: address.to_string(),
            token: token.to_string(),
        }
    }
}

/// A value could not be placed into a field's byte representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Type mismatch: {expected} field cannot hold a {actual} value")]
    TypeMismatch {
        expected: LogicalType,
        actual: &'static str,
    },

    #[error("Cannot convert {value} to {target}")]
    Conversion { value: String, target: LogicalType },

    #[error("Invalid bit position: {bit} (must be 0-7)")]
    BitOutOfRange { bit: u32 },

    #[error("Value out of range: {message}")]
    OutOfRange { message: String },

    #[error("Buffer too short: need {needed} bytes, got {actual}")]
    BufferTooShort { needed: usize, actual: usize },
}

/// A raw buffer could not be interpreted for a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Buffer too short: need {needed} bytes, got {actual}")]
    BufferTooShort { needed: usize, actual: usize },

    #[error("Invalid bit position: {bit} (must be 0-7)")]
    BitOutOfRange { bit: u32 },

    #[error("Invalid string length: {length} (must be 0-254)")]
    StringTooLong { length: u32 },
}

/// Umbrella error for tag and connection operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlcError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Non-zero result code reported by the PLC client.
    #[error("Transport error {code:#010X}: {text}")]
    Transport { code: i32, text: &'static str },

    #[error("Not connected")]
    NotConnected,
}

impl PlcError {
    /// Build a transport error, resolving the code to its name.
    pub fn transport(code: i32) -> Self {
        Self::Transport {
            code,
            text: result_text(code),
        }
    }

    /// Whether retrying the operation can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::NotConnected)
    }
}

/// Result alias used throughout the crate.
pub type PlcResult<T> = Result<T, PlcError>;
