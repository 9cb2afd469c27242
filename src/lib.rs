//! # Voltage S7 - Typed Tags for S7 Data Blocks
//!
//! Treat variables inside an S7 controller's data blocks as ordinary typed
//! values, addressed by strings such as `DB12,X4.4` or `DB12,STRING60.10`.
//!
//! ## Features
//!
//! - **Address Parsing**: compact `DB<n>,<TYPE><offset>[.<suffix>]` syntax
//! - **Typed Codec**: bits, bytes, INT, DINT, DATE_AND_TIME and counted strings
//! - **Resilient I/O**: bounded retries with reconnect on a shared, locked client
//! - **Change Notification**: per-tag and per-connection listeners
//! - **Polling Engine**: non-overlapping periodic reads on a tokio timer
//!
//! The network transport is not part of this crate. Applications provide it
//! by implementing [`PlcClient`]; [`sim::MemoryPlc`] is an in-memory stand-in.
//!
//! ## Supported Types
//!
//! | Token | Type | Bytes | Value |
//! |-------|------|-------|-------|
//! | X | Bit | 1 | `Bool` |
//! | B | Byte | 1 | `Byte` |
//! | INT | ShortInt | 2 | `Int16` |
//! | DINT | LongInt | 4 | `Int32` |
//! | DT | Timestamp | 8 | `Timestamp` |
//! | STRING | String | max + 2 | `Text` |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use voltage_s7::{sim::MemoryPlc, PlcConnection, PollEngine, TaggedValue};
//!
//! let connection = Arc::new(PlcConnection::new("192.168.0.10", MemoryPlc::new().with_block(12, 80)));
//! connection.connect();
//!
//! let engine = PollEngine::new(connection);
//! let door = engine.add_address("door_open", "DB12,X4.4").unwrap();
//! let label = engine.add_address("label", "DB12,STRING60.10").unwrap();
//!
//! assert!(label.set_text("test-1234567890"));
//! engine.tick();
//!
//! assert!(!door.as_bool());
//! assert_eq!(label.value(), TaggedValue::Text("test-12345".into()));
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Error taxonomy for parsing, encoding and device I/O
pub mod error;

/// S7 area and word-length codes, string and timestamp limits
pub mod constants;

/// Controller result codes and their names
pub mod result;

/// Address string parsing into field descriptors
pub mod address;

/// Tag value type and conversions
pub mod value;

/// Encoding and decoding of data-block fields
pub mod codec;

// ============================================================================
// Runtime modules
// ============================================================================

/// Connection polling and retry settings
pub mod config;

/// PLC client capability and shared connection
pub mod client;

/// Named fields with cached values and change notification
pub mod tag;

/// Periodic polling of registered tags
pub mod poller;

/// In-memory simulated controller
pub mod sim;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime (users can use voltage_s7::tokio) ===
#[cfg(feature = "runtime")]
pub use tokio;

// === Core API ===
pub use client::{ItemChangedListener, PlcClient, PlcConnection};
pub use poller::{PollEngine, PollSummary, TickOutcome};
pub use tag::{ChangeListener, Tag};

#[cfg(feature = "runtime")]
pub use poller::PollHandle;

// === Error handling ===
pub use error::{DecodeError, EncodeError, ParseError, PlcError, PlcResult};

// === Core types ===
pub use address::{AddressDescriptor, LogicalType};
pub use constants::{Area, WordLen};
pub use value::TaggedValue;

// === Codec ===
pub use codec::{decode_value, encode_value, encode_value_into};

// === Configuration ===
pub use config::{ConnectionConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!("Voltage S7 v{} - Typed tags for S7 data blocks", VERSION)
}
