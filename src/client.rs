//! PLC client capability and shared connection
//!
//! The transport that actually talks to the controller is supplied by the
//! application through the [`PlcClient`] trait. A [`PlcConnection`] owns one
//! client behind a single mutex so every tag bound to it performs device I/O
//! one call at a time.
//!
//! # Architecture
//!
//! ```text
//! PollEngine ──┐
//!              ├── Tag ── Arc<PlcConnection<C>> ── Mutex<C: PlcClient>
//! app threads ─┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use voltage_s7::{sim::MemoryPlc, PlcConnection, Tag};
//!
//! let plc = MemoryPlc::new().with_block(12, 64);
//! let connection = Arc::new(PlcConnection::new("192.168.0.10", plc));
//! connection.connect();
//!
//! let tag = Tag::new(connection.clone(), "speed", "DB12,INT2").unwrap();
//! assert!(tag.set_integer(1500));
//! assert!(tag.read_from_device());
//! assert_eq!(tag.as_integer(), 1500);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::constants::{Area, WordLen};
use crate::result;
use crate::tag::Tag;

/// Synchronous controller client.
///
/// All methods returning `i32` report a controller result code where 0
/// means success (see [`crate::result`]).
///
/// # Implemented By
///
/// - [`crate::sim::MemoryPlc`] - in-memory data blocks for tests and demos
/// - Application transports wrapping a real S7 stack
pub trait PlcClient: Send {
    /// Open the session. Failure surfaces through [`is_connected`](Self::is_connected).
    fn connect(&mut self);

    /// Close the session.
    fn disconnect(&mut self);

    /// Whether the session is currently usable.
    fn is_connected(&self) -> bool;

    /// Read `size` bytes at `start` of data block `block` into `buffer`.
    fn read_block(&mut self, block: u32, start: u32, size: u32, buffer: &mut [u8]) -> i32;

    /// Write `size` bytes from `buffer` at `start` of data block `block`.
    fn write_block(&mut self, block: u32, start: u32, size: u32, buffer: &[u8]) -> i32;

    /// Generic area write with an explicit transport word length.
    ///
    /// Tags only use this for bit fields: `start` is the absolute bit number
    /// (`byte_offset * 8 + bit_offset`), `amount` is 1, `word_len` is
    /// [`WordLen::Bit`] and `buffer` holds one byte, 0 or 1. Only that bit
    /// changes on the device.
    fn write_area(
        &mut self,
        area: Area,
        block: u32,
        start: u32,
        amount: u32,
        word_len: WordLen,
        buffer: &[u8],
    ) -> i32;

    /// Name of a result code, for diagnostics.
    fn result_text(&self, code: i32) -> &'static str {
        result::result_text(code)
    }
}

/// Listener invoked when any tag of a connection changes value.
pub type ItemChangedListener<C> = Arc<dyn Fn(&Tag<C>) + Send + Sync>;

/// Shared handle to one controller.
///
/// Owns the client behind the connection lock and fans out item-changed
/// notifications for every tag bound to it.
pub struct PlcConnection<C: PlcClient> {
    address: String,
    config: ConnectionConfig,
    client: Mutex<C>,
    listeners: Mutex<Vec<ItemChangedListener<C>>>,
}

impl<C: PlcClient> PlcConnection<C> {
    /// Create a connection with the default configuration.
    pub fn new(address: impl Into<String>, client: C) -> Self {
        Self::with_config(address, client, ConnectionConfig::default())
    }

    /// Create a connection with an explicit configuration.
    pub fn with_config(address: impl Into<String>, client: C, config: ConnectionConfig) -> Self {
        Self {
            address: address.into(),
            config,
            client: Mutex::new(client),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Controller address, as given.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Connect the client. Returns whether the client reports connected.
    pub fn connect(&self) -> bool {
        info!(address = %self.address, "connect to");
        let mut client = self.lock_client();
        client.connect();
        client.is_connected()
    }

    pub fn disconnect(&self) {
        info!(address = %self.address, "disconnect from");
        self.lock_client().disconnect();
    }

    /// Disconnect and drop all item-changed listeners.
    pub fn close(&self) {
        self.disconnect();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!(address = %self.address, "connection closed");
    }

    /// Query the client's connection state.
    ///
    /// Takes the connection lock; do not call from a change listener.
    pub fn is_connected(&self) -> bool {
        self.lock_client().is_connected()
    }

    /// Run `f` with exclusive access to the client.
    pub fn with_client<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.lock_client())
    }

    /// Register a listener fired after a tag's own listeners whenever any
    /// tag on this connection changes value.
    pub fn on_item_changed(&self, listener: impl Fn(&Tag<C>) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Take the connection lock, recovering from a panicked holder.
    pub(crate) fn lock_client(&self) -> MutexGuard<'_, C> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn notify_item_changed(&self, tag: &Tag<C>) {
        let listeners: Vec<ItemChangedListener<C>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if !listeners.is_empty() {
            debug!(tag = %tag.name(), listeners = listeners.len(), "item changed");
        }
        for listener in listeners {
            listener(tag);
        }
    }
}

impl<C: PlcClient> std::fmt::Debug for PlcConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlcConnection")
            .field("address", &self.address)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
