//! # Tags
//!
//! A [`Tag`] binds one parsed address to a cached value on a shared
//! [`PlcConnection`].
//!
//! ## Device I/O
//!
//! Reads and writes take the connection lock for the whole retry loop. Each
//! attempt reconnects first when the client reports it is disconnected.
//! After `max_attempts` failures the operation gives up, logs, and leaves the
//! cached value untouched.
//!
//! ## Change Notification
//!
//! A successful read compares the decoded value with the last notified one.
//! On a difference the tag's own listeners run, then the connection's
//! item-changed listeners. Listeners run on the reading thread with the
//! connection lock held: they may inspect tags but must not perform device
//! I/O on the same connection.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use tracing::{debug, error, warn};

use crate::address::{AddressDescriptor, LogicalType};
use crate::client::{PlcClient, PlcConnection};
use crate::codec;
use crate::constants::{Area, WordLen};
use crate::error::{ParseError, PlcError, PlcResult};
use crate::result;
use crate::value::TaggedValue;

/// Listener invoked when a tag's value changes.
pub type ChangeListener<C> = Arc<dyn Fn(&Tag<C>) + Send + Sync>;

#[derive(Debug, Default)]
struct TagState {
    current: TaggedValue,
    previous: TaggedValue,
}

/// Named data-block field with a cached value.
pub struct Tag<C: PlcClient> {
    connection: Arc<PlcConnection<C>>,
    descriptor: AddressDescriptor,
    state: Mutex<TagState>,
    listeners: Mutex<Vec<ChangeListener<C>>>,
}

impl<C: PlcClient> Tag<C> {
    /// Parse `address` and bind the field to `connection`.
    pub fn new(
        connection: Arc<PlcConnection<C>>,
        name: &str,
        address: &str,
    ) -> Result<Self, ParseError> {
        let descriptor = AddressDescriptor::parse(name, address)?;
        Ok(Self::from_descriptor(connection, descriptor))
    }

    pub fn from_descriptor(connection: Arc<PlcConnection<C>>, descriptor: AddressDescriptor) -> Self {
        Self {
            connection,
            descriptor,
            state: Mutex::new(TagState::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Address text as given at construction.
    pub fn address(&self) -> &str {
        &self.descriptor.raw_address
    }

    pub fn descriptor(&self) -> &AddressDescriptor {
        &self.descriptor
    }

    pub fn connection(&self) -> &Arc<PlcConnection<C>> {
        &self.connection
    }

    pub fn is_boolean(&self) -> bool {
        self.descriptor.logical_type == LogicalType::Bit
    }

    pub fn is_string(&self) -> bool {
        self.descriptor.logical_type == LogicalType::String
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.descriptor.logical_type,
            LogicalType::Byte | LogicalType::ShortInt | LogicalType::LongInt
        )
    }

    // ------------------------------------------------------------------------
    // Cached value
    // ------------------------------------------------------------------------

    /// Cached value, `None` until the first successful read or write.
    pub fn value(&self) -> TaggedValue {
        self.lock_state().current.clone()
    }

    pub fn as_bool(&self) -> bool {
        self.lock_state().current.as_bool()
    }

    pub fn as_integer(&self) -> i64 {
        self.lock_state().current.as_i64()
    }

    pub fn as_text(&self) -> String {
        self.lock_state().current.as_text()
    }

    pub fn as_timestamp(&self) -> NaiveDateTime {
        self.lock_state().current.as_timestamp()
    }

    /// Register a listener for value changes seen by reads.
    pub fn on_change(&self, listener: impl Fn(&Tag<C>) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    // ------------------------------------------------------------------------
    // Device I/O
    // ------------------------------------------------------------------------

    /// Read the field and update the cache. Returns `false` after all
    /// attempts failed; the failure is logged.
    pub fn read_from_device(&self) -> bool {
        match self.try_read() {
            Ok(_) => true,
            Err(err) => {
                error!(
                    tag = %self.descriptor.name,
                    address = %self.descriptor.raw_address,
                    error = %err,
                    "read failed"
                );
                false
            }
        }
    }

    /// Read the field, returning the decoded value or the last error.
    pub fn try_read(&self) -> PlcResult<TaggedValue> {
        let desc = &self.descriptor;
        codec::validate_descriptor(desc)?;

        let mut buffer = vec![0u8; desc.len()];
        let mut client = self.connection.lock_client();
        let mut last_error = PlcError::NotConnected;

        for attempt in 1..=self.max_attempts() {
            self.ensure_connected(&mut *client, attempt);

            let code = client.read_block(desc.block_number, desc.byte_offset, desc.byte_length, &mut buffer);
            if !result::is_ok(code) {
                let text = client.result_text(code);
                error!(
                    tag = %desc.name,
                    block = desc.block_number,
                    offset = desc.byte_offset,
                    code,
                    attempt,
                    "read attempt failed: {}",
                    text
                );
                last_error = PlcError::Transport { code, text };
                continue;
            }

            let value = codec::decode_value(desc, &buffer)?;
            debug!(tag = %desc.name, attempt, value = %value, "read ok");
            self.apply_read(value.clone());
            return Ok(value);
        }

        Err(last_error)
    }

    /// Convert, encode and write a value. Returns `false` when the value
    /// cannot be placed in the field or all attempts failed.
    pub fn write_to_device(&self, value: impl Into<TaggedValue>) -> bool {
        match self.try_write(value) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    tag = %self.descriptor.name,
                    address = %self.descriptor.raw_address,
                    error = %err,
                    "write failed"
                );
                false
            }
        }
    }

    /// Write a value, returning the last error on failure.
    ///
    /// Conversion and encoding happen before any device I/O. On success the
    /// cache holds the value as written, i.e. after conversion and string
    /// truncation.
    pub fn try_write(&self, value: impl Into<TaggedValue>) -> PlcResult<()> {
        let desc = &self.descriptor;
        let converted = value.into().convert_to(desc.logical_type)?;
        let buffer = codec::encode_value(desc, &converted)?;
        let written = codec::decode_value(desc, &buffer)?;
        let bit = [u8::from(written.as_bool())];

        let mut client = self.connection.lock_client();
        let mut last_error = PlcError::NotConnected;

        for attempt in 1..=self.max_attempts() {
            self.ensure_connected(&mut *client, attempt);

            let code = match desc.logical_type {
                LogicalType::Bit => client.write_area(
                    Area::DataBlock,
                    desc.block_number,
                    desc.bit_address(),
                    1,
                    WordLen::Bit,
                    &bit,
                ),
                _ => client.write_block(desc.block_number, desc.byte_offset, desc.byte_length, &buffer),
            };
            if !result::is_ok(code) {
                let text = client.result_text(code);
                error!(
                    tag = %desc.name,
                    block = desc.block_number,
                    offset = desc.byte_offset,
                    code,
                    attempt,
                    "write attempt failed: {}",
                    text
                );
                last_error = PlcError::Transport { code, text };
                continue;
            }

            debug!(tag = %desc.name, attempt, value = %written, "write ok");
            self.lock_state().current = written;
            return Ok(());
        }

        Err(last_error)
    }

    pub fn set_bool(&self, value: bool) -> bool {
        self.write_to_device(value)
    }

    /// Write an integer, range-checked against the field type.
    pub fn set_integer(&self, value: i64) -> bool {
        match TaggedValue::integer_to(value, self.descriptor.logical_type) {
            Ok(v) => self.write_to_device(v),
            Err(err) => {
                error!(tag = %self.descriptor.name, error = %err, "write failed");
                false
            }
        }
    }

    pub fn set_text(&self, value: &str) -> bool {
        self.write_to_device(value)
    }

    pub fn set_timestamp(&self, value: NaiveDateTime) -> bool {
        self.write_to_device(value)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn max_attempts(&self) -> u32 {
        self.connection.config().max_attempts.max(1)
    }

    fn ensure_connected(&self, client: &mut C, attempt: u32) {
        if !client.is_connected() {
            warn!(
                tag = %self.descriptor.name,
                address = %self.connection.address(),
                attempt,
                "no PLC connection"
            );
            client.connect();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TagState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_read(&self, value: TaggedValue) {
        let changed = {
            let mut state = self.lock_state();
            state.current = value;
            if state.current != state.previous {
                state.previous = state.current.clone();
                true
            } else {
                false
            }
        };

        if changed {
            debug!(tag = %self.descriptor.name, "value changed");
            self.notify_changed();
        }
    }

    fn notify_changed(&self) {
        let listeners: Vec<ChangeListener<C>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(self);
        }
        self.connection.notify_item_changed(self);
    }
}

impl<C: PlcClient> fmt::Display for Tag<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<C: PlcClient> fmt::Debug for Tag<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tag")
            .field("descriptor", &self.descriptor)
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
