//! In-memory simulated controller
//!
//! [`MemoryPlc`] implements [`PlcClient`] over a set of byte vectors, one per
//! data block. It backs the demo binary and the test suite, and can inject
//! transient failures to exercise retry paths.

use std::collections::HashMap;

use tracing::debug;

use crate::client::PlcClient;
use crate::constants::{Area, WordLen, BITS_PER_BYTE};
use crate::result::{
    ERR_CLI_ADDRESS_OUT_OF_RANGE, ERR_CLI_INVALID_PARAMS, ERR_CLI_ITEM_NOT_AVAILABLE,
    ERR_TCP_NOT_CONNECTED, RESULT_OK,
};

/// Simulated controller with in-memory data blocks.
///
/// # Example
///
/// ```rust
/// use voltage_s7::{sim::MemoryPlc, PlcClient};
///
/// let mut plc = MemoryPlc::new().with_block(10, 8);
/// plc.connect();
/// assert_eq!(plc.write_block(10, 2, 2, &[0x01, 0x02]), 0);
/// assert_eq!(plc.bytes(10, 2, 2), Some(vec![0x01, 0x02]));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryPlc {
    blocks: HashMap<u32, Vec<u8>>,
    connected: bool,
    auto_connect: bool,
    pending_failures: u32,
    failure_code: i32,
    connect_calls: usize,
    read_calls: usize,
    write_calls: usize,
}

impl MemoryPlc {
    /// Create a disconnected controller with no data blocks.
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            connected: false,
            auto_connect: true,
            pending_failures: 0,
            failure_code: RESULT_OK,
            connect_calls: 0,
            read_calls: 0,
            write_calls: 0,
        }
    }

    /// Add a zero-filled data block.
    pub fn with_block(mut self, number: u32, size: usize) -> Self {
        self.blocks.insert(number, vec![0; size]);
        self
    }

    /// Overwrite bytes in a block, creating or growing it as needed.
    pub fn set_bytes(&mut self, block: u32, start: usize, data: &[u8]) {
        let memory = self.blocks.entry(block).or_default();
        let end = start + data.len();
        if memory.len() < end {
            memory.resize(end, 0);
        }
        memory[start..end].copy_from_slice(data);
    }

    /// Copy of `len` bytes at `start`, or `None` outside the block.
    pub fn bytes(&self, block: u32, start: usize, len: usize) -> Option<Vec<u8>> {
        self.blocks
            .get(&block)
            .and_then(|memory| memory.get(start..start.checked_add(len)?))
            .map(<[u8]>::to_vec)
    }

    /// Whether [`connect`](PlcClient::connect) succeeds.
    pub fn set_auto_connect(&mut self, enabled: bool) {
        self.auto_connect = enabled;
    }

    /// Fail the next `count` reads and writes with `code`.
    pub fn fail_next(&mut self, count: u32, code: i32) {
        self.pending_failures = count;
        self.failure_code = code;
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// Check the session and any injected failure.
    fn precheck(&mut self) -> i32 {
        if !self.connected {
            return ERR_TCP_NOT_CONNECTED;
        }
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return self.failure_code;
        }
        RESULT_OK
    }

    fn block_range(
        &mut self,
        block: u32,
        start: u32,
        size: u32,
    ) -> Result<(&mut Vec<u8>, std::ops::Range<usize>), i32> {
        let memory = self.blocks.get_mut(&block).ok_or(ERR_CLI_ITEM_NOT_AVAILABLE)?;
        let start = start as usize;
        let end = start
            .checked_add(size as usize)
            .filter(|end| *end <= memory.len())
            .ok_or(ERR_CLI_ADDRESS_OUT_OF_RANGE)?;
        Ok((memory, start..end))
    }

    fn store(&mut self, block: u32, start: u32, size: u32, buffer: &[u8]) -> i32 {
        self.write_calls += 1;
        let code = self.precheck();
        if code != RESULT_OK {
            return code;
        }
        if buffer.len() < size as usize {
            return ERR_CLI_INVALID_PARAMS;
        }
        match self.block_range(block, start, size) {
            Ok((memory, range)) => {
                let len = range.len();
                memory[range].copy_from_slice(&buffer[..len]);
                debug!(block, start, size, "sim write");
                RESULT_OK
            }
            Err(code) => code,
        }
    }

    /// Bit-sized write: `start` is a bit number, one payload byte per bit,
    /// non-zero sets the bit. Other bits in the touched bytes are kept.
    fn store_bits(&mut self, block: u32, start: u32, amount: u32, buffer: &[u8]) -> i32 {
        self.write_calls += 1;
        let code = self.precheck();
        if code != RESULT_OK {
            return code;
        }
        if amount == 0 || buffer.len() < amount as usize {
            return ERR_CLI_INVALID_PARAMS;
        }
        let Some(last) = start.checked_add(amount - 1) else {
            return ERR_CLI_ADDRESS_OUT_OF_RANGE;
        };
        let first_byte = start / BITS_PER_BYTE;
        let byte_count = last / BITS_PER_BYTE - first_byte + 1;
        match self.block_range(block, first_byte, byte_count) {
            Ok((memory, _)) => {
                for (bit, value) in (start..=last).zip(buffer) {
                    let byte = &mut memory[(bit / BITS_PER_BYTE) as usize];
                    let mask = 1u8 << (bit % BITS_PER_BYTE);
                    if *value != 0 {
                        *byte |= mask;
                    } else {
                        *byte &= !mask;
                    }
                }
                debug!(block, start, amount, "sim bit write");
                RESULT_OK
            }
            Err(code) => code,
        }
    }
}

impl Default for MemoryPlc {
    fn default() -> Self {
        Self::new()
    }
}

impl PlcClient for MemoryPlc {
    fn connect(&mut self) {
        self.connect_calls += 1;
        self.connected = self.auto_connect;
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn read_block(&mut self, block: u32, start: u32, size: u32, buffer: &mut [u8]) -> i32 {
        self.read_calls += 1;
        let code = self.precheck();
        if code != RESULT_OK {
            return code;
        }
        if buffer.len() < size as usize {
            return ERR_CLI_INVALID_PARAMS;
        }
        match self.block_range(block, start, size) {
            Ok((memory, range)) => {
                let len = range.len();
                buffer[..len].copy_from_slice(&memory[range]);
                RESULT_OK
            }
            Err(code) => code,
        }
    }

    fn write_block(&mut self, block: u32, start: u32, size: u32, buffer: &[u8]) -> i32 {
        self.store(block, start, size, buffer)
    }

    fn write_area(
        &mut self,
        area: Area,
        block: u32,
        start: u32,
        amount: u32,
        word_len: WordLen,
        buffer: &[u8],
    ) -> i32 {
        if area != Area::DataBlock {
            self.write_calls += 1;
            return ERR_CLI_ITEM_NOT_AVAILABLE;
        }
        match word_len {
            WordLen::Bit => self.store_bits(block, start, amount, buffer),
            _ => {
                let size = amount.saturating_mul(word_len.element_size() as u32);
                self.store(block, start, size, buffer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ERR_TCP_CONNECTION_FAILED;

    #[test]
    fn test_requires_connection() {
        let mut plc = MemoryPlc::new().with_block(1, 4);
        let mut buf = [0u8; 2];
        assert_eq!(plc.read_block(1, 0, 2, &mut buf), ERR_TCP_NOT_CONNECTED);
        assert_eq!(plc.write_block(1, 0, 2, &buf), ERR_TCP_NOT_CONNECTED);

        plc.connect();
        assert!(plc.is_connected());
        assert_eq!(plc.read_block(1, 0, 2, &mut buf), RESULT_OK);
        assert_eq!(plc.connect_calls(), 1);
        assert_eq!(plc.read_calls(), 2);
        assert_eq!(plc.write_calls(), 1);
    }

    #[test]
    fn test_auto_connect_disabled() {
        let mut plc = MemoryPlc::new();
        plc.set_auto_connect(false);
        plc.connect();
        assert!(!plc.is_connected());
    }

    #[test]
    fn test_block_bounds() {
        let mut plc = MemoryPlc::new().with_block(1, 4);
        plc.connect();
        let mut buf = [0u8; 4];
        assert_eq!(plc.read_block(2, 0, 1, &mut buf), ERR_CLI_ITEM_NOT_AVAILABLE);
        assert_eq!(plc.read_block(1, 2, 4, &mut buf), ERR_CLI_ADDRESS_OUT_OF_RANGE);
        assert_eq!(plc.write_block(1, 4, 1, &buf), ERR_CLI_ADDRESS_OUT_OF_RANGE);
        assert_eq!(plc.read_block(1, u32::MAX, 4, &mut buf), ERR_CLI_ADDRESS_OUT_OF_RANGE);
        assert_eq!(plc.read_block(1, 0, 4, &mut buf[..2]), ERR_CLI_INVALID_PARAMS);
    }

    #[test]
    fn test_fail_next() {
        let mut plc = MemoryPlc::new().with_block(1, 4);
        plc.connect();
        plc.fail_next(2, ERR_TCP_CONNECTION_FAILED);

        let mut buf = [0u8; 1];
        assert_eq!(plc.read_block(1, 0, 1, &mut buf), ERR_TCP_CONNECTION_FAILED);
        assert_eq!(plc.write_block(1, 0, 1, &buf), ERR_TCP_CONNECTION_FAILED);
        assert_eq!(plc.read_block(1, 0, 1, &mut buf), RESULT_OK);
    }

    #[test]
    fn test_write_then_read() {
        let mut plc = MemoryPlc::new().with_block(5, 8);
        plc.connect();
        assert_eq!(plc.write_block(5, 3, 3, &[7, 8, 9]), RESULT_OK);

        let mut buf = [0u8; 3];
        assert_eq!(plc.read_block(5, 3, 3, &mut buf), RESULT_OK);
        assert_eq!(buf, [7, 8, 9]);
        assert_eq!(plc.bytes(5, 3, 3), Some(vec![7, 8, 9]));
        assert_eq!(plc.bytes(5, 7, 3), None);
    }

    #[test]
    fn test_bit_area_write_touches_one_bit() {
        let mut plc = MemoryPlc::new().with_block(1, 4);
        plc.set_bytes(1, 2, &[0x55]);
        plc.connect();

        // Bit 2.3 is bit number 19
        assert_eq!(plc.write_area(Area::DataBlock, 1, 19, 1, WordLen::Bit, &[1]), RESULT_OK);
        assert_eq!(plc.bytes(1, 2, 1), Some(vec![0x5D]));
        assert_eq!(plc.write_area(Area::DataBlock, 1, 16, 1, WordLen::Bit, &[0]), RESULT_OK);
        assert_eq!(plc.bytes(1, 2, 1), Some(vec![0x5C]));

        assert_eq!(
            plc.write_area(Area::DataBlock, 1, 32, 1, WordLen::Bit, &[1]),
            ERR_CLI_ADDRESS_OUT_OF_RANGE
        );
        assert_eq!(
            plc.write_area(Area::DataBlock, 1, 0, 1, WordLen::Bit, &[]),
            ERR_CLI_INVALID_PARAMS
        );
        assert_eq!(
            plc.write_area(Area::DataBlock, 1, 0, 2, WordLen::Byte, &[7, 8]),
            RESULT_OK
        );
        assert_eq!(plc.bytes(1, 0, 2), Some(vec![7, 8]));
        assert_eq!(
            plc.write_area(Area::Merkers, 0, 0, 1, WordLen::Byte, &[1]),
            ERR_CLI_ITEM_NOT_AVAILABLE
        );
    }

    #[test]
    fn test_set_bytes_grows_block() {
        let mut plc = MemoryPlc::new();
        plc.set_bytes(3, 2, &[1, 2]);
        assert_eq!(plc.bytes(3, 0, 4), Some(vec![0, 0, 1, 2]));
    }
}
