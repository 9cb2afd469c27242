//! # Address Parsing
//!
//! Resolves tag address strings into [`AddressDescriptor`]s.
//!
//! ## Grammar
//!
//! ```text
//! "DB" block "," TYPE offset [ "." suffix ]
//! ```
//!
//! | Token | Logical type | Bytes | Suffix |
//! |-------|--------------|-------|--------|
//! | X | Bit | 1 | bit index (required) |
//! | B | Byte | 1 | - |
//! | INT | ShortInt | 2 | - |
//! | DINT | LongInt | 4 | - |
//! | DT | Timestamp | 8 | - |
//! | STRING | String | max + 2 | max length (required) |
//!
//! The type token is an uppercase letter run directly followed by the byte
//! offset digits. The bit index and string length are not range-checked
//! here; the codec rejects values it cannot represent.

use std::fmt;
use std::str::FromStr;

use crate::constants::{Area, WordLen, BITS_PER_BYTE, STRING_HEADER_LEN};
use crate::error::ParseError;

/// Field kinds addressable in a data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// Single bit (`X`)
    Bit,
    /// Unsigned 8-bit (`B`)
    Byte,
    /// Signed 16-bit (`INT`)
    ShortInt,
    /// Signed 32-bit (`DINT`)
    LongInt,
    /// DATE_AND_TIME (`DT`)
    Timestamp,
    /// Counted string (`STRING`)
    String,
}

impl LogicalType {
    /// Address token for this type.
    pub fn token(self) -> &'static str {
        match self {
            LogicalType::Bit => "X",
            LogicalType::Byte => "B",
            LogicalType::ShortInt => "INT",
            LogicalType::LongInt => "DINT",
            LogicalType::Timestamp => "DT",
            LogicalType::String => "STRING",
        }
    }

    /// Byte length for fixed-size types, `None` for strings.
    pub fn fixed_byte_length(self) -> Option<u32> {
        match self {
            LogicalType::Bit | LogicalType::Byte => Some(1),
            LogicalType::ShortInt => Some(2),
            LogicalType::LongInt => Some(4),
            LogicalType::Timestamp => Some(8),
            LogicalType::String => None,
        }
    }

    /// Transport word length used for area writes.
    pub fn word_len(self) -> WordLen {
        match self {
            LogicalType::Bit => WordLen::Bit,
            LogicalType::Byte => WordLen::Byte,
            LogicalType::ShortInt => WordLen::Int,
            LogicalType::LongInt => WordLen::DInt,
            LogicalType::Timestamp | LogicalType::String => WordLen::Byte,
        }
    }

    /// Whether the address must carry a `.suffix`.
    #[inline]
    pub fn requires_suffix(self) -> bool {
        matches!(self, LogicalType::Bit | LogicalType::String)
    }
}

impl FromStr for LogicalType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(LogicalType::Bit),
            "B" => Ok(LogicalType::Byte),
            "INT" => Ok(LogicalType::ShortInt),
            "DINT" => Ok(LogicalType::LongInt),
            "DT" => Ok(LogicalType::Timestamp),
            "STRING" => Ok(LogicalType::String),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Fully resolved location and shape of a data-block field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressDescriptor {
    /// Display identifier
    pub name: String,
    /// Address text as given
    pub raw_address: String,
    /// Memory area (always data block)
    pub area: Area,
    /// Data block number
    pub block_number: u32,
    /// Offset in bytes within the block
    pub byte_offset: u32,
    /// Bit index, `Bit` fields only
    pub bit_offset: u32,
    /// Bytes transferred for this field
    pub byte_length: u32,
    /// Declared capacity, `String` fields only
    pub max_string_length: u32,
    pub logical_type: LogicalType,
    /// Transport word length for area writes
    pub word_len: WordLen,
}

impl AddressDescriptor {
    /// Parse `address` and attach `name`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use voltage_s7::{AddressDescriptor, LogicalType};
    ///
    /// let desc = AddressDescriptor::parse("door_open", "DB12,X4.4").unwrap();
    /// assert_eq!(desc.block_number, 12);
    /// assert_eq!(desc.byte_offset, 4);
    /// assert_eq!(desc.bit_offset, 4);
    /// assert_eq!(desc.logical_type, LogicalType::Bit);
    /// ```
    pub fn parse(name: &str, address: &str) -> Result<Self, ParseError> {
        parse(name, address)
    }

    /// Byte length as a buffer size.
    #[inline]
    pub fn len(&self) -> usize {
        self.byte_length as usize
    }

    /// Absolute bit number within the block, as used by bit-sized area
    /// writes.
    pub fn bit_address(&self) -> u32 {
        self.byte_offset
            .saturating_mul(BITS_PER_BYTE)
            .saturating_add(self.bit_offset)
    }

    /// Descriptors always address at least one byte.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.byte_length == 0
    }
}

impl FromStr for AddressDescriptor {
    type Err = ParseError;

    /// Parse an address, using the address text as the name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s, s)
    }
}

impl fmt::Display for AddressDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parse an address string into a descriptor.
pub fn parse(name: &str, address: &str) -> Result<AddressDescriptor, ParseError> {
    let mut cursor = Cursor::new(address);

    if !cursor.eat("DB") {
        return Err(ParseError::malformed(address, "expected 'DB' prefix"));
    }
    let block_number = cursor.number(address, "block number")?;

    if !cursor.eat(",") {
        return Err(ParseError::malformed(address, "expected ',' after block number"));
    }

    let token = cursor.uppercase_run();
    if token.is_empty() {
        return Err(ParseError::malformed(address, "expected data type"));
    }
    // Token and offset are adjacent; check the token only once the offset
    // confirms the overall shape.
    let byte_offset = cursor.number(address, "byte offset")?;

    let suffix = if cursor.eat(".") {
        Some(cursor.number(address, "suffix")?)
    } else {
        None
    };

    if !cursor.is_done() {
        return Err(ParseError::malformed(
            address,
            format!("unexpected trailing input '{}'", cursor.rest()),
        ));
    }

    let logical_type: LogicalType = token
        .parse()
        .map_err(|_| ParseError::unsupported(address, token))?;

    let (bit_offset, max_string_length, byte_length) = match logical_type {
        LogicalType::Bit => {
            let bit = suffix
                .ok_or_else(|| ParseError::malformed(address, "bit address requires '.bit'"))?;
            (bit, 0, 1)
        }
        LogicalType::String => {
            let max = suffix.ok_or_else(|| {
                ParseError::malformed(address, "string address requires '.length'")
            })?;
            let byte_length = max.checked_add(STRING_HEADER_LEN as u32).ok_or_else(|| {
                ParseError::malformed(address, "string length out of range")
            })?;
            (0, max, byte_length)
        }
        fixed => {
            // fixed_byte_length is Some for every non-string type
            let byte_length = fixed.fixed_byte_length().unwrap_or(1);
            (0, 0, byte_length)
        }
    };

    Ok(AddressDescriptor {
        name: name.to_string(),
        raw_address: address.to_string(),
        area: Area::DataBlock,
        block_number,
        byte_offset,
        bit_offset,
        byte_length,
        max_string_length,
        logical_type,
        word_len: logical_type.word_len(),
    })
}

/// Byte cursor over an ASCII address.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn is_done(&self) -> bool {
        self.pos == self.input.len()
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && pred(bytes[self.pos]) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn uppercase_run(&mut self) -> &'a str {
        self.take_while(|b| b.is_ascii_uppercase())
    }

    fn number(&mut self, address: &str, what: &str) -> Result<u32, ParseError> {
        let digits = self.take_while(|b| b.is_ascii_digit());
        if digits.is_empty() {
            return Err(ParseError::malformed(address, format!("expected {}", what)));
        }
        digits
            .parse::<u32>()
            .map_err(|_| ParseError::malformed(address, format!("{} out of range", what)))
    }
}

// ============================================================================
// Tests
// ============================================================================
