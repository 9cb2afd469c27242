//! S7 addressing constants
//!
//! Memory area and transport word-length codes used by S7 communication
//! clients, plus the counted-string layout:
//! - Area and word-length codes are the values placed in an S7 item request
//! - STRING fields carry two header bytes ahead of the character data

use std::fmt;

// ============================================================================
// Counted String Layout
// ============================================================================

/// Header bytes ahead of STRING character data.
///
/// Layout: `[max_len][cur_len][chars...]`
pub const STRING_HEADER_LEN: usize = 2;

/// Offset of the declared maximum length byte.
pub const STRING_MAX_LEN_OFFSET: usize = 0;

/// Offset of the current length byte.
pub const STRING_CUR_LEN_OFFSET: usize = 1;

/// Largest declared length an S7 STRING can carry.
///
/// The header stores it in one byte and 255 is reserved by the controller.
pub const MAX_STRING_LENGTH: u32 = 254;

/// Bits per byte, used for bit-field range checks.
pub const BITS_PER_BYTE: u32 = 8;

// ============================================================================
// DATE_AND_TIME
// ============================================================================

/// Encoded size of a DATE_AND_TIME field.
pub const DATE_AND_TIME_LEN: usize = 8;

/// Two-digit years below this pivot are 20xx, the rest 19xx.
pub const DATE_AND_TIME_YEAR_PIVOT: u8 = 90;

/// First year representable by DATE_AND_TIME.
pub const DATE_AND_TIME_MIN_YEAR: i32 = 1990;

/// Last year representable by DATE_AND_TIME.
pub const DATE_AND_TIME_MAX_YEAR: i32 = 2089;

// ============================================================================
// Memory Areas
// ============================================================================

/// S7 memory area addressed by an item request.
///
/// Only data blocks are addressed by tag strings; the other areas are listed
/// so transport implementations can share the codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Area {
    ProcessInputs = 0x81,
    ProcessOutputs = 0x82,
    Merkers = 0x83,
    DataBlock = 0x84,
    Counters = 0x1C,
    Timers = 0x1D,
}

impl Area {
    /// Wire code of the area.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Area::ProcessInputs => "PE",
            Area::ProcessOutputs => "PA",
            Area::Merkers => "MK",
            Area::DataBlock => "DB",
            Area::Counters => "CT",
            Area::Timers => "TM",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Word Lengths
// ============================================================================

/// Transport size of the elements in an area request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WordLen {
    Bit = 0x01,
    Byte = 0x02,
    Char = 0x03,
    Word = 0x04,
    Int = 0x05,
    DWord = 0x06,
    DInt = 0x07,
    Real = 0x08,
    Counter = 0x1C,
    Timer = 0x1D,
}

impl WordLen {
    /// Wire code of the word length.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Size in bytes of one element of this word length.
    ///
    /// Bits are transferred in a whole byte.
    pub fn element_size(self) -> usize {
        match self {
            WordLen::Bit | WordLen::Byte | WordLen::Char => 1,
            WordLen::Word | WordLen::Int | WordLen::Counter | WordLen::Timer => 2,
            WordLen::DWord | WordLen::DInt | WordLen::Real => 4,
        }
    }
}
