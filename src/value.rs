//! # Tag Value Types
//!
//! Closed value type cached by tags, plus the conversions applied before a
//! value is encoded for a field.

use std::fmt;

use chrono::NaiveDateTime;

use crate::address::LogicalType;
use crate::error::EncodeError;

/// Accepted text layouts for timestamps.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Display layout for timestamps.
const TIMESTAMP_DISPLAY: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Value held by a data-block field.
///
/// # Field Mapping
///
/// | Variant | Logical type | Bytes |
/// |---------|--------------|-------|
/// | Bool | Bit | 1 (single bit) |
/// | Byte | Byte | 1 |
/// | Int16 | ShortInt | 2 |
/// | Int32 | LongInt | 4 |
/// | Timestamp | Timestamp | 8 |
/// | Text | String | max + 2 |
///
/// `None` means the field has not been read yet.
///
/// # Example
///
/// ```rust
/// use voltage_s7::TaggedValue;
///
/// let v = TaggedValue::Int16(-42);
/// assert_eq!(v.as_i64(), -42);
/// assert_eq!(v.to_string(), "-42");
/// assert_eq!(TaggedValue::None.as_text(), "");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TaggedValue {
    /// Not yet read
    #[default]
    None,
    Bool(bool),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl TaggedValue {
    /// Whether the value has been read at least once.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, TaggedValue::None)
    }

    /// Best-effort boolean view. Integers are true when non-zero.
    pub fn as_bool(&self) -> bool {
        match self {
            TaggedValue::Bool(b) => *b,
            TaggedValue::Byte(v) => *v != 0,
            TaggedValue::Int16(v) => *v != 0,
            TaggedValue::Int32(v) => *v != 0,
            TaggedValue::Text(s) => parse_bool(s).unwrap_or(false),
            TaggedValue::None | TaggedValue::Timestamp(_) => false,
        }
    }

    /// Best-effort integer view.
    pub fn as_i64(&self) -> i64 {
        match self {
            TaggedValue::Bool(b) => i64::from(*b),
            TaggedValue::Byte(v) => i64::from(*v),
            TaggedValue::Int16(v) => i64::from(*v),
            TaggedValue::Int32(v) => i64::from(*v),
            TaggedValue::Text(s) => s.trim().parse().unwrap_or(0),
            TaggedValue::None | TaggedValue::Timestamp(_) => 0,
        }
    }

    /// Display form; empty for `None`.
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Best-effort timestamp view. Falls back to `NaiveDateTime::MIN`.
    pub fn as_timestamp(&self) -> NaiveDateTime {
        match self {
            TaggedValue::Timestamp(ts) => *ts,
            TaggedValue::Text(s) => parse_timestamp(s).unwrap_or(NaiveDateTime::MIN),
            _ => NaiveDateTime::MIN,
        }
    }

    /// Returns the type name as a string for logging/debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            TaggedValue::None => "none",
            TaggedValue::Bool(_) => "bool",
            TaggedValue::Byte(_) => "byte",
            TaggedValue::Int16(_) => "int16",
            TaggedValue::Int32(_) => "int32",
            TaggedValue::Timestamp(_) => "timestamp",
            TaggedValue::Text(_) => "text",
        }
    }

    /// Logical type this variant encodes as, if any.
    pub fn logical_type(&self) -> Option<LogicalType> {
        match self {
            TaggedValue::None => None,
            TaggedValue::Bool(_) => Some(LogicalType::Bit),
            TaggedValue::Byte(_) => Some(LogicalType::Byte),
            TaggedValue::Int16(_) => Some(LogicalType::ShortInt),
            TaggedValue::Int32(_) => Some(LogicalType::LongInt),
            TaggedValue::Timestamp(_) => Some(LogicalType::Timestamp),
            TaggedValue::Text(_) => Some(LogicalType::String),
        }
    }

    /// Convert into the variant a field of `target` type holds.
    ///
    /// Integers are range-checked against the target width; text is parsed.
    /// `None` never converts.
    ///
    /// # Example
    ///
    /// ```rust
    /// use voltage_s7::{LogicalType, TaggedValue};
    ///
    /// let v = TaggedValue::from("1200").convert_to(LogicalType::ShortInt).unwrap();
    /// assert_eq!(v, TaggedValue::Int16(1200));
    /// assert!(TaggedValue::Int32(300).convert_to(LogicalType::Byte).is_err());
    /// ```
    pub fn convert_to(&self, target: LogicalType) -> Result<TaggedValue, EncodeError> {
        if self.logical_type() == Some(target) {
            return Ok(self.clone());
        }

        match (self, target) {
            (TaggedValue::None, _) => Err(self.conversion_error(target)),

            (_, LogicalType::String) => Ok(TaggedValue::Text(self.to_string())),

            (TaggedValue::Text(s), LogicalType::Bit) => parse_bool(s)
                .map(TaggedValue::Bool)
                .ok_or_else(|| self.conversion_error(target)),

            (TaggedValue::Text(s), LogicalType::Timestamp) => parse_timestamp(s)
                .map(TaggedValue::Timestamp)
                .ok_or_else(|| self.conversion_error(target)),

            (TaggedValue::Text(s), _) => {
                let n: i64 = s
                    .trim()
                    .parse()
                    .map_err(|_| self.conversion_error(target))?;
                TaggedValue::integer_to(n, target)
            }

            (TaggedValue::Timestamp(_), _) | (_, LogicalType::Timestamp) => {
                Err(self.conversion_error(target))
            }

            // Bool and integer variants
            (_, _) => TaggedValue::integer_to(self.as_i64(), target),
        }
    }

    /// Build the variant for `target` from an integer, range-checked.
    pub fn integer_to(value: i64, target: LogicalType) -> Result<TaggedValue, EncodeError> {
        let out_of_range = || EncodeError::OutOfRange {
            message: format!("{} does not fit in {}", value, target),
        };

        match target {
            LogicalType::Bit => Ok(TaggedValue::Bool(value != 0)),
            LogicalType::Byte => u8::try_from(value)
                .map(TaggedValue::Byte)
                .map_err(|_| out_of_range()),
            LogicalType::ShortInt => i16::try_from(value)
                .map(TaggedValue::Int16)
                .map_err(|_| out_of_range()),
            LogicalType::LongInt => i32::try_from(value)
                .map(TaggedValue::Int32)
                .map_err(|_| out_of_range()),
            LogicalType::String => Ok(TaggedValue::Text(value.to_string())),
            LogicalType::Timestamp => Err(EncodeError::Conversion {
                value: value.to_string(),
                target,
            }),
        }
    }

    fn conversion_error(&self, target: LogicalType) -> EncodeError {
        let value = match self {
            TaggedValue::None => "none".to_string(),
            other => format!("{} '{}'", other.type_name(), other),
        };
        EncodeError::Conversion { value, target }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") || s == "1" {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") || s == "0" {
        Some(false)
    } else {
        None
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

impl fmt::Display for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaggedValue::None => Ok(()),
            TaggedValue::Bool(v) => write!(f, "{}", v),
            TaggedValue::Byte(v) => write!(f, "{}", v),
            TaggedValue::Int16(v) => write!(f, "{}", v),
            TaggedValue::Int32(v) => write!(f, "{}", v),
            TaggedValue::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_DISPLAY)),
            TaggedValue::Text(v) => f.write_str(v),
        }
    }
}

// ============================================================================
// From implementations for ergonomic construction
// ============================================================================

impl From<bool> for TaggedValue {
    fn from(v: bool) -> Self {
        TaggedValue::Bool(v)
    }
}

impl From<u8> for TaggedValue {
    fn from(v: u8) -> Self {
        TaggedValue::Byte(v)
    }
}

impl From<i16> for TaggedValue {
    fn from(v: i16) -> Self {
        TaggedValue::Int16(v)
    }
}

impl From<i32> for TaggedValue {
    fn from(v: i32) -> Self {
        TaggedValue::Int32(v)
    }
}

impl From<NaiveDateTime> for TaggedValue {
    fn from(v: NaiveDateTime) -> Self {
        TaggedValue::Timestamp(v)
    }
}

impl From<String> for TaggedValue {
    fn from(v: String) -> Self {
        TaggedValue::Text(v)
    }
}

impl From<&str> for TaggedValue {
    fn from(v: &str) -> Self {
        TaggedValue::Text(v.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
